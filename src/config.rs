//! JSON configuration: cache lifetime, preview size, render and export
//! options, and the dashboard pages.

use crate::chart::ExportConfig;
use crate::error::{DashError, Result};
use crate::reshape::TextNormalization;
use crate::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache_ttl_secs: u64,
    pub preview_rows: usize,
    pub render: RenderOptions,
    pub export: ExportConfig,
    pub pages: Vec<PageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            preview_rows: 1000,
            render: RenderOptions::default(),
            export: ExportConfig::default(),
            pages: Vec::new(),
        }
    }
}

/// One dashboard page: a published CSV, how it is prepared and the charts
/// drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub name: String,
    pub url: String,
    /// Auxiliary sheet joined onto every row before anything else
    #[serde(default)]
    pub lookup: Option<LookupConfig>,
    #[serde(default)]
    pub melt: Option<MeltConfig>,
    #[serde(default)]
    pub normalize: Vec<NormalizeConfig>,
    /// Keep the first row of each combination of these columns
    #[serde(default)]
    pub dedupe_on: Vec<String>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupConfig {
    pub url: String,
    pub left_on: Vec<String>,
    pub right_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeltConfig {
    pub id_vars: Vec<String>,
    pub value_vars: Vec<String>,
    #[serde(default = "default_var_name")]
    pub var_name: String,
    #[serde(default = "default_value_name")]
    pub value_name: String,
}

fn default_var_name() -> String { "Pregunta".to_string() }
fn default_value_name() -> String { "Respuesta".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub column: String,
    pub mode: TextNormalization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub title: String,
    /// Selection pipeline, e.g. `chart(type: bar, x: Grado, y: Valor) | agg(sum)`
    pub pipeline: String,
    /// Columns this section needs; a missing one fails only this section
    #[serde(default)]
    pub required_columns: Vec<String>,
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DashError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DashError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn page(&self, name: &str) -> Result<&PageConfig> {
        self.pages.iter().find(|p| p.name == name).ok_or_else(|| {
            let names: Vec<&str> = self.pages.iter().map(|p| p.name.as_str()).collect();
            DashError::Config(format!(
                "Unknown page '{}'. Configured pages: {}",
                name,
                names.join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.preview_rows, 1000);
        assert!(config.export.editable);
        assert_eq!(config.export.to_image_button_options.filename, "grafica");
    }

    #[test]
    fn test_partial_render_options() {
        let config = Config::from_json_str(r#"{"render": {"width": 1024, "type": "svg"}}"#).unwrap();
        assert_eq!(config.render.width, 1024);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.format, OutputFormat::Svg);
    }

    #[test]
    fn test_pages_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "cache_ttl_secs": 60,
                "pages": [{{
                    "name": "estudiantes",
                    "url": "https://example.org/export.csv",
                    "lookup": {{"url": "https://example.org/aux.csv", "left_on": ["Curso"], "right_on": ["Curso"]}},
                    "melt": {{"id_vars": ["Curso"], "value_vars": ["P1", "P2"]}},
                    "normalize": [{{"column": "Curso", "mode": "trim_title"}}],
                    "sections": [{{
                        "title": "Por curso",
                        "pipeline": "chart(type: bar, x: Curso, y: Respuesta)",
                        "required_columns": ["Curso"]
                    }}]
                }}]
            }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        let page = config.page("estudiantes").unwrap();
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].required_columns, vec!["Curso".to_string()]);
        assert_eq!(page.lookup.as_ref().unwrap().right_on, vec!["Curso".to_string()]);
        let melt = page.melt.as_ref().unwrap();
        assert_eq!((melt.var_name.as_str(), melt.value_name.as_str()), ("Pregunta", "Respuesta"));
        assert_eq!(page.normalize[0].mode, TextNormalization::TrimTitle);
        assert!(page.dedupe_on.is_empty());
    }

    #[test]
    fn test_unknown_page() {
        let err = Config::default().page("nope").unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Config::from_json_str("{"), Err(DashError::Config(_))));
        assert!(matches!(
            Config::from_file("/definitely/not/here.json"),
            Err(DashError::Config(_))
        ));
    }
}
