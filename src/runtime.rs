// Runtime executor for charts, dashboard sections and pages

use crate::chart::{build_chart, ChartRequest, ChartSpec, ExportConfig};
use crate::compiler::compile_chart;
use crate::config::{PageConfig, SectionConfig};
use crate::data::Dataset;
use crate::error::{DashError, Severity};
use crate::graph;
use crate::loader::{DataLoader, Fetcher};
use crate::parser::parse_request;
use crate::reshape::{drop_duplicates, melt, merge_left, normalize_column, require_columns};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

/// Render a resolved chart in the requested output format
pub fn render_chart(spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Png => {
            let scene = compile_chart(spec, options)?;
            graph::render_png(&scene)
        }
        OutputFormat::Svg => {
            let scene = compile_chart(spec, options)?;
            Ok(graph::render_svg(&scene)?.into_bytes())
        }
        OutputFormat::Json => {
            serde_json::to_vec_pretty(spec).context("Failed to serialize chart")
        }
        OutputFormat::Csv => Ok(spec
            .data
            .to_csv_string()
            .context("Failed to export chart data")?
            .into_bytes()),
    }
}

/// What a single dashboard section ends up showing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SectionOutcome {
    Chart { spec: Box<ChartSpec> },
    Warning { message: String },
    Error { message: String },
}

impl SectionOutcome {
    fn from_error(error: &DashError) -> Self {
        let message = error.to_string();
        match error.severity() {
            Severity::Warning => SectionOutcome::Warning { message },
            Severity::Error => SectionOutcome::Error { message },
        }
    }

    pub fn is_chart(&self) -> bool {
        matches!(self, SectionOutcome::Chart { .. })
    }
}

/// Build one chart; failures become a warning or an error message for this
/// section only.
pub fn run_section(dataset: &Dataset, request: &ChartRequest) -> SectionOutcome {
    match build_chart(dataset, request) {
        Ok(spec) => SectionOutcome::Chart { spec: Box::new(spec) },
        Err(e) => {
            warn!("section not rendered: {}", e);
            SectionOutcome::from_error(&e)
        }
    }
}

/// Parse a selection pipeline and run it as a section.
pub fn run_pipeline(dataset: &Dataset, pipeline: &str) -> SectionOutcome {
    match parse_request(pipeline) {
        Ok(request) => run_section(dataset, &request),
        Err(e) => {
            warn!("{}", e);
            SectionOutcome::from_error(&e)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub title: String,
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub page: String,
    pub rows: usize,
    pub load_error: Option<String>,
    pub prepare_error: Option<String>,
    pub sections: Vec<SectionReport>,
}

/// Clean up the raw sheet the way the page declares: normalize text columns,
/// drop duplicates, join the lookup sheet, then melt.
fn prepare_page<F: Fetcher>(
    loader: &mut DataLoader<F>,
    page: &PageConfig,
    raw: Dataset,
) -> std::result::Result<Dataset, DashError> {
    let mut data = raw;
    for step in &page.normalize {
        normalize_column(&mut data, &step.column, step.mode)?;
    }
    if !page.dedupe_on.is_empty() {
        data = drop_duplicates(&data, &page.dedupe_on)?;
    }
    if let Some(lookup) = &page.lookup {
        let right = loader.load(&lookup.url)?;
        data = merge_left(&data, &right, &lookup.left_on, &lookup.right_on)?;
    }
    if let Some(m) = &page.melt {
        data = melt(&data, &m.id_vars, &m.value_vars, &m.var_name, &m.value_name)?;
    }
    Ok(data)
}

fn run_configured_section(
    dataset: &Dataset,
    section: &SectionConfig,
    export: &ExportConfig,
) -> SectionOutcome {
    let required: Vec<&str> = section.required_columns.iter().map(|c| c.as_str()).collect();
    if let Err(e) = require_columns(dataset, &required) {
        warn!("section '{}': {}", section.title, e);
        return SectionOutcome::from_error(&e);
    }

    let mut outcome = run_pipeline(dataset, &section.pipeline);
    if let SectionOutcome::Chart { spec } = &mut outcome {
        spec.config = export.clone();
    }
    outcome
}

/// Load and prepare a page's dataset, then run each of its sections
/// independently. When loading or preparation fails the sections still run,
/// against an empty table, and report their own outcome.
pub fn run_page<F: Fetcher>(
    loader: &mut DataLoader<F>,
    page: &PageConfig,
    export: &ExportConfig,
) -> PageReport {
    let outcome = loader.load_or_empty(&page.url);
    let load_error = outcome.error.as_ref().map(|e| e.to_string());

    let mut prepare_error = None;
    let dataset = if load_error.is_some() {
        outcome.dataset
    } else {
        match prepare_page(loader, page, outcome.dataset) {
            Ok(data) => data,
            Err(e) => {
                warn!("page '{}': {}", page.name, e);
                prepare_error = Some(e.to_string());
                Dataset::empty()
            }
        }
    };

    let sections: Vec<SectionReport> = page
        .sections
        .iter()
        .map(|section| SectionReport {
            title: section.title.clone(),
            outcome: run_configured_section(&dataset, section, export),
        })
        .collect();

    info!(
        "page '{}': {} of {} sections charted",
        page.name,
        sections.iter().filter(|s| s.outcome.is_chart()).count(),
        sections.len()
    );

    PageReport {
        page: page.name.clone(),
        rows: dataset.len(),
        load_error,
        prepare_error,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartType;
    use crate::config::{LookupConfig, MeltConfig, NormalizeConfig};
    use crate::data::make_dataset;
    use crate::error;
    use crate::reshape::TextNormalization;
    use std::collections::HashMap;
    use std::time::Duration;

    struct MapFetcher(HashMap<String, String>);

    impl Fetcher for MapFetcher {
        fn fetch(&self, url: &str) -> error::Result<String> {
            self.0.get(url).cloned().ok_or_else(|| DashError::DataLoad {
                url: url.to_string(),
                reason: "not found".to_string(),
            })
        }
    }

    const CSV: &str = "Departamento,Valor,Sexo\nA,10,F\nB,20,M\nA,30,M\n";
    const SURVEY: &str = "Curso,P1,P2\n 1a ,si,no\n1A,si,si\n 1a ,si,no\n";
    const CURSOS: &str = "Curso,Nivel\n1A,Básica\n";

    fn loader() -> DataLoader<MapFetcher> {
        let mut sources = HashMap::new();
        sources.insert("mem://docentes".to_string(), CSV.to_string());
        sources.insert("mem://estudiantes".to_string(), SURVEY.to_string());
        sources.insert("mem://cursos".to_string(), CURSOS.to_string());
        DataLoader::new(MapFetcher(sources), Duration::from_secs(600))
    }

    fn section(title: &str, pipeline: &str, required: &[&str]) -> SectionConfig {
        SectionConfig {
            title: title.to_string(),
            pipeline: pipeline.to_string(),
            required_columns: required.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn page(url: &str, sections: Vec<SectionConfig>) -> PageConfig {
        PageConfig {
            name: "docentes".to_string(),
            url: url.to_string(),
            lookup: None,
            melt: None,
            normalize: Vec::new(),
            dedupe_on: Vec::new(),
            sections,
        }
    }

    fn survey_page() -> PageConfig {
        let mut page = page(
            "mem://estudiantes",
            vec![section(
                "Respuestas",
                "chart(type: bar, x: Pregunta, y: Respuesta) | color(Nivel)",
                &["Pregunta", "Nivel"],
            )],
        );
        page.normalize = vec![NormalizeConfig {
            column: "Curso".to_string(),
            mode: TextNormalization::TrimTitle,
        }];
        page.dedupe_on = vec!["Curso".to_string(), "P1".to_string(), "P2".to_string()];
        page.lookup = Some(LookupConfig {
            url: "mem://cursos".to_string(),
            left_on: vec!["Curso".to_string()],
            right_on: vec!["Curso".to_string()],
        });
        page.melt = Some(MeltConfig {
            id_vars: vec!["Curso".to_string(), "Nivel".to_string()],
            value_vars: vec!["P1".to_string(), "P2".to_string()],
            var_name: "Pregunta".to_string(),
            value_name: "Respuesta".to_string(),
        });
        page
    }

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    fn sample_spec() -> ChartSpec {
        let data = make_dataset(
            vec!["Departamento", "Valor"],
            vec![vec!["A", "10"], vec!["B", "20"]],
        );
        build_chart(&data, &ChartRequest::new(ChartType::Bar, "Departamento", "Valor")).unwrap()
    }

    #[test]
    fn test_render_chart_png() {
        let bytes = render_chart(&sample_spec(), &RenderOptions::default()).unwrap();
        assert!(is_valid_png(&bytes));
    }

    #[test]
    fn test_render_chart_svg() {
        let options = RenderOptions { format: OutputFormat::Svg, ..RenderOptions::default() };
        let bytes = render_chart(&sample_spec(), &options).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
    }

    #[test]
    fn test_render_chart_json() {
        let options = RenderOptions { format: OutputFormat::Json, ..RenderOptions::default() };
        let bytes = render_chart(&sample_spec(), &options).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["title"], "Barras: Departamento vs Valor");
        assert_eq!(value["config"]["toImageButtonOptions"]["scale"], 3);
    }

    #[test]
    fn test_render_chart_csv() {
        let options = RenderOptions { format: OutputFormat::Csv, ..RenderOptions::default() };
        let text = String::from_utf8(render_chart(&sample_spec(), &options).unwrap()).unwrap();
        assert!(text.starts_with("Departamento,Valor"));
    }

    #[test]
    fn test_run_section_severity() {
        let data = make_dataset(vec!["X", "Y"], vec![vec!["a", "1"]]);
        let same = ChartRequest::new(ChartType::Bar, "X", "X");
        assert!(matches!(run_section(&data, &same), SectionOutcome::Warning { .. }));

        let unknown = ChartRequest::new(ChartType::Bar, "X", "Missing");
        assert!(matches!(run_section(&data, &unknown), SectionOutcome::Error { .. }));
    }

    #[test]
    fn test_run_pipeline_parse_error() {
        let data = make_dataset(vec!["X", "Y"], vec![vec!["a", "1"]]);
        assert!(matches!(run_pipeline(&data, "chart(x: X"), SectionOutcome::Error { .. }));
    }

    #[test]
    fn test_run_page_isolates_sections() {
        let page = page(
            "mem://docentes",
            vec![
                section("ok", "chart(type: bar, x: Departamento, y: Valor) | agg(sum)", &[]),
                section("broken", "chart(type: bar, x: Departamento, y: Nope)", &[]),
                section("also ok", "chart(type: box, x: Sexo, y: Valor)", &[]),
            ],
        );
        let report = run_page(&mut loader(), &page, &ExportConfig::default());
        assert_eq!(report.rows, 3);
        assert_eq!(report.sections.len(), 3);
        assert!(report.sections[0].outcome.is_chart());
        assert!(!report.sections[1].outcome.is_chart());
        assert!(report.sections[2].outcome.is_chart());
    }

    #[test]
    fn test_run_page_load_failure_still_reports_every_section() {
        let page = page(
            "mem://missing",
            vec![
                section("first", "chart(type: bar, x: Departamento, y: Valor)", &[]),
                section("second", "chart(type: box, x: Sexo, y: Valor)", &["Sexo"]),
            ],
        );
        let report = run_page(&mut loader(), &page, &ExportConfig::default());
        assert_eq!(report.rows, 0);
        assert!(report.load_error.is_some());
        assert_eq!(report.sections.len(), 2);
        for s in &report.sections {
            assert!(matches!(s.outcome, SectionOutcome::Error { .. }), "{:?}", s.outcome);
        }
    }

    #[test]
    fn test_missing_required_column_fails_only_its_section() {
        let page = page(
            "mem://docentes",
            vec![
                section("por grado", "chart(type: bar, x: Grado, y: Valor)", &["Grado"]),
                section(
                    "por departamento",
                    "chart(type: bar, x: Departamento, y: Valor)",
                    &["Departamento"],
                ),
            ],
        );
        let report = run_page(&mut loader(), &page, &ExportConfig::default());
        assert_eq!(report.sections.len(), 2);
        match &report.sections[0].outcome {
            SectionOutcome::Error { message } => assert!(message.contains("Grado")),
            other => panic!("expected a schema error, got {:?}", other),
        }
        assert!(report.sections[1].outcome.is_chart());
    }

    #[test]
    fn test_empty_relative_selection_is_warning() {
        let page = page(
            "mem://docentes",
            vec![section(
                "relativo",
                "chart(type: bar, x: Departamento, y: Valor) | relative()",
                &[],
            )],
        );
        let report = run_page(&mut loader(), &page, &ExportConfig::default());
        assert!(matches!(report.sections[0].outcome, SectionOutcome::Warning { .. }));
    }

    #[test]
    fn test_page_charts_carry_export_config() {
        let mut export = ExportConfig::default();
        export.to_image_button_options.filename = "informe".to_string();
        export.to_image_button_options.scale = 2;
        let page = page(
            "mem://docentes",
            vec![section("ok", "chart(type: bar, x: Departamento, y: Valor)", &[])],
        );
        let report = run_page(&mut loader(), &page, &export);
        let value = serde_json::to_value(&report).unwrap();
        let options = &value["sections"][0]["spec"]["config"]["toImageButtonOptions"];
        assert_eq!(options["filename"], "informe");
        assert_eq!(options["scale"], 2);
    }

    #[test]
    fn test_page_preparation() {
        let report = run_page(&mut loader(), &survey_page(), &ExportConfig::default());
        assert_eq!(report.prepare_error, None);
        // Two distinct courses rows after cleanup, two questions each
        assert_eq!(report.rows, 4);
        match &report.sections[0].outcome {
            SectionOutcome::Chart { spec } => {
                assert_eq!(spec.data.distinct_values("Nivel"), vec!["Básica".to_string()]);
                assert_eq!(
                    spec.data.distinct_values("Pregunta"),
                    vec!["P1".to_string(), "P2".to_string()]
                );
            }
            other => panic!("expected a chart, got {:?}", other),
        }
    }

    #[test]
    fn test_page_preparation_failure_keeps_sections() {
        let mut page = survey_page();
        page.lookup = Some(LookupConfig {
            url: "mem://missing".to_string(),
            left_on: vec!["Curso".to_string()],
            right_on: vec!["Curso".to_string()],
        });
        let report = run_page(&mut loader(), &page, &ExportConfig::default());
        assert!(report.prepare_error.is_some());
        assert_eq!(report.rows, 0);
        assert_eq!(report.sections.len(), 1);
        assert!(!report.sections[0].outcome.is_chart());
    }

    #[test]
    fn test_section_report_json() {
        let report = SectionReport {
            title: "t".to_string(),
            outcome: SectionOutcome::Warning { message: "m".to_string() },
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "warning");
        assert_eq!(value["message"], "m");
    }
}
