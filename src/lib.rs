// Library exports for dashgraph

pub mod error;
pub mod data;
pub mod loader;
pub mod filter;
pub mod reshape;
pub mod pivot;
pub mod palette;
pub mod chart;
pub mod parser;
pub mod config;

// Rendering pipeline
pub mod ir;
pub mod scale;
pub mod compiler;
pub mod graph;
pub mod runtime;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    /// The resolved chart as JSON, for a front-end to draw
    #[serde(rename = "json")]
    Json,
    /// The chart's data table
    #[serde(rename = "csv")]
    Csv,
}

impl FromStr for OutputFormat {
    type Err = error::DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(error::DashError::Parse(format!("Unknown output format '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
