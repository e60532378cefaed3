//! Chart configuration: maps the current selection onto a renderable
//! chart description.

use crate::data::{is_missing, Dataset};
use crate::error::{DashError, Result};
use crate::filter::{apply_filters, FilterSelection};
use crate::palette::{self, DEFAULT_PALETTE};
use crate::pivot::{index_dims, pivot, AggMethod, Denominator, FREQUENCY_COLUMN};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Selector value meaning "no binding".
pub const NONE_SENTINEL: &str = "Ninguna";

pub const PERCENT_TEXT_TEMPLATE: &str = "%{text:.2%}";
pub const PERCENT_TICK_FORMAT: &str = ",.0%";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Scatter,
    Box,
    Line,
    Histogram,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Scatter,
        ChartType::Box,
        ChartType::Line,
        ChartType::Histogram,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Bar => "Barras",
            ChartType::Scatter => "Dispersión",
            ChartType::Box => "Cajas",
            ChartType::Line => "Línea",
            ChartType::Histogram => "Histograma",
        }
    }

    pub fn requires_numeric_y(&self) -> bool {
        matches!(self, ChartType::Scatter | ChartType::Line | ChartType::Box)
    }

    /// Chart types whose X categories can be reordered.
    pub fn supports_category_order(&self) -> bool {
        matches!(self, ChartType::Bar | ChartType::Box | ChartType::Histogram)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartType {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bar" | "barras" => Ok(ChartType::Bar),
            "scatter" | "dispersión" | "dispersion" => Ok(ChartType::Scatter),
            "box" | "boxplot" | "cajas" => Ok(ChartType::Box),
            "line" | "línea" | "linea" => Ok(ChartType::Line),
            "histogram" | "histograma" => Ok(ChartType::Histogram),
            other => Err(DashError::Parse(format!("Unknown chart type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    #[default]
    Group,
    Stack,
    Overlay,
    Relative,
}

impl BarMode {
    pub fn label(&self) -> &'static str {
        match self {
            BarMode::Group => "grupo",
            BarMode::Stack => "apilado",
            BarMode::Overlay => "superpuesto",
            BarMode::Relative => "relativo",
        }
    }

    /// Modes offered for a chart type; histograms cannot be stacked.
    pub fn options(chart_type: ChartType) -> Vec<BarMode> {
        match chart_type {
            ChartType::Bar => vec![BarMode::Group, BarMode::Stack, BarMode::Overlay, BarMode::Relative],
            ChartType::Histogram => vec![BarMode::Group, BarMode::Overlay, BarMode::Relative],
            _ => Vec::new(),
        }
    }
}

impl FromStr for BarMode {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "group" | "grupo" => Ok(BarMode::Group),
            "stack" | "apilado" => Ok(BarMode::Stack),
            "overlay" | "superpuesto" => Ok(BarMode::Overlay),
            "relative" | "relativo" => Ok(BarMode::Relative),
            other => Err(DashError::Parse(format!("Unknown bar mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageExportOptions {
    pub format: String,
    pub filename: String,
    pub scale: u32,
}

impl Default for ImageExportOptions {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            filename: "grafica".to_string(),
            scale: 3,
        }
    }
}

/// Options handed to the chart widget alongside the figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub editable: bool,
    #[serde(rename = "toImageButtonOptions")]
    pub to_image_button_options: ImageExportOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            editable: true,
            to_image_button_options: ImageExportOptions::default(),
        }
    }
}

/// Normalize an optional binding: empty, `none` and the sentinel all mean unset.
pub fn binding(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() || v == NONE_SENTINEL || v.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(v.to_string())
    }
}

/// Choices for a colour or facet selector: the sentinel plus every column
/// except the Y column.
pub fn binding_options(dataset: &Dataset, y: &str) -> Vec<String> {
    std::iter::once(NONE_SENTINEL.to_string())
        .chain(dataset.headers.iter().filter(|h| *h != y).cloned())
        .collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Everything the user picked for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    pub chart_type: ChartType,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub facet_row: Option<String>,
    pub facet_col: Option<String>,
    pub filters: FilterSelection,
    pub aggregation: AggMethod,
    pub bar_mode: BarMode,
    pub orientation: Orientation,
    /// Relative-frequency denominator selection, when enabled.
    pub relative: Option<Vec<String>>,
    pub palette: String,
    pub category_order: Option<Vec<String>>,
}

impl ChartRequest {
    pub fn new(chart_type: ChartType, x: &str, y: &str) -> Self {
        Self {
            chart_type,
            x: x.to_string(),
            y: y.to_string(),
            color: None,
            facet_row: None,
            facet_col: None,
            filters: FilterSelection::new(),
            aggregation: AggMethod::Count,
            bar_mode: BarMode::Group,
            orientation: Orientation::Vertical,
            relative: None,
            palette: DEFAULT_PALETTE.to_string(),
            category_order: None,
        }
    }

    fn bindings(&self) -> [(&'static str, Option<&String>); 3] {
        [
            ("color", self.color.as_ref()),
            ("facet row", self.facet_row.as_ref()),
            ("facet column", self.facet_col.as_ref()),
        ]
    }
}

/// A fully resolved chart, ready for a renderer or a front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    /// Field bound to the horizontal axis.
    pub x: String,
    /// Field bound to the vertical axis; `None` for a histogram's counts.
    pub y: Option<String>,
    pub category_field: String,
    pub value_field: Option<String>,
    pub color: Option<String>,
    pub facet_row: Option<String>,
    pub facet_col: Option<String>,
    pub orientation: Orientation,
    pub bar_mode: Option<BarMode>,
    pub palette: String,
    pub colors: Vec<String>,
    pub category_orders: BTreeMap<String, Vec<String>>,
    pub text: Option<String>,
    pub text_template: Option<String>,
    pub value_tickformat: Option<String>,
    pub data: Dataset,
    pub config: ExportConfig,
}

impl ChartSpec {
    pub fn is_relative(&self) -> bool {
        self.text.is_some()
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    /// Order of the X categories when one was resolved.
    pub fn category_order(&self) -> Option<&[String]> {
        self.category_orders.get(&self.category_field).map(|v| v.as_slice())
    }

    /// The table preview: complete rows only, capped at `n`.
    pub fn preview(&self, n: usize) -> Dataset {
        self.data.preview(n)
    }
}

/// Resolve a request against a dataset. Invalid selections are reported as
/// `SelectionConflict`, unknown columns as `Schema` and an empty result as
/// `EmptyResult`; nothing is rendered in those cases.
pub fn build_chart(dataset: &Dataset, request: &ChartRequest) -> Result<ChartSpec> {
    let x = &request.x;
    let y = &request.y;

    if x == y {
        return Err(DashError::SelectionConflict(
            "The X and Y axes cannot use the same column. Select different columns.".to_string(),
        ));
    }

    dataset.require_column(x)?;
    dataset.require_column(y)?;
    for (role, col) in request.bindings() {
        let Some(col) = col else { continue };
        dataset.require_column(col)?;
        if col == y {
            return Err(DashError::SelectionConflict(format!(
                "The {} binding cannot use the Y column '{}'",
                role, y
            )));
        }
    }

    request.filters.validate(dataset)?;

    if request.chart_type.requires_numeric_y() && !dataset.is_numeric(y) {
        return Err(DashError::SelectionConflict(format!(
            "The Y variable '{}' must be numeric for a {} chart",
            y,
            request.chart_type.label()
        )));
    }

    if request.chart_type == ChartType::Histogram
        && !BarMode::options(ChartType::Histogram).contains(&request.bar_mode)
    {
        return Err(DashError::SelectionConflict(format!(
            "Bar mode '{}' is not available for histograms",
            request.bar_mode.label()
        )));
    }

    if request.chart_type == ChartType::Bar
        && request.aggregation.requires_numeric()
        && !dataset.is_numeric(y)
    {
        return Err(DashError::SelectionConflict(format!(
            "Aggregation '{}' requires a numeric column, '{}' is not numeric",
            request.aggregation.label(),
            y
        )));
    }

    let palette = palette::palette(&request.palette)?;
    let filtered = apply_filters(dataset, &request.filters);
    if filtered.is_empty() {
        return Err(empty_result());
    }

    let mut value_field = Some(y.clone());
    let mut relative = false;
    let data = if request.chart_type == ChartType::Bar {
        let dims = index_dims(
            request.facet_col.as_deref(),
            request.facet_row.as_deref(),
            request.color.as_deref(),
            x,
        );
        let mut table = pivot(&filtered, &dims, y, request.aggregation)?;
        if let Some(selection) = &request.relative {
            let denominator = Denominator::from_selection(selection)?;
            table = table.with_relative_frequency(&denominator)?;
            value_field = Some(FREQUENCY_COLUMN.to_string());
            relative = true;
        }
        table.to_dataset()
    } else {
        if request.relative.is_some() {
            debug!("relative frequency only applies to bar charts, ignored");
        }
        if request.chart_type == ChartType::Histogram {
            value_field = None;
        }
        let mut used = vec![x.clone()];
        if let Some(v) = &value_field {
            used.push(v.clone());
        }
        for (_, col) in request.bindings() {
            if let Some(col) = col {
                used.push(col.clone());
            }
        }
        project(&filtered, &used)?
    };

    if data.is_empty() {
        return Err(empty_result());
    }

    let orientation = if request.chart_type == ChartType::Bar {
        request.orientation
    } else {
        Orientation::Vertical
    };
    let (x_axis, y_axis) = match orientation {
        Orientation::Vertical => (x.clone(), value_field.clone()),
        Orientation::Horizontal => (value_field.clone().unwrap_or_else(|| y.clone()), Some(x.clone())),
    };

    let mut category_orders = BTreeMap::new();
    if request.chart_type.supports_category_order() {
        let order = resolve_category_order(dataset, x, request.category_order.as_deref());
        category_orders.insert(x.clone(), order);
    }

    let bar_mode = matches!(request.chart_type, ChartType::Bar | ChartType::Histogram)
        .then_some(request.bar_mode);

    let spec = ChartSpec {
        chart_type: request.chart_type,
        title: format!("{}: {} vs {}", request.chart_type.label(), x, y),
        x: x_axis,
        y: y_axis,
        category_field: x.clone(),
        value_field,
        color: request.color.clone(),
        facet_row: request.facet_row.clone(),
        facet_col: request.facet_col.clone(),
        orientation,
        bar_mode,
        palette: palette.name.to_string(),
        colors: palette.colors.iter().map(|c| c.to_string()).collect(),
        category_orders,
        text: relative.then(|| FREQUENCY_COLUMN.to_string()),
        text_template: relative.then(|| PERCENT_TEXT_TEMPLATE.to_string()),
        value_tickformat: relative.then(|| PERCENT_TICK_FORMAT.to_string()),
        data,
        config: ExportConfig::default(),
    };

    debug!("built chart '{}' with {} rows", spec.title, spec.data.len());
    Ok(spec)
}

/// X category order: the user's order first, then the remaining distinct
/// values of the unfiltered column in order of appearance.
pub fn resolve_category_order(dataset: &Dataset, column: &str, user: Option<&[String]>) -> Vec<String> {
    let natural = dataset.distinct_values(column);
    let mut order: Vec<String> = Vec::with_capacity(natural.len());
    for v in user.unwrap_or_default() {
        if !is_missing(v) && !order.contains(v) {
            order.push(v.clone());
        }
    }
    for v in natural {
        if !order.contains(&v) {
            order.push(v);
        }
    }
    order
}

fn empty_result() -> DashError {
    DashError::EmptyResult(
        "No data available after applying the filters. Adjust the filters.".to_string(),
    )
}

fn project(dataset: &Dataset, columns: &[String]) -> Result<Dataset> {
    let mut headers: Vec<String> = Vec::new();
    for c in columns {
        if !headers.contains(c) {
            headers.push(c.clone());
        }
    }
    let idx = headers
        .iter()
        .map(|c| dataset.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    let rows = dataset
        .rows
        .iter()
        .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
        .collect();
    Ok(Dataset::new(headers, rows))
}
