use crate::chart::{format_percent, BarMode, ChartSpec, ChartType};
use crate::data::{compare_values, is_missing, parse_number, Dataset};
use crate::graph::{BarStyle, LabelStyle, LineStyle, PointStyle};
use crate::ir::{DrawCommand, LegendEntry, PanelScene, Scale, SceneGraph};
use crate::scale::{categorical_scale, shared_scale, Axis};
use crate::RenderOptions;
use anyhow::{Context, Result};
use std::collections::HashMap;

const BAR_WIDTH: f64 = 0.8;
const BOX_WIDTH: f64 = 0.5;
const FALLBACK_COLOR: &str = "#636EFA";

// =============================================================================
// Statistics
// =============================================================================

fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BoxStats {
    lower: f64,
    q1: f64,
    median: f64,
    q3: f64,
    upper: f64,
    outliers: Vec<f64>,
}

/// Quartiles with whiskers at the furthest points inside 1.5 IQR
fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut ys = values.to_vec();
    ys.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let lower = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);
    let outliers = ys
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxStats { lower, q1, median, q3, upper, outliers })
}

/// Sturges' rule
fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        ((n as f64).log2().ceil() as usize) + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bins {
    min: f64,
    width: f64,
    count: usize,
}

impl Bins {
    fn new(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let count = sturges_bins(values.len());
        let range = max - min;
        let width = if range <= 0.0 || !range.is_finite() { 1.0 } else { range / count as f64 };
        Self { min: if min.is_finite() { min } else { 0.0 }, width, count }
    }

    fn index(&self, v: f64) -> usize {
        let idx = ((v - self.min) / self.width).floor();
        (idx.max(0.0) as usize).min(self.count - 1)
    }

    fn center(&self, idx: usize) -> f64 {
        self.min + (idx as f64 + 0.5) * self.width
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Rows of one facet cell
struct Panel {
    row: usize,
    col: usize,
    title: Option<String>,
    rows: Vec<usize>,
}

fn facet_levels(data: &Dataset, facet: Option<(&str, usize)>) -> Vec<Option<String>> {
    match facet {
        Some((name, _)) => data.distinct_values(name).into_iter().map(Some).collect(),
        None => vec![None],
    }
}

fn in_level(row: &[String], facet: Option<(&str, usize)>, level: Option<&String>) -> bool {
    match (facet, level) {
        (Some((_, idx)), Some(v)) => &row[idx] == v,
        _ => true,
    }
}

fn partition_panels(
    data: &Dataset,
    facet_row: Option<(&str, usize)>,
    facet_col: Option<(&str, usize)>,
) -> (usize, usize, Vec<Panel>) {
    let row_levels = facet_levels(data, facet_row);
    let col_levels = facet_levels(data, facet_col);

    let mut panels = Vec::new();
    for (r, rv) in row_levels.iter().enumerate() {
        for (c, cv) in col_levels.iter().enumerate() {
            let rows = data
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| {
                    in_level(row, facet_row, rv.as_ref()) && in_level(row, facet_col, cv.as_ref())
                })
                .map(|(i, _)| i)
                .collect();

            let mut parts = Vec::new();
            if let (Some((name, _)), Some(v)) = (facet_col, cv) {
                parts.push(format!("{} = {}", name, v));
            }
            if let (Some((name, _)), Some(v)) = (facet_row, rv) {
                parts.push(format!("{} = {}", name, v));
            }
            let title = (!parts.is_empty()).then(|| parts.join(" | "));

            panels.push(Panel { row: r, col: c, title, rows });
        }
    }

    (row_levels.len(), col_levels.len(), panels)
}

/// Categories on the X axis: the resolved order first, then anything else
/// present in the data.
fn ordered_categories(spec: &ChartSpec) -> Vec<String> {
    let present = spec.data.distinct_values(&spec.category_field);
    let mut out: Vec<String> = spec
        .category_order()
        .unwrap_or_default()
        .iter()
        .filter(|c| present.contains(c))
        .cloned()
        .collect();
    for v in present {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn column(data: &Dataset, name: &str) -> Result<usize> {
    data.column_index(name)
        .with_context(|| format!("Column '{}' missing from chart data", name))
}

// =============================================================================
// Bars
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct BarDatum {
    pos: f64,
    series: usize,
    value: f64,
}

fn pos_key(pos: f64) -> i64 {
    (pos * 1000.0).round() as i64
}

/// Sum duplicates so each (position, series) has one bar
fn merge_bars(bars: Vec<BarDatum>) -> Vec<BarDatum> {
    let mut merged: Vec<BarDatum> = Vec::new();
    for bar in bars {
        match merged
            .iter_mut()
            .find(|b| pos_key(b.pos) == pos_key(bar.pos) && b.series == bar.series)
        {
            Some(existing) => existing.value += bar.value,
            None => merged.push(bar),
        }
    }
    merged.sort_by(|a, b| a.pos.total_cmp(&b.pos).then(a.series.cmp(&b.series)));
    merged
}

fn emit_bars(
    bars: &[BarDatum],
    width: f64,
    mode: BarMode,
    colors: &[String],
    percent_labels: bool,
) -> Vec<DrawCommand> {
    let mut commands = Vec::new();

    // Smart dodging: only the series present at a position share it
    let mut occupancy: HashMap<i64, Vec<usize>> = HashMap::new();
    for bar in bars {
        occupancy.entry(pos_key(bar.pos)).or_default().push(bar.series);
    }
    for series in occupancy.values_mut() {
        series.sort();
        series.dedup();
    }

    let mut stack_pos: HashMap<i64, f64> = HashMap::new();
    let mut stack_neg: HashMap<i64, f64> = HashMap::new();

    for bar in bars {
        let key = pos_key(bar.pos);
        let (center, slot) = match mode {
            BarMode::Group => {
                let occupants = occupancy.get(&key).map(|o| o.as_slice()).unwrap_or(&[]);
                let n = occupants.len().max(1);
                let rank = occupants.iter().position(|&s| s == bar.series).unwrap_or(0);
                let slot = width / n as f64;
                (bar.pos + (rank as f64 - (n as f64 - 1.0) / 2.0) * slot, slot)
            }
            _ => (bar.pos, width),
        };

        let (bottom, top) = match mode {
            BarMode::Group | BarMode::Overlay => (0.0, bar.value),
            BarMode::Stack => {
                let base = stack_pos.entry(key).or_insert(0.0);
                let range = (*base, *base + bar.value);
                *base += bar.value;
                range
            }
            BarMode::Relative => {
                if bar.value >= 0.0 {
                    let base = stack_pos.entry(key).or_insert(0.0);
                    let range = (*base, *base + bar.value);
                    *base += bar.value;
                    range
                } else {
                    let base = stack_neg.entry(key).or_insert(0.0);
                    let range = (*base + bar.value, *base);
                    *base += bar.value;
                    range
                }
            }
        };

        let color = series_color(colors, bar.series);
        let alpha = if mode == BarMode::Overlay { 0.5 } else { 1.0 };
        commands.push(DrawCommand::DrawRect {
            tl: (center - slot / 2.0, top),
            br: (center + slot / 2.0, bottom),
            style: BarStyle { color, alpha },
        });

        if percent_labels {
            let end = if bar.value < 0.0 { bottom } else { top };
            commands.push(DrawCommand::DrawText {
                pos: (center, end),
                text: format_percent(bar.value),
                style: LabelStyle::default(),
            });
        }
    }

    commands
}

// =============================================================================
// Boxes
// =============================================================================

/// Primitive shapes of one vertical box
fn box_commands(x: f64, width: f64, stats: &BoxStats, color: &str) -> Vec<DrawCommand> {
    let half_width = width / 2.0;
    let cap_half = width * 0.2;
    let whisker = LineStyle { color: color.to_string(), width: 2, alpha: 1.0 };

    let mut commands = vec![
        DrawCommand::DrawLine {
            points: vec![(x, stats.lower), (x, stats.q1)],
            style: whisker.clone(),
        },
        DrawCommand::DrawLine {
            points: vec![(x, stats.q3), (x, stats.upper)],
            style: whisker.clone(),
        },
        DrawCommand::DrawLine {
            points: vec![(x - cap_half, stats.lower), (x + cap_half, stats.lower)],
            style: whisker.clone(),
        },
        DrawCommand::DrawLine {
            points: vec![(x - cap_half, stats.upper), (x + cap_half, stats.upper)],
            style: whisker,
        },
        DrawCommand::DrawRect {
            tl: (x - half_width, stats.q3),
            br: (x + half_width, stats.q1),
            style: BarStyle { color: color.to_string(), alpha: 0.6 },
        },
        // White median for contrast
        DrawCommand::DrawLine {
            points: vec![(x - half_width, stats.median), (x + half_width, stats.median)],
            style: LineStyle { color: "white".to_string(), width: 2, alpha: 0.9 },
        },
    ];

    if !stats.outliers.is_empty() {
        commands.push(DrawCommand::DrawPoint {
            points: stats.outliers.iter().map(|&v| (x, v)).collect(),
            style: PointStyle { color: color.to_string(), size: 3, alpha: 1.0 },
        });
    }

    commands
}

// =============================================================================
// Compilation
// =============================================================================

fn series_color(colors: &[String], series: usize) -> String {
    if colors.is_empty() {
        FALLBACK_COLOR.to_string()
    } else {
        colors[series % colors.len()].clone()
    }
}

fn flip(command: DrawCommand) -> DrawCommand {
    let swap = |(x, y): (f64, f64)| (y, x);
    match command {
        DrawCommand::DrawLine { points, style } => DrawCommand::DrawLine {
            points: points.into_iter().map(swap).collect(),
            style,
        },
        DrawCommand::DrawPoint { points, style } => DrawCommand::DrawPoint {
            points: points.into_iter().map(swap).collect(),
            style,
        },
        DrawCommand::DrawRect { tl, br, style } => DrawCommand::DrawRect {
            tl: swap(tl),
            br: swap(br),
            style,
        },
        DrawCommand::DrawText { pos, text, style } => DrawCommand::DrawText {
            pos: swap(pos),
            text,
            style,
        },
    }
}

/// How the category field maps onto the X axis
enum XAxis {
    Categorical(Vec<String>),
    Continuous,
}

impl XAxis {
    fn position(&self, value: &str) -> Option<f64> {
        match self {
            XAxis::Categorical(categories) => {
                categories.iter().position(|c| c == value).map(|i| i as f64)
            }
            XAxis::Continuous => parse_number(value),
        }
    }
}

/// Compile a resolved chart into a scene graph of drawing commands
pub fn compile_chart(spec: &ChartSpec, options: &RenderOptions) -> Result<SceneGraph> {
    let data = &spec.data;
    let cat_idx = column(data, &spec.category_field)?;
    let value_idx = match &spec.value_field {
        Some(v) => Some(column(data, v)?),
        None => None,
    };
    let color_idx = match &spec.color {
        Some(c) => Some(column(data, c)?),
        None => None,
    };
    let facet_row = match &spec.facet_row {
        Some(f) => Some((f.as_str(), column(data, f)?)),
        None => None,
    };
    let facet_col = match &spec.facet_col {
        Some(f) => Some((f.as_str(), column(data, f)?)),
        None => None,
    };

    let series_keys: Vec<String> = match &spec.color {
        Some(c) => data.distinct_values(c),
        None => vec![String::new()],
    };
    let series_of = |row: &[String]| -> Option<usize> {
        match color_idx {
            Some(idx) => series_keys.iter().position(|k| k == &row[idx]),
            None => Some(0),
        }
    };
    let value_of = |row: &[String]| -> Option<f64> { value_idx.and_then(|i| parse_number(&row[i])) };

    let (nrow, ncol, panels) = partition_panels(data, facet_row, facet_col);

    let numeric_x = data.is_numeric(&spec.category_field);
    let x_axis = match spec.chart_type {
        ChartType::Bar | ChartType::Box => XAxis::Categorical(ordered_categories(spec)),
        ChartType::Histogram if !numeric_x => XAxis::Categorical(ordered_categories(spec)),
        ChartType::Scatter | ChartType::Line if !numeric_x => {
            let mut cats = data.distinct_values(&spec.category_field);
            if spec.chart_type == ChartType::Line {
                cats.sort_by(|a, b| compare_values(a, b));
            }
            XAxis::Categorical(cats)
        }
        _ => XAxis::Continuous,
    };

    let bins = if spec.chart_type == ChartType::Histogram && numeric_x {
        Some(Bins::new(&data.numeric_values(&spec.category_field)))
    } else {
        None
    };

    let bar_mode = spec.bar_mode.unwrap_or_default();
    let mut panel_commands: Vec<Vec<DrawCommand>> = Vec::with_capacity(panels.len());

    for panel in &panels {
        let rows = panel.rows.iter().map(|&i| data.rows[i].as_slice());

        let commands = match spec.chart_type {
            ChartType::Bar => {
                let bars = rows
                    .filter_map(|row| {
                        Some(BarDatum {
                            pos: x_axis.position(&row[cat_idx])?,
                            series: series_of(row)?,
                            value: value_of(row)?,
                        })
                    })
                    .collect();
                emit_bars(&merge_bars(bars), BAR_WIDTH, bar_mode, &spec.colors, spec.is_relative())
            }
            ChartType::Histogram => {
                let mut bars = Vec::new();
                for row in rows {
                    let cell = &row[cat_idx];
                    if is_missing(cell) {
                        continue;
                    }
                    let Some(series) = series_of(row) else { continue };
                    let pos = match &bins {
                        Some(b) => match parse_number(cell) {
                            Some(v) => b.center(b.index(v)),
                            None => continue,
                        },
                        None => match x_axis.position(cell) {
                            Some(p) => p,
                            None => continue,
                        },
                    };
                    bars.push(BarDatum { pos, series, value: 1.0 });
                }
                let width = bins.map(|b| b.width).unwrap_or(BAR_WIDTH);
                emit_bars(&merge_bars(bars), width, bar_mode, &spec.colors, false)
            }
            ChartType::Box => {
                let mut groups: HashMap<(i64, usize), (f64, Vec<f64>)> = HashMap::new();
                for row in rows {
                    let (Some(pos), Some(series), Some(v)) =
                        (x_axis.position(&row[cat_idx]), series_of(row), value_of(row))
                    else {
                        continue;
                    };
                    groups.entry((pos_key(pos), series)).or_insert((pos, Vec::new())).1.push(v);
                }

                let mut occupancy: HashMap<i64, Vec<usize>> = HashMap::new();
                for &(key, series) in groups.keys() {
                    occupancy.entry(key).or_default().push(series);
                }
                for series in occupancy.values_mut() {
                    series.sort();
                }

                let mut keys: Vec<(i64, usize)> = groups.keys().copied().collect();
                keys.sort();
                let mut commands = Vec::new();
                for key in keys {
                    let (pos, values) = &groups[&key];
                    let Some(stats) = box_stats(values) else { continue };
                    let occupants = occupancy.get(&key.0).map(|o| o.as_slice()).unwrap_or(&[]);
                    let n = occupants.len().max(1);
                    let rank = occupants.iter().position(|&s| s == key.1).unwrap_or(0);
                    let slot = BOX_WIDTH / n as f64;
                    let x = pos + (rank as f64 - (n as f64 - 1.0) / 2.0) * slot;
                    commands.extend(box_commands(x, slot * 0.9, &stats, &series_color(&spec.colors, key.1)));
                }
                commands
            }
            ChartType::Scatter | ChartType::Line => {
                let mut series_points: Vec<Vec<(f64, f64)>> = vec![Vec::new(); series_keys.len()];
                let mut commands = Vec::new();
                for row in rows {
                    if let (Some(x), Some(s), Some(y)) =
                        (x_axis.position(&row[cat_idx]), series_of(row), value_of(row))
                    {
                        series_points[s].push((x, y));
                    }
                }
                for (s, mut points) in series_points.into_iter().enumerate() {
                    if points.is_empty() {
                        continue;
                    }
                    let color = series_color(&spec.colors, s);
                    if spec.chart_type == ChartType::Line {
                        points.sort_by(|a, b| a.0.total_cmp(&b.0));
                        commands.push(DrawCommand::DrawLine {
                            points,
                            style: LineStyle { color, width: 2, alpha: 1.0 },
                        });
                    } else {
                        commands.push(DrawCommand::DrawPoint {
                            points,
                            style: PointStyle { color, size: 4, alpha: 0.8 },
                        });
                    }
                }
                commands
            }
        };

        panel_commands.push(commands);
    }

    // Shared axes across panels
    let category_scale = match &x_axis {
        XAxis::Categorical(categories) => categorical_scale(categories.clone()),
        XAxis::Continuous => shared_scale(&panel_commands, Axis::X, false),
    };
    let value_scale = shared_scale(&panel_commands, Axis::Y, spec.is_relative());

    let flipped = spec.is_horizontal();
    let (x_scale, y_scale): (Scale, Scale) = if flipped {
        (value_scale, category_scale)
    } else {
        (category_scale, value_scale)
    };

    let scenes = panels
        .into_iter()
        .zip(panel_commands)
        .map(|(panel, commands)| PanelScene {
            row: panel.row,
            col: panel.col,
            title: panel.title,
            x_scale: x_scale.clone(),
            y_scale: y_scale.clone(),
            commands: if flipped { commands.into_iter().map(flip).collect() } else { commands },
        })
        .collect();

    let legend = if spec.color.is_some() {
        series_keys
            .iter()
            .enumerate()
            .map(|(i, k)| LegendEntry { label: k.clone(), color: series_color(&spec.colors, i) })
            .collect()
    } else {
        Vec::new()
    };

    Ok(SceneGraph {
        width: options.width,
        height: options.height,
        title: spec.title.clone(),
        x_label: spec.x.clone(),
        y_label: spec.y.clone().unwrap_or_else(|| "count".to_string()),
        nrow,
        ncol,
        panels: scenes,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{build_chart, ChartRequest, Orientation};
    use crate::data::make_dataset;
    use crate::pivot::AggMethod;

    fn survey() -> Dataset {
        make_dataset(
            vec!["Departamento", "Valor", "Sexo", "Grado"],
            vec![
                vec!["A", "10", "F", "5"],
                vec!["B", "20", "M", "5"],
                vec!["A", "30", "M", "6"],
                vec!["B", "5", "F", "6"],
            ],
        )
    }

    fn bar_request(mode: BarMode) -> ChartRequest {
        let mut req = ChartRequest::new(ChartType::Bar, "Departamento", "Valor");
        req.aggregation = AggMethod::Sum;
        req.color = Some("Sexo".to_string());
        req.bar_mode = mode;
        req
    }

    fn rects(scene: &SceneGraph) -> Vec<((f64, f64), (f64, f64))> {
        scene.panels[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawRect { tl, br, .. } => Some((*tl, *br)),
                _ => None,
            })
            .collect()
    }

    fn compile(req: &ChartRequest) -> SceneGraph {
        let spec = build_chart(&survey(), req).unwrap();
        compile_chart(&spec, &RenderOptions::default()).unwrap()
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert_eq!(percentile(&[7.0], 0.25), 7.0);
    }

    #[test]
    fn test_box_stats_outliers() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper, 4.0);
        assert_eq!(stats.lower, 1.0);
    }

    #[test]
    fn test_sturges() {
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(100), 8);
    }

    #[test]
    fn test_group_bars_dodge() {
        let scene = compile(&bar_request(BarMode::Group));
        let r = rects(&scene);
        assert_eq!(r.len(), 4);
        // Two series share each category, each half the bar width
        let width = r[0].1 .0 - r[0].0 .0;
        assert!((width - BAR_WIDTH / 2.0).abs() < 1e-9);
        assert_eq!(scene.legend.len(), 2);
    }

    #[test]
    fn test_stacked_bars_accumulate() {
        let scene = compile(&bar_request(BarMode::Stack));
        let tops: Vec<f64> = rects(&scene).iter().map(|(tl, _)| tl.1).collect();
        // A: F=10 then M=30 stacked to 40
        assert!(tops.contains(&40.0));
        assert!(tops.contains(&25.0));
    }

    #[test]
    fn test_horizontal_flips_scales() {
        let mut req = bar_request(BarMode::Group);
        req.orientation = Orientation::Horizontal;
        let scene = compile(&req);
        assert!(scene.panels[0].y_scale.is_categorical);
        assert!(!scene.panels[0].x_scale.is_categorical);
        assert_eq!(scene.x_label, "Valor");
    }

    #[test]
    fn test_relative_labels_and_percent_axis() {
        let mut req = bar_request(BarMode::Group);
        req.relative = Some(vec!["Total".to_string()]);
        let scene = compile(&req);
        assert!(scene.panels[0].y_scale.percent);
        let labels = scene.panels[0]
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawText { .. }))
            .count();
        assert_eq!(labels, 4);
    }

    #[test]
    fn test_facet_grid() {
        let mut req = bar_request(BarMode::Group);
        req.facet_col = Some("Grado".to_string());
        let scene = compile(&req);
        assert_eq!((scene.nrow, scene.ncol), (1, 2));
        assert_eq!(scene.panels[1].title.as_deref(), Some("Grado = 6"));
        assert_eq!(scene.panels[0].y_scale, scene.panels[1].y_scale);
    }

    #[test]
    fn test_histogram_numeric_bins() {
        let req = ChartRequest::new(ChartType::Histogram, "Valor", "Sexo");
        let scene = compile(&req);
        let total: f64 = rects(&scene).iter().map(|(tl, br)| tl.1 - br.1).sum();
        assert_eq!(total, 4.0);
        assert!(!scene.panels[0].x_scale.is_categorical);
        assert_eq!(scene.y_label, "count");
    }

    #[test]
    fn test_box_emits_one_box_per_category() {
        let req = ChartRequest::new(ChartType::Box, "Departamento", "Valor");
        let scene = compile(&req);
        assert_eq!(rects(&scene).len(), 2);
    }

    #[test]
    fn test_line_sorted_by_x() {
        let req = ChartRequest::new(ChartType::Line, "Grado", "Valor");
        let scene = compile(&req);
        match &scene.panels[0].commands[0] {
            DrawCommand::DrawLine { points, .. } => {
                assert!(points.windows(2).all(|w| w[0].0 <= w[1].0));
            }
            other => panic!("expected a line, got {:?}", other),
        }
    }
}
