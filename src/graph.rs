use crate::ir::{DrawCommand, LegendEntry, PanelScene, Scale, SceneGraph};
use crate::palette::parse_color;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

const LEGEND_WIDTH: i32 = 150;

/// Style configuration for line primitives
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: u32,
    pub alpha: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self { color: "#636EFA".to_string(), width: 2, alpha: 1.0 }
    }
}

/// Style configuration for point primitives
#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    pub color: String,
    pub size: u32,
    pub alpha: f64,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self { color: "#636EFA".to_string(), size: 3, alpha: 1.0 }
    }
}

/// Style configuration for bars and boxes
#[derive(Debug, Clone, PartialEq)]
pub struct BarStyle {
    pub color: String,
    pub alpha: f64,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self { color: "#636EFA".to_string(), alpha: 1.0 }
    }
}

/// Style configuration for value labels
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub color: String,
    pub size: i32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self { color: "#444444".to_string(), size: 11 }
    }
}

fn rgba(color: &str, alpha: f64) -> RGBAColor {
    parse_color(color).unwrap_or(BLUE).mix(alpha)
}

/// Tick label for a position on a scale
pub fn format_tick(scale: &Scale, value: f64) -> String {
    if scale.is_categorical {
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        return scale.categories.get(idx as usize).cloned().unwrap_or_default();
    }
    if scale.percent {
        return format!("{:.0}%", value * 100.0);
    }
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// RGB bytes for a bitmap, computed in `usize` so large sizes do not wrap
fn pixel_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Render the scene to PNG bytes
pub fn render_png(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; pixel_buffer_len(scene.width, scene.height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
            .into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

/// Render the scene to an SVG document
pub fn render_svg(scene: &SceneGraph) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let legend_width = if scene.legend.is_empty() { 0 } else { LEGEND_WIDTH };
    let (plot_area, legend_area) = root.split_horizontally(scene.width as i32 - legend_width);

    let plot_area = plot_area
        .titled(&scene.title, ("sans-serif", 22))
        .context("Failed to draw title")?;

    let ncol = scene.ncol.max(1);
    let cells = plot_area.split_evenly((scene.nrow.max(1), ncol));
    for panel in &scene.panels {
        if let Some(cell) = cells.get(panel.row * ncol + panel.col) {
            draw_panel(cell, panel, scene)?;
        }
    }

    draw_legend(&legend_area, &scene.legend)
}

fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, panel: &PanelScene, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_range = panel.x_scale.domain.0..panel.x_scale.domain.1;
    let y_range = panel.y_scale.domain.0..panel.y_scale.domain.1;

    let mut builder = ChartBuilder::on(area);
    builder.margin(8).x_label_area_size(35).y_label_area_size(55);
    if let Some(title) = &panel.title {
        builder.caption(title, ("sans-serif", 14));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    let x_fmt = |v: &f64| format_tick(&panel.x_scale, *v);
    let y_fmt = |v: &f64| format_tick(&panel.y_scale, *v);

    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_desc(scene.x_label.as_str())
        .y_desc(scene.y_label.as_str());
    if panel.x_scale.is_categorical {
        mesh.x_labels(panel.x_scale.categories.len() * 2 + 1).disable_x_mesh();
    }
    if panel.y_scale.is_categorical {
        mesh.y_labels(panel.y_scale.categories.len() * 2 + 1).disable_y_mesh();
    }
    mesh.draw().context("Failed to draw mesh")?;

    for command in &panel.commands {
        match command {
            DrawCommand::DrawLine { points, style } => {
                chart
                    .draw_series(LineSeries::new(
                        points.clone(),
                        rgba(&style.color, style.alpha).stroke_width(style.width),
                    ))
                    .context("Failed to draw line series")?;
            }
            DrawCommand::DrawPoint { points, style } => {
                let color = rgba(&style.color, style.alpha);
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&p| Circle::new(p, style.size as i32, color.filled())),
                    )
                    .context("Failed to draw point series")?;
            }
            DrawCommand::DrawRect { tl, br, style } => {
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [*tl, *br],
                        rgba(&style.color, style.alpha).filled(),
                    )))
                    .context("Failed to draw bar")?;
            }
            DrawCommand::DrawText { pos, text, style } => {
                let color = parse_color(&style.color).unwrap_or(BLACK);
                chart
                    .draw_series(std::iter::once(Text::new(
                        text.clone(),
                        *pos,
                        ("sans-serif", style.size).into_font().color(&color),
                    )))
                    .context("Failed to draw label")?;
            }
        }
    }

    Ok(())
}

fn draw_legend<DB>(area: &DrawingArea<DB, Shift>, legend: &[LegendEntry]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    for (i, entry) in legend.iter().enumerate() {
        let y = 40 + i as i32 * 20;
        let color = parse_color(&entry.color).unwrap_or(BLUE);
        area.draw(&Rectangle::new([(10, y), (24, y + 12)], color.filled()))
            .context("Failed to draw legend")?;
        area.draw(&Text::new(
            entry.label.clone(),
            (30, y),
            ("sans-serif", 13).into_font(),
        ))
        .context("Failed to draw legend")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{categorical_scale, continuous_scale};

    #[test]
    fn test_format_tick_categorical() {
        let scale = categorical_scale(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(format_tick(&scale, 1.0), "B");
        assert_eq!(format_tick(&scale, 0.5), "");
        assert_eq!(format_tick(&scale, 2.0), "");
        assert_eq!(format_tick(&scale, -1.0), "");
    }

    #[test]
    fn test_format_tick_percent() {
        let scale = continuous_scale(vec![0.0, 1.0], true);
        assert_eq!(format_tick(&scale, 0.5), "50%");
    }

    #[test]
    fn test_pixel_buffer_len_large_canvas() {
        assert_eq!(pixel_buffer_len(800, 600), 1_440_000);
        // 40000 x 40000 x 3 does not fit in a u32
        assert_eq!(pixel_buffer_len(40_000, 40_000), 4_800_000_000);
    }

    #[test]
    fn test_format_tick_numbers() {
        let scale = continuous_scale(vec![0.0, 1.0], false);
        assert_eq!(format_tick(&scale, 20.0), "20");
        assert_eq!(format_tick(&scale, 0.25), "0.25");
    }
}
