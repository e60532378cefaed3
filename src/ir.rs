use crate::graph::{BarStyle, LineStyle, PointStyle, LabelStyle};

// =============================================================================
// Scaling
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub domain: (f64, f64),
    pub is_categorical: bool,
    pub categories: Vec<String>, // If categorical, maps index -> label
    /// Tick labels are fractions shown as whole percentages
    pub percent: bool,
}

// =============================================================================
// Compilation (Scene Graph)
// =============================================================================

/// A grid of panels made of primitive drawing commands.
/// The backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub nrow: usize,
    pub ncol: usize,
    pub panels: Vec<PanelScene>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    pub x_scale: Scale, // For drawing axes
    pub y_scale: Scale,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        style: PointStyle,
    },
    DrawRect {
        // Opposite corners
        tl: (f64, f64),
        br: (f64, f64),
        style: BarStyle,
    },
    DrawText {
        pos: (f64, f64),
        text: String,
        style: LabelStyle,
    },
}

impl DrawCommand {
    /// Every data-space coordinate the command touches
    pub fn coords(&self) -> Vec<(f64, f64)> {
        match self {
            DrawCommand::DrawLine { points, .. } | DrawCommand::DrawPoint { points, .. } => points.clone(),
            DrawCommand::DrawRect { tl, br, .. } => vec![*tl, *br],
            DrawCommand::DrawText { pos, .. } => vec![*pos],
        }
    }
}
