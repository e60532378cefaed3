use crate::ir::{DrawCommand, Scale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Categories sit at integer positions 0..n-1 with half a slot of margin.
pub fn categorical_scale(categories: Vec<String>) -> Scale {
    let n = categories.len().max(1) as f64;
    Scale {
        domain: (-0.5, n - 0.5),
        is_categorical: true,
        categories,
        percent: false,
    }
}

/// Padded min/max of the values; `(0, 1)` when there are none.
pub fn continuous_scale<I>(values: I, percent: bool) -> Scale
where
    I: IntoIterator<Item = f64>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            if v < min { min = v; }
            if v > max { max = v; }
        }
    }

    let domain = if min == f64::INFINITY {
        (0.0, 1.0)
    } else {
        pad_range(min, max)
    };

    Scale {
        domain,
        is_categorical: false,
        categories: Vec::new(),
        percent,
    }
}

/// Continuous scale shared by every panel, covering all their commands on `axis`.
pub fn shared_scale<'a, I>(panels: I, axis: Axis, percent: bool) -> Scale
where
    I: IntoIterator<Item = &'a Vec<DrawCommand>>,
{
    let values = panels.into_iter().flat_map(|commands| {
        commands.iter().flat_map(move |c| {
            c.coords()
                .into_iter()
                .map(move |(x, y)| if axis == Axis::X { x } else { y })
        })
    });
    continuous_scale(values.collect::<Vec<_>>(), percent)
}

pub fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}
