// AST for the selection pipeline

/// Filter argument as written: `lo..hi` or `[v, ...]`
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    Range(f64, f64),
    Values(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// chart(type: bar, x: col, y: col)
    Chart {
        chart_type: String,
        x: String,
        y: String,
    },
    Color(String),
    Facet {
        row: Option<String>,
        col: Option<String>,
    },
    Filter {
        column: String,
        arg: FilterArg,
    },
    Agg(String),
    BarMode(String),
    Horizontal,
    Relative(Vec<String>),
    Palette(String),
    Order(Vec<String>),
}

/// Commands in the order they were written
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}
