// Pipeline parser: commands separated by `|`, folded into a chart request

use super::ast::{Command, FilterArg, Pipeline};
use super::command::parse_command;
use super::lexer::ws;
use crate::chart::{binding, ChartRequest, Orientation};
use crate::error::{DashError, Result};
use crate::filter::ColumnFilter;
use nom::{
    bytes::complete::tag,
    combinator::{eof, opt},
    multi::separated_list1,
    IResult,
};

/// Parse a complete pipeline
/// Format: command | command | ...
pub fn parse_pipeline(input: &str) -> IResult<&str, Pipeline> {
    // A leading "|" is allowed
    let (input, _) = opt(ws(tag("|")))(input)?;
    let (input, commands) = separated_list1(ws(tag("|")), parse_command)(input)?;
    let (input, _) = ws(eof)(input)?;
    Ok((input, Pipeline { commands }))
}

/// Parse pipeline text into a chart request.
pub fn parse_request(input: &str) -> Result<ChartRequest> {
    let (_, pipeline) = parse_pipeline(input)
        .map_err(|e| DashError::Parse(format!("Invalid selection pipeline: {}", e)))?;
    pipeline.into_request()
}

impl Pipeline {
    /// Fold the commands into a request. Exactly one `chart(..)` is required;
    /// later commands override earlier ones except filters, which accumulate
    /// per column.
    pub fn into_request(self) -> Result<ChartRequest> {
        let mut charts = self.commands.iter().filter_map(|c| match c {
            Command::Chart { chart_type, x, y } => Some((chart_type, x, y)),
            _ => None,
        });
        let (chart_type, x, y) = charts
            .next()
            .ok_or_else(|| DashError::Parse("Pipeline requires a chart(type, x, y) command".to_string()))?;
        if charts.next().is_some() {
            return Err(DashError::Parse(
                "Pipeline must contain exactly one chart(..) command".to_string(),
            ));
        }

        let mut request = ChartRequest::new(chart_type.parse()?, x, y);

        for command in self.commands {
            match command {
                Command::Chart { .. } => {}
                Command::Color(c) => request.color = binding(Some(&c)),
                Command::Facet { row, col } => {
                    if row.is_some() {
                        request.facet_row = binding(row.as_deref());
                    }
                    if col.is_some() {
                        request.facet_col = binding(col.as_deref());
                    }
                }
                Command::Filter { column, arg } => {
                    let filter = match arg {
                        FilterArg::Range(lo, hi) => {
                            if lo > hi {
                                return Err(DashError::SelectionConflict(format!(
                                    "Filter range for '{}' is empty ({} > {})",
                                    column, lo, hi
                                )));
                            }
                            ColumnFilter::range(lo, hi)
                        }
                        FilterArg::Values(values) => ColumnFilter::values(values),
                    };
                    request.filters.set(&column, filter);
                }
                Command::Agg(a) => request.aggregation = a.parse()?,
                Command::BarMode(m) => request.bar_mode = m.parse()?,
                Command::Horizontal => request.orientation = Orientation::Horizontal,
                Command::Relative(cols) => request.relative = Some(cols),
                Command::Palette(p) => request.palette = p,
                Command::Order(values) => request.category_order = Some(values),
            }
        }

        Ok(request)
    }
}
