use crate::data::{compare_values, format_number, is_missing, parse_number, Dataset};
use crate::error::{DashError, Result};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Name of the derived relative-frequency column.
pub const FREQUENCY_COLUMN: &str = "Frecuencia";

/// Denominator choice meaning "the whole table".
pub const TOTAL: &str = "Total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggMethod {
    Count,
    Nunique,
    Sum,
    Mean,
}

impl AggMethod {
    pub fn label(&self) -> &'static str {
        match self {
            AggMethod::Count => "Cuenta",
            AggMethod::Nunique => "Cuenta de únicos",
            AggMethod::Sum => "Suma",
            AggMethod::Mean => "Promedio",
        }
    }

    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggMethod::Sum | AggMethod::Mean)
    }

    /// Methods offered for a value column, in menu order.
    pub fn options(value_is_numeric: bool) -> Vec<AggMethod> {
        if value_is_numeric {
            vec![AggMethod::Count, AggMethod::Mean, AggMethod::Sum, AggMethod::Nunique]
        } else {
            vec![AggMethod::Count, AggMethod::Nunique]
        }
    }

    fn aggregate(&self, values: &[&str]) -> Option<f64> {
        let present = values.iter().filter(|v| !is_missing(v));
        match self {
            AggMethod::Count => Some(present.count() as f64),
            AggMethod::Nunique => Some(present.collect::<HashSet<_>>().len() as f64),
            AggMethod::Sum => Some(present.filter_map(|v| parse_number(v)).sum()),
            AggMethod::Mean => {
                let nums: Vec<f64> = present.filter_map(|v| parse_number(v)).collect();
                if nums.is_empty() {
                    None
                } else {
                    Some(nums.iter().sum::<f64>() / nums.len() as f64)
                }
            }
        }
    }
}

impl fmt::Display for AggMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AggMethod {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "count" | "cuenta" => Ok(AggMethod::Count),
            "nunique" | "unique" | "cuenta de únicos" | "cuenta_unicos" => Ok(AggMethod::Nunique),
            "sum" | "suma" => Ok(AggMethod::Sum),
            "mean" | "avg" | "promedio" => Ok(AggMethod::Mean),
            other => Err(DashError::Parse(format!("Unknown aggregation method '{}'", other))),
        }
    }
}

/// Grouping dimensions for a bar pivot: facet column, facet row, colour and
/// X, without repeats or unset bindings.
pub fn index_dims(
    facet_col: Option<&str>,
    facet_row: Option<&str>,
    color: Option<&str>,
    x: &str,
) -> Vec<String> {
    let mut dims: Vec<String> = Vec::new();
    for dim in [facet_col, facet_row, color, Some(x)].into_iter().flatten() {
        if !dims.iter().any(|d| d == dim) {
            dims.push(dim.to_string());
        }
    }
    dims
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub keys: Vec<String>,
    pub value: f64,
    pub frequency: Option<f64>,
}

/// One row per observed combination of the index dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub dims: Vec<String>,
    pub value_col: String,
    pub agg: AggMethod,
    pub rows: Vec<PivotRow>,
}

pub fn pivot(dataset: &Dataset, dims: &[String], value_col: &str, agg: AggMethod) -> Result<PivotTable> {
    if dims.iter().any(|d| d == value_col) {
        return Err(DashError::SelectionConflict(format!(
            "Column '{}' cannot be both a grouping dimension and the aggregated value",
            value_col
        )));
    }

    let value_idx = dataset.require_column(value_col)?;
    let dim_idx = dims
        .iter()
        .map(|d| dataset.require_column(d))
        .collect::<Result<Vec<_>>>()?;

    // Missing cells are allowed: a group with no values sums to 0 and has no mean
    let has_text = dataset
        .rows
        .iter()
        .any(|r| !is_missing(&r[value_idx]) && parse_number(&r[value_idx]).is_none());
    if agg.requires_numeric() && has_text {
        return Err(DashError::SelectionConflict(format!(
            "Aggregation '{}' requires a numeric column, '{}' is not numeric",
            agg.label(),
            value_col
        )));
    }

    let mut groups: HashMap<Vec<&str>, Vec<&str>> = HashMap::new();
    for row in &dataset.rows {
        let key: Vec<&str> = dim_idx.iter().map(|&i| row[i].as_str()).collect();
        if key.iter().any(|k| is_missing(k)) {
            continue;
        }
        groups.entry(key).or_default().push(row[value_idx].as_str());
    }

    let mut keys: Vec<Vec<&str>> = groups.keys().cloned().collect();
    keys.sort_by(|a, b| {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rows = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(value) = agg.aggregate(&groups[&key]) {
            rows.push(PivotRow {
                keys: key.iter().map(|k| k.to_string()).collect(),
                value,
                frequency: None,
            });
        }
    }

    debug!(
        "pivot {} by {:?} ({}) -> {} rows",
        value_col,
        dims,
        agg.label(),
        rows.len()
    );

    Ok(PivotTable {
        dims: dims.to_vec(),
        value_col: value_col.to_string(),
        agg,
        rows,
    })
}

/// What the relative frequency of a pivot row is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "columns", rename_all = "lowercase")]
pub enum Denominator {
    Total,
    Columns(Vec<String>),
}

impl Denominator {
    /// Interpret the "relative to" multi-select: `Total` alone, or a
    /// combination of grouping columns.
    pub fn from_selection(selection: &[String]) -> Result<Self> {
        if selection.is_empty() {
            return Err(DashError::SelectionConflict(
                "Select a column to compute the relative frequency against".to_string(),
            ));
        }
        let has_total = selection.iter().any(|s| s == TOTAL);
        if has_total && selection.len() > 1 {
            return Err(DashError::SelectionConflict(
                "Invalid selection: choose either 'Total' alone or a custom combination of columns"
                    .to_string(),
            ));
        }
        if has_total {
            Ok(Denominator::Total)
        } else {
            let mut cols: Vec<String> = Vec::new();
            for s in selection {
                if !cols.contains(s) {
                    cols.push(s.clone());
                }
            }
            Ok(Denominator::Columns(cols))
        }
    }
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dim_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_frequency(&self) -> bool {
        self.rows.iter().any(|r| r.frequency.is_some())
    }

    /// Attach `value / denominator total` to every row. A zero total gives 0.
    pub fn with_relative_frequency(mut self, denominator: &Denominator) -> Result<Self> {
        match denominator {
            Denominator::Total => {
                let total: f64 = self.rows.iter().map(|r| r.value).sum();
                for row in &mut self.rows {
                    row.frequency = Some(ratio(row.value, total));
                }
            }
            Denominator::Columns(cols) => {
                let idx = cols
                    .iter()
                    .map(|c| {
                        self.dim_index(c).ok_or_else(|| {
                            DashError::SelectionConflict(format!(
                                "Relative frequency column '{}' is not one of the grouping columns ({})",
                                c,
                                self.dims.join(", ")
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                let mut totals: BTreeMap<Vec<String>, f64> = BTreeMap::new();
                for row in &self.rows {
                    let key: Vec<String> = idx.iter().map(|&i| row.keys[i].clone()).collect();
                    *totals.entry(key).or_insert(0.0) += row.value;
                }
                for row in &mut self.rows {
                    let key: Vec<String> = idx.iter().map(|&i| row.keys[i].clone()).collect();
                    let total = totals.get(&key).copied().unwrap_or(0.0);
                    row.frequency = Some(ratio(row.value, total));
                }
            }
        }
        Ok(self)
    }

    /// Flatten into a table: dimension columns, the aggregated value column
    /// and the frequency column when present.
    pub fn to_dataset(&self) -> Dataset {
        let with_freq = self.has_frequency();
        let mut headers = self.dims.clone();
        headers.push(self.value_col.clone());
        if with_freq {
            headers.push(FREQUENCY_COLUMN.to_string());
        }
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut out = r.keys.clone();
                out.push(format_number(r.value));
                if with_freq {
                    out.push(r.frequency.map(|f| f.to_string()).unwrap_or_default());
                }
                out
            })
            .collect();
        Dataset::new(headers, rows)
    }
}

fn ratio(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total
    }
}
