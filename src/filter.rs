use crate::data::{is_missing, parse_number, Dataset};
use crate::error::{DashError, Result};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

pub fn classify(dataset: &Dataset, column: &str) -> Option<ColumnKind> {
    if !dataset.has_column(column) {
        return None;
    }
    Some(if dataset.is_numeric(column) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    })
}

/// The widget offered for a filtered column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum FilterControl {
    Range { column: String, min: f64, max: f64 },
    MultiSelect { column: String, options: Vec<String> },
}

impl FilterControl {
    pub fn column(&self) -> &str {
        match self {
            FilterControl::Range { column, .. } | FilterControl::MultiSelect { column, .. } => column,
        }
    }

    /// Full range / every option; keeps rows with missing cells so that the
    /// default leaves the dataset untouched.
    pub fn default_filter(&self) -> ColumnFilter {
        match self {
            FilterControl::Range { min, max, .. } => ColumnFilter::Range {
                lo: *min,
                hi: *max,
                keep_missing: true,
            },
            FilterControl::MultiSelect { options, .. } => ColumnFilter::Values {
                allowed: options.clone(),
                keep_missing: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnFilter {
    Range { lo: f64, hi: f64, keep_missing: bool },
    Values { allowed: Vec<String>, keep_missing: bool },
}

impl ColumnFilter {
    pub fn range(lo: f64, hi: f64) -> Self {
        ColumnFilter::Range { lo, hi, keep_missing: false }
    }

    pub fn values<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnFilter::Values {
            allowed: allowed.into_iter().map(Into::into).collect(),
            keep_missing: false,
        }
    }
}

/// Build one control per requested column. Columns absent from the dataset
/// are skipped.
pub fn filter_controls(dataset: &Dataset, columns: &[String]) -> Vec<FilterControl> {
    let mut controls = Vec::new();
    for col in columns {
        match classify(dataset, col) {
            Some(ColumnKind::Numeric) => {
                if let Some((min, max)) = dataset.min_max(col) {
                    controls.push(FilterControl::Range {
                        column: col.clone(),
                        min,
                        max,
                    });
                }
            }
            Some(ColumnKind::Categorical) => controls.push(FilterControl::MultiSelect {
                column: col.clone(),
                options: dataset.distinct_values(col),
            }),
            None => debug!("skipping filter on unknown column '{}'", col),
        }
    }
    controls
}

/// Current filter state, one entry per filtered column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterSelection {
    filters: BTreeMap<String, ColumnFilter>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults(dataset: &Dataset, columns: &[String]) -> Self {
        let filters = filter_controls(dataset, columns)
            .into_iter()
            .map(|c| (c.column().to_string(), c.default_filter()))
            .collect();
        Self { filters }
    }

    pub fn set(&mut self, column: &str, filter: ColumnFilter) {
        self.filters.insert(column.to_string(), filter);
    }

    pub fn with(mut self, column: &str, filter: ColumnFilter) -> Self {
        self.set(column, filter);
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnFilter)> {
        self.filters.iter()
    }

    /// A range can only be applied to a numeric column.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        for (col, filter) in &self.filters {
            if let ColumnFilter::Range { .. } = filter {
                if classify(dataset, col) == Some(ColumnKind::Categorical) {
                    return Err(DashError::SelectionConflict(format!(
                        "Column '{}' is not numeric and cannot be filtered by range",
                        col
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Keep the rows that pass every filter. Filters on columns the dataset does
/// not have are ignored.
pub fn apply_filters(dataset: &Dataset, selection: &FilterSelection) -> Dataset {
    let mut compiled: Vec<(usize, RowTest)> = Vec::new();
    for (col, filter) in selection.iter() {
        let Some(idx) = dataset.column_index(col) else {
            debug!("filter column '{}' not in dataset, skipped", col);
            continue;
        };
        compiled.push((idx, RowTest::from(filter)));
    }

    if compiled.is_empty() {
        return dataset.clone();
    }

    let filtered =
        dataset.filter_rows(|row| compiled.iter().all(|(idx, test)| test.accepts(&row[*idx])));
    debug!("filters kept {} of {} rows", filtered.len(), dataset.len());
    filtered
}

/// Apply the default selection for `columns`.
pub fn apply_default_filters(dataset: &Dataset, columns: &[String]) -> Dataset {
    apply_filters(dataset, &FilterSelection::defaults(dataset, columns))
}

enum RowTest {
    Range { lo: f64, hi: f64, keep_missing: bool },
    Values { allowed: HashSet<String>, keep_missing: bool },
}

impl From<&ColumnFilter> for RowTest {
    fn from(filter: &ColumnFilter) -> Self {
        match filter {
            ColumnFilter::Range { lo, hi, keep_missing } => RowTest::Range {
                lo: *lo,
                hi: *hi,
                keep_missing: *keep_missing,
            },
            ColumnFilter::Values { allowed, keep_missing } => RowTest::Values {
                allowed: allowed.iter().cloned().collect(),
                keep_missing: *keep_missing,
            },
        }
    }
}

impl RowTest {
    fn accepts(&self, cell: &str) -> bool {
        match self {
            RowTest::Range { lo, hi, keep_missing } => match parse_number(cell) {
                Some(v) => *lo <= v && v <= *hi,
                None => *keep_missing && is_missing(cell),
            },
            RowTest::Values { allowed, keep_missing } => {
                if is_missing(cell) {
                    *keep_missing
                } else {
                    allowed.contains(cell)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::make_dataset;

    fn sample() -> Dataset {
        make_dataset(
            vec!["Departamento", "Valor"],
            vec![vec!["A", "10"], vec!["B", "20"], vec!["A", "30"]],
        )
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_controls_by_kind() {
        let controls = filter_controls(&sample(), &cols(&["Valor", "Departamento"]));
        assert_eq!(
            controls[0],
            FilterControl::Range { column: "Valor".into(), min: 10.0, max: 30.0 }
        );
        assert_eq!(
            controls[1],
            FilterControl::MultiSelect {
                column: "Departamento".into(),
                options: vec!["A".into(), "B".into()]
            }
        );
    }

    #[test]
    fn test_unknown_columns_skipped() {
        let data = sample();
        let controls = filter_controls(&data, &cols(&["Nope"]));
        assert!(controls.is_empty());
        let selection = FilterSelection::new().with("Nope", ColumnFilter::values(["x"]));
        assert_eq!(apply_filters(&data, &selection), data);
    }

    #[test]
    fn test_default_selection_is_noop() {
        let data = make_dataset(
            vec!["d", "v"],
            vec![vec!["A", "1"], vec!["", "2"], vec!["B", ""]],
        );
        let out = apply_default_filters(&data, &cols(&["d", "v"]));
        assert_eq!(out, data);
    }

    #[test]
    fn test_range_is_inclusive() {
        let data = sample();
        let selection = FilterSelection::new().with("Valor", ColumnFilter::range(10.0, 20.0));
        let out = apply_filters(&data, &selection);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_range_15_25_keeps_single_row() {
        let selection = FilterSelection::new().with("Valor", ColumnFilter::range(15.0, 25.0));
        let out = apply_filters(&sample(), &selection);
        assert_eq!(out.rows, vec![vec!["B".to_string(), "20".to_string()]]);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let selection = FilterSelection::new()
            .with("Valor", ColumnFilter::range(0.0, 25.0))
            .with("Departamento", ColumnFilter::values(["A"]));
        let out = apply_filters(&sample(), &selection);
        assert_eq!(out.rows, vec![vec!["A".to_string(), "10".to_string()]]);
    }

    #[test]
    fn test_explicit_selection_drops_missing() {
        let data = make_dataset(vec!["d"], vec![vec!["A"], vec![""]]);
        let selection = FilterSelection::new().with("d", ColumnFilter::values(["A"]));
        assert_eq!(apply_filters(&data, &selection).len(), 1);
    }

    #[test]
    fn test_validate_rejects_range_on_text() {
        let selection = FilterSelection::new().with("Departamento", ColumnFilter::range(0.0, 1.0));
        assert!(matches!(
            selection.validate(&sample()),
            Err(DashError::SelectionConflict(_))
        ));
    }
}
