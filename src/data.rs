use crate::error::{DashError, Result};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::Read;

/// Markers treated as missing values when reading survey exports.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// An in-memory table. Every cell is kept as text; typing is inferred per
/// column when needed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn is_missing(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || NA_MARKERS.contains(&v)
}

pub fn parse_number(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric order when both values are numbers, text order otherwise.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Render a number back to a cell; integral values drop the fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse CSV text with a header row. Header names are trimmed and short
    /// rows are padded with empty cells.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| DashError::Parse(format!("Failed to read CSV header: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| DashError::Parse(format!("Failed to read CSV row {}: {}", idx + 1, e)))?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Create a Dataset from a JSON array of objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value.as_array().ok_or_else(|| {
            DashError::Parse("Input data must be a JSON array of objects".to_string())
        })?;

        let mut headers: Vec<String> = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| DashError::Parse("Items in array must be objects".to_string()))?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            // Checked above
            let obj = item.as_object().cloned().unwrap_or_default();
            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => String::new(),
                    _ => {
                        return Err(DashError::Parse(format!(
                            "Unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, or a schema error listing the available columns.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DashError::schema(name, &self.headers))
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// A column is numeric when it has values and every one of them parses.
    pub fn is_numeric(&self, name: &str) -> bool {
        let Some(values) = self.column(name) else {
            return false;
        };
        let mut seen = false;
        for v in values {
            if is_missing(v) {
                continue;
            }
            if parse_number(v).is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    pub fn numeric_values(&self, name: &str) -> Vec<f64> {
        self.column(name)
            .map(|vals| vals.into_iter().filter_map(parse_number).collect())
            .unwrap_or_default()
    }

    pub fn min_max(&self, name: &str) -> Option<(f64, f64)> {
        let values = self.numeric_values(name);
        if values.is_empty() {
            return None;
        }
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// Distinct non-missing values in order of first appearance.
    pub fn distinct_values(&self, name: &str) -> Vec<String> {
        let Some(values) = self.column(name) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for v in values {
            if !is_missing(v) && seen.insert(v) {
                out.push(v.to_string());
            }
        }
        out
    }

    /// Distinct non-missing values in value order.
    pub fn sorted_distinct_values(&self, name: &str) -> Vec<String> {
        let mut values = self.distinct_values(name);
        values.sort_by(|a, b| compare_values(a, b));
        values
    }

    pub fn filter_rows<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&[String]) -> bool,
    {
        Dataset {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rows without any missing cell, capped at `n`.
    pub fn preview(&self, n: usize) -> Dataset {
        Dataset {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| !r.iter().any(|c| is_missing(c)))
                .take(n)
                .cloned()
                .collect(),
        }
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let to_err = |e: csv::Error| DashError::Render(format!("Failed to write CSV: {}", e));
        wtr.write_record(&self.headers).map_err(to_err)?;
        for row in &self.rows {
            wtr.write_record(row).map_err(to_err)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| DashError::Render(format!("Failed to flush CSV: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| DashError::Render(e.to_string()))
    }

    /// Records view with typed cells: numbers, `null` for missing, text otherwise.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let numeric: Vec<bool> = self.headers.iter().map(|h| self.is_numeric(h)).collect();
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (idx, header) in self.headers.iter().enumerate() {
                    let cell = &row[idx];
                    let value = if is_missing(cell) {
                        Value::Null
                    } else if numeric[idx] {
                        parse_number(cell)
                            .and_then(Number::from_f64)
                            .map(Value::Number)
                            .unwrap_or(Value::Null)
                    } else {
                        Value::String(cell.clone())
                    };
                    obj.insert(header.clone(), value);
                }
                obj
            })
            .collect()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_records())
    }
}

#[cfg(test)]
pub(crate) fn make_dataset(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Dataset {
    Dataset {
        headers: headers.iter().map(|s| s.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    }
}
