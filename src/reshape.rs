//! Table reshaping used by the survey pages before charting.

use crate::data::{is_missing, Dataset};
use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Fail with a schema error naming the first missing column.
pub fn require_columns(dataset: &Dataset, columns: &[&str]) -> Result<()> {
    for col in columns {
        dataset.require_column(col)?;
    }
    Ok(())
}

/// Wide to long: every `value_vars` column becomes one row per input row,
/// carrying the `id_vars`, the source column name and its value.
pub fn melt(
    dataset: &Dataset,
    id_vars: &[String],
    value_vars: &[String],
    var_name: &str,
    value_name: &str,
) -> Result<Dataset> {
    let id_idx = id_vars
        .iter()
        .map(|c| dataset.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    let value_idx = value_vars
        .iter()
        .map(|c| dataset.require_column(c))
        .collect::<Result<Vec<_>>>()?;

    let mut headers = id_vars.to_vec();
    headers.push(var_name.to_string());
    headers.push(value_name.to_string());

    let mut rows = Vec::with_capacity(dataset.len() * value_vars.len());
    for (var, &vidx) in value_vars.iter().zip(&value_idx) {
        for row in &dataset.rows {
            let mut out: Vec<String> = id_idx.iter().map(|&i| row[i].clone()).collect();
            out.push(var.clone());
            out.push(row[vidx].clone());
            rows.push(out);
        }
    }

    Ok(Dataset::new(headers, rows))
}

/// Left join on equal keys. The right-hand key columns are dropped from the
/// output; unmatched left rows get empty cells. When the right side has
/// several matches the left row is repeated.
pub fn merge_left(
    left: &Dataset,
    right: &Dataset,
    left_on: &[String],
    right_on: &[String],
) -> Result<Dataset> {
    if left_on.len() != right_on.len() {
        return Err(DashError::SelectionConflict(format!(
            "Join keys differ in length ({} vs {})",
            left_on.len(),
            right_on.len()
        )));
    }

    let left_keys = left_on
        .iter()
        .map(|c| left.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    let right_keys = right_on
        .iter()
        .map(|c| right.require_column(c))
        .collect::<Result<Vec<_>>>()?;

    let right_payload: Vec<usize> = (0..right.headers.len())
        .filter(|i| !right_keys.contains(i))
        .collect();

    let mut index: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
    for (ridx, row) in right.rows.iter().enumerate() {
        let key: Vec<&str> = right_keys.iter().map(|&i| row[i].as_str()).collect();
        index.entry(key).or_default().push(ridx);
    }

    let mut headers = left.headers.clone();
    for &i in &right_payload {
        let name = &right.headers[i];
        if headers.contains(name) {
            headers.push(format!("{}_y", name));
        } else {
            headers.push(name.clone());
        }
    }

    let mut rows = Vec::with_capacity(left.len());
    for row in &left.rows {
        let key: Vec<&str> = left_keys.iter().map(|&i| row[i].as_str()).collect();
        match index.get(&key) {
            Some(matches) => {
                for &ridx in matches {
                    let mut out = row.clone();
                    out.extend(right_payload.iter().map(|&i| right.rows[ridx][i].clone()));
                    rows.push(out);
                }
            }
            None => {
                let mut out = row.clone();
                out.extend(std::iter::repeat(String::new()).take(right_payload.len()));
                rows.push(out);
            }
        }
    }

    Ok(Dataset::new(headers, rows))
}

/// Keep the first row of every distinct combination of `subset`.
pub fn drop_duplicates(dataset: &Dataset, subset: &[String]) -> Result<Dataset> {
    let idx = subset
        .iter()
        .map(|c| dataset.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    Ok(dataset.filter_rows(|row| {
        let key: Vec<String> = idx.iter().map(|&i| row[i].clone()).collect();
        seen.insert(key)
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextNormalization {
    Trim,
    TrimTitle,
}

/// Clean up a categorical column in place.
pub fn normalize_column(dataset: &mut Dataset, column: &str, mode: TextNormalization) -> Result<()> {
    let idx = dataset.require_column(column)?;
    for row in &mut dataset.rows {
        let cell = &mut row[idx];
        if is_missing(cell) {
            continue;
        }
        let trimmed = cell.trim();
        *cell = match mode {
            TextNormalization::Trim => trimmed.to_string(),
            TextNormalization::TrimTitle => title_case(trimmed),
        };
    }
    Ok(())
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start = false;
        } else {
            out.push(c);
            start = true;
        }
    }
    out
}
