use serde::Serialize;

/// Errors raised while loading, reshaping or charting a dataset.
///
/// None of these abort the process: the failure unit is always a single chart
/// or dashboard section, and the caller decides how to display it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DashError {
    #[error("Failed to load data from '{url}': {reason}")]
    DataLoad { url: String, reason: String },

    #[error("Column '{column}' not found. Available columns: {}", .available.join(", "))]
    Schema { column: String, available: Vec<String> },

    #[error("{0}")]
    SelectionConflict(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl DashError {
    pub fn schema(column: &str, available: &[String]) -> Self {
        DashError::Schema {
            column: column.to_string(),
            available: available.to_vec(),
        }
    }

    /// Selection problems and empty results are shown as warnings; everything
    /// else is an error message.
    pub fn severity(&self) -> Severity {
        match self {
            DashError::SelectionConflict(_) | DashError::EmptyResult(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message_lists_columns() {
        let err = DashError::schema("Edad", &["Nombre".to_string(), "Grado".to_string()]);
        assert_eq!(
            err.to_string(),
            "Column 'Edad' not found. Available columns: Nombre, Grado"
        );
    }

    #[test]
    fn test_severity() {
        assert_eq!(DashError::EmptyResult("x".into()).severity(), Severity::Warning);
        assert_eq!(DashError::SelectionConflict("x".into()).severity(), Severity::Warning);
        assert_eq!(
            DashError::DataLoad { url: "u".into(), reason: "r".into() }.severity(),
            Severity::Error
        );
    }
}
