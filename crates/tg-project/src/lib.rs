//! tg-project: record and query file formats, validation and reports.

pub mod hash;
pub mod report;
pub mod schema;
pub mod validate;

use std::path::Path;

use tg_graph::TemperingRecord;
use tg_optim::Query;
use tracing::debug;

use crate::schema::QueryDocument;

pub use hash::fingerprint;
pub use report::{ReportMeta, render_text};
pub use schema::*;
pub use validate::{DEFAULT_HARDNESS_RANGE, ValidationError, to_query, validate_query_file};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file format: {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },
}

/// Serialization format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> ProjectResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(ProjectError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

fn read<T: serde::de::DeserializeOwned>(path: &Path) -> ProjectResult<T> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok(match format {
        Format::Yaml => serde_yaml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    })
}

fn write<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> ProjectResult<()> {
    let content = match Format::from_path(path)? {
        Format::Yaml => serde_yaml::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}

/// Load tempering records. Rows are not checked here; the graph builder
/// rejects malformed ones with their index.
pub fn load_records(path: &Path) -> ProjectResult<Vec<TemperingRecord>> {
    let records = read::<RecordFile>(path)?.into_records();
    debug!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

pub fn save_records(path: &Path, records: &[TemperingRecord]) -> ProjectResult<()> {
    write(
        path,
        &RecordFile::Wrapped {
            records: records.to_vec(),
        },
    )
}

/// Load a query file without converting it.
pub fn load_query_file(path: &Path) -> ProjectResult<QueryFile> {
    Ok(read::<QueryDocument>(path)?.into())
}

/// Load, validate and convert every query of a file.
pub fn load_queries(path: &Path) -> ProjectResult<Vec<Query>> {
    let file = load_query_file(path)?;
    let queries = validate_query_file(&file)?;
    debug!(path = %path.display(), queries = queries.len(), "queries loaded");
    Ok(queries)
}

pub fn save_query_file(path: &Path, file: &QueryFile) -> ProjectResult<()> {
    validate_query_file(file)?;
    write(path, file)
}

/// Write any serializable result (route, grid) as JSON or YAML.
pub fn save_output<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> ProjectResult<()> {
    write(path, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_by_extension() {
        assert_eq!(Format::from_path(Path::new("q.yaml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("q.YML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("q.json")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("q.csv")),
            Err(ProjectError::UnsupportedFormat { .. })
        ));
        assert!(Format::from_path(Path::new("queries")).is_err());
    }
}
