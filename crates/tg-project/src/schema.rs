//! Query and record file schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tg_graph::TemperingRecord;
use tg_optim::TemperatureCost;

pub const LATEST_VERSION: u32 = 1;

/// A query file: a versioned list of named queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryFile {
    #[serde(default = "latest_version")]
    pub version: u32,
    #[serde(default)]
    pub queries: Vec<QueryDef>,
}

fn latest_version() -> u32 {
    LATEST_VERSION
}

impl QueryFile {
    pub fn new(queries: Vec<QueryDef>) -> Self {
        Self {
            version: LATEST_VERSION,
            queries,
        }
    }
}

/// Query files may also be a bare list of queries.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryDocument {
    File(QueryFile),
    List(Vec<QueryDef>),
}

impl From<QueryDocument> for QueryFile {
    fn from(doc: QueryDocument) -> Self {
        match doc {
            QueryDocument::File(file) => file,
            QueryDocument::List(queries) => QueryFile::new(queries),
        }
    }
}

/// One query as written by a user.
///
/// `filters` mixes the reserved keys `steel_type`, `hardness_range`,
/// `time_range` and `temperature_range` with composition predicates keyed by
/// attribute name, e.g. `"C (%wt)": { op: ">", val: 0.4 }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryDef {
    #[serde(default, alias = "name")]
    pub query_name: String,
    #[serde(default, alias = "objective")]
    pub optimize_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_cost: Option<TemperatureCost>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
}

impl QueryDef {
    pub fn new(name: impl Into<String>, optimize_by: impl Into<String>) -> Self {
        Self {
            query_name: name.into(),
            optimize_by: optimize_by.into(),
            alpha: None,
            temperature_cost: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
}

/// Value of one entry in a query's `filters` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Range { min: f64, max: f64 },
    Comparison { op: String, val: f64 },
    Text(String),
}

impl FilterValue {
    pub fn range(min: f64, max: f64) -> Self {
        FilterValue::Range { min, max }
    }

    pub fn comparison(op: impl Into<String>, val: f64) -> Self {
        FilterValue::Comparison { op: op.into(), val }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FilterValue::Range { .. } => "range",
            FilterValue::Comparison { .. } => "comparison",
            FilterValue::Text(_) => "text",
        }
    }
}

/// Record files are either `{ records: [...] }` or a bare list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecordFile {
    Wrapped { records: Vec<TemperingRecord> },
    List(Vec<TemperingRecord>),
}

impl RecordFile {
    pub fn into_records(self) -> Vec<TemperingRecord> {
        match self {
            RecordFile::Wrapped { records } | RecordFile::List(records) => records,
        }
    }
}
