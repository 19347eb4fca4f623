//! Query file validation and conversion into optimizer queries.

use std::collections::HashSet;
use std::str::FromStr;

use tg_graph::normalize_attribute;
use tg_optim::{ComparisonOp, CompositionFilter, Objective, Query, ValueRange};

use crate::schema::{FilterValue, LATEST_VERSION, QueryDef, QueryFile};

/// Hardness range assumed when a query does not name one (full HRC scale).
pub const DEFAULT_HARDNESS_RANGE: ValueRange = ValueRange {
    min: 0.0,
    max: 100.0,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Query #{index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Duplicate query name: {name}")]
    DuplicateName { name: String },

    #[error("Query '{name}': empty filters")]
    EmptyFilters { name: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Query '{name}': {reason}")]
    InvalidQuery { name: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Validate every query of a file and convert them, in file order.
pub fn validate_query_file(file: &QueryFile) -> Result<Vec<Query>, ValidationError> {
    if file.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: file.version,
        });
    }

    let mut names = HashSet::new();
    let mut queries = Vec::with_capacity(file.queries.len());
    for (index, def) in file.queries.iter().enumerate() {
        let query = to_query(index, def)?;
        if !names.insert(query.name.clone()) {
            return Err(ValidationError::DuplicateName { name: query.name });
        }
        queries.push(query);
    }
    Ok(queries)
}

/// Convert one query definition. `index` is used only in error messages.
pub fn to_query(index: usize, def: &QueryDef) -> Result<Query, ValidationError> {
    let name = def.query_name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField {
            index,
            field: "query_name",
        });
    }
    if def.optimize_by.trim().is_empty() {
        return Err(ValidationError::MissingField {
            index,
            field: "optimize_by",
        });
    }
    let objective = Objective::from_str(&def.optimize_by).map_err(|e| {
        ValidationError::InvalidValue {
            field: format!("{name}.optimize_by"),
            value: def.optimize_by.clone(),
            reason: e.to_string(),
        }
    })?;
    if def.filters.is_empty() {
        return Err(ValidationError::EmptyFilters {
            name: name.to_string(),
        });
    }

    let mut query = Query::new(objective, DEFAULT_HARDNESS_RANGE).named(name);
    if let Some(alpha) = def.alpha {
        query = query.with_alpha(alpha);
    }
    if let Some(cost) = def.temperature_cost {
        query = query.with_temperature_cost(cost);
    }

    for (key, value) in &def.filters {
        let field = format!("{name}.filters.{key}");
        let mismatch = |expected: &str| ValidationError::InvalidValue {
            field: field.clone(),
            value: value.kind().to_string(),
            reason: format!("expected a {expected}"),
        };
        match (normalize_attribute(key).as_str(), value) {
            ("steel_type" | "alloy", FilterValue::Text(alloy)) => query = query.with_alloy(alloy.trim()),
            ("steel_type" | "alloy", _) => return Err(mismatch("steel name")),
            ("hardness_range", FilterValue::Range { min, max }) => {
                query.hardness_range = ValueRange::new(*min, *max);
            }
            ("time_range", FilterValue::Range { min, max }) => {
                query = query.with_time_range(ValueRange::new(*min, *max));
            }
            ("temperature_range", FilterValue::Range { min, max }) => {
                query = query.with_temperature_range(ValueRange::new(*min, *max));
            }
            ("hardness_range" | "time_range" | "temperature_range", _) => {
                return Err(mismatch("{ min, max } range"));
            }
            (_, FilterValue::Comparison { op, val }) => {
                let op = ComparisonOp::from_str(op).map_err(|e| ValidationError::InvalidValue {
                    field: field.clone(),
                    value: op.clone(),
                    reason: e.to_string(),
                })?;
                query = query.with_filter(CompositionFilter::new(key.as_str(), op, *val));
            }
            (_, _) => return Err(mismatch("{ op, val } comparison")),
        }
    }

    query
        .validate()
        .map_err(|e| ValidationError::InvalidQuery {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> QueryDef {
        QueryDef::new("hard", "time").with_filter("hardness_range", FilterValue::range(50.0, 55.0))
    }

    #[test]
    fn converts_reserved_and_composition_filters() {
        let def = base()
            .with_filter("C (%wt)", FilterValue::comparison(">", 0.4))
            .with_filter("steel_type", FilterValue::Text(" AISI 4140 ".into()))
            .with_filter("time_range", FilterValue::range(10.0, 3600.0));
        let q = to_query(0, &def).unwrap();
        assert_eq!(q.name, "hard");
        assert_eq!(q.objective, Objective::Time);
        assert_eq!(q.hardness_range, ValueRange::new(50.0, 55.0));
        assert_eq!(q.alloy.as_deref(), Some("AISI 4140"));
        assert_eq!(q.time_range, Some(ValueRange::new(10.0, 3600.0)));
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters[0].op, ComparisonOp::Gt);
    }

    #[test]
    fn hardness_range_defaults_to_full_scale() {
        let def = QueryDef::new("any", "temperature")
            .with_filter("%Cr", FilterValue::comparison("=", 1.0));
        let q = to_query(0, &def).unwrap();
        assert_eq!(q.hardness_range, DEFAULT_HARDNESS_RANGE);
        assert_eq!(q.filters[0].op, ComparisonOp::Eq);
    }

    #[test]
    fn rejects_missing_fields_and_empty_filters() {
        let mut def = base();
        def.query_name = " ".into();
        assert!(matches!(
            to_query(3, &def),
            Err(ValidationError::MissingField { index: 3, field: "query_name" })
        ));

        let def = QueryDef::new("x", "time");
        assert!(matches!(to_query(0, &def), Err(ValidationError::EmptyFilters { .. })));

        let def = QueryDef::new("x", "fastest").with_filter("c", FilterValue::comparison(">", 0.1));
        assert!(matches!(to_query(0, &def), Err(ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_shape_mismatch_and_bad_alpha() {
        let def = base().with_filter("time_range", FilterValue::comparison(">", 1.0));
        assert!(matches!(to_query(0, &def), Err(ValidationError::InvalidValue { .. })));

        let def = base().with_filter("c", FilterValue::comparison("~", 1.0));
        assert!(matches!(to_query(0, &def), Err(ValidationError::InvalidValue { .. })));

        let def = QueryDef::new("b", "balanced")
            .with_alpha(1.5)
            .with_filter("hardness_range", FilterValue::range(50.0, 55.0));
        assert!(matches!(to_query(0, &def), Err(ValidationError::InvalidQuery { .. })));

        let def = QueryDef::new("r", "time").with_filter("hardness_range", FilterValue::range(60.0, 50.0));
        assert!(matches!(to_query(0, &def), Err(ValidationError::InvalidQuery { .. })));
    }

    #[test]
    fn file_checks_names_and_version() {
        let file = QueryFile::new(vec![base(), base()]);
        assert!(matches!(
            validate_query_file(&file),
            Err(ValidationError::DuplicateName { .. })
        ));

        let mut file = QueryFile::new(vec![base()]);
        file.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_query_file(&file),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }
}
