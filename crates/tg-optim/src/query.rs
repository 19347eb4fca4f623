//! Query configuration: objective, filters and cost parameters.
//!
//! A `Query` is read-only input to the filter engine and the cost model;
//! nothing in the optimizer mutates it.

use std::fmt;
use std::str::FromStr;

use tg_core::{Tolerances, celsius_to_kelvin, nearly_equal};
use tg_graph::AlloyData;

use crate::error::{OptimError, OptimResult};

/// Default time weight for balanced optimization.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// What a route minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Objective {
    Time,
    Temperature,
    Balanced,
}

impl Objective {
    pub fn as_str(self) -> &'static str {
        match self {
            Objective::Time => "time",
            Objective::Temperature => "temperature",
            Objective::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = OptimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "time" => Ok(Objective::Time),
            "temperature" | "temp" => Ok(Objective::Temperature),
            "balanced" => Ok(Objective::Balanced),
            other => Err(OptimError::invalid_query(format!(
                "unknown objective '{other}' (expected time, temperature or balanced)"
            ))),
        }
    }
}

/// Comparison applied by a composition filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonOp {
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Eq,
}

impl ComparisonOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Le => "<=",
            ComparisonOp::Eq => "==",
        }
    }

    /// Evaluate `lhs op rhs`. Equality uses the shared tolerance.
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Eq => nearly_equal(lhs, rhs, Tolerances::default()),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOp {
    type Err = OptimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(ComparisonOp::Gt),
            "<" => Ok(ComparisonOp::Lt),
            ">=" => Ok(ComparisonOp::Ge),
            "<=" => Ok(ComparisonOp::Le),
            "==" | "=" => Ok(ComparisonOp::Eq),
            other => Err(OptimError::invalid_query(format!(
                "unknown comparison operator '{other}'"
            ))),
        }
    }
}

/// Predicate on one composition attribute of an alloy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositionFilter {
    pub attribute: String,
    pub op: ComparisonOp,
    pub value: f64,
}

impl CompositionFilter {
    pub fn new(attribute: impl Into<String>, op: ComparisonOp, value: f64) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            value,
        }
    }

    /// An alloy lacking the attribute never matches.
    pub fn matches(&self, alloy: &AlloyData) -> bool {
        alloy
            .attribute(&self.attribute)
            .is_some_and(|v| self.op.apply(v, self.value))
    }
}

impl fmt::Display for CompositionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.op, self.value)
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    /// Whether `self` lies within `outer`.
    pub fn is_within(&self, outer: &ValueRange) -> bool {
        outer.min <= self.min && self.max <= outer.max
    }

    fn validate(&self, what: &str) -> OptimResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(OptimError::invalid_query(format!(
                "{what} bounds must be finite"
            )));
        }
        if self.min > self.max {
            return Err(OptimError::invalid_query(format!(
                "{what} min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Monotonic cost transform of tempering temperature.
///
/// Both variants act on absolute temperature (K) so the cost is never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "lowercase")
)]
pub enum TemperatureCost {
    /// `scale * T_K`
    Linear { scale: f64 },
    /// `scale * log_base(1 + T_K)`
    Logarithmic { base: f64, scale: f64 },
}

impl Default for TemperatureCost {
    fn default() -> Self {
        TemperatureCost::Logarithmic {
            base: std::f64::consts::E,
            scale: 1.0,
        }
    }
}

impl TemperatureCost {
    /// Cost of tempering at `celsius`.
    pub fn apply(&self, celsius: f64) -> f64 {
        let kelvin = celsius_to_kelvin(celsius).max(0.0);
        match *self {
            TemperatureCost::Linear { scale } => scale * kelvin,
            TemperatureCost::Logarithmic { base, scale } => scale * (1.0 + kelvin).ln() / base.ln(),
        }
    }

    fn validate(&self) -> OptimResult<()> {
        let scale = match *self {
            TemperatureCost::Linear { scale } => scale,
            TemperatureCost::Logarithmic { base, scale } => {
                if !(base.is_finite() && base > 1.0) {
                    return Err(OptimError::invalid_query(format!(
                        "logarithmic temperature cost base must be > 1 (got {base})"
                    )));
                }
                scale
            }
        };
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(OptimError::invalid_query(format!(
                "temperature cost scale must be finite and non-negative (got {scale})"
            )));
        }
        Ok(())
    }
}

/// A route query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Query {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub objective: Objective,
    /// Time weight for `Balanced`; ignored otherwise but still validated.
    #[cfg_attr(feature = "serde", serde(default = "default_alpha"))]
    pub alpha: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: Vec<CompositionFilter>,
    pub hardness_range: ValueRange,
    /// Exact alloy id (case-insensitive).
    #[cfg_attr(feature = "serde", serde(default))]
    pub alloy: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub time_range: Option<ValueRange>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature_range: Option<ValueRange>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature_cost: TemperatureCost,
}

#[cfg(feature = "serde")]
fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

impl Query {
    /// Query with no composition filters and the default cost settings.
    pub fn new(objective: Objective, hardness_range: ValueRange) -> Self {
        Self {
            name: String::new(),
            objective,
            alpha: DEFAULT_ALPHA,
            filters: Vec::new(),
            hardness_range,
            alloy: None,
            time_range: None,
            temperature_range: None,
            temperature_cost: TemperatureCost::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_filter(mut self, filter: CompositionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_alloy(mut self, alloy: impl Into<String>) -> Self {
        self.alloy = Some(alloy.into());
        self
    }

    pub fn with_time_range(mut self, range: ValueRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn with_temperature_range(mut self, range: ValueRange) -> Self {
        self.temperature_range = Some(range);
        self
    }

    pub fn with_temperature_cost(mut self, cost: TemperatureCost) -> Self {
        self.temperature_cost = cost;
        self
    }

    /// Check every parameter; the first problem found is reported.
    pub fn validate(&self) -> OptimResult<()> {
        if !(self.alpha.is_finite() && (0.0..=1.0).contains(&self.alpha)) {
            return Err(OptimError::invalid_query(format!(
                "alpha must be within [0, 1] (got {})",
                self.alpha
            )));
        }
        for filter in &self.filters {
            if filter.attribute.trim().is_empty() {
                return Err(OptimError::invalid_query("composition filter without attribute"));
            }
            if !filter.value.is_finite() {
                return Err(OptimError::invalid_query(format!(
                    "composition filter '{}' has non-finite value",
                    filter.attribute
                )));
            }
        }
        self.hardness_range.validate("hardness_range")?;
        if let Some(range) = &self.time_range {
            range.validate("time_range")?;
        }
        if let Some(range) = &self.temperature_range {
            range.validate("temperature_range")?;
        }
        self.temperature_cost.validate()
    }

    /// Whether an alloy passes the alloy-level predicates (name + composition).
    pub fn accepts_alloy(&self, alloy: &AlloyData) -> bool {
        let name_ok = self
            .alloy
            .as_deref()
            .is_none_or(|want| want.trim().to_lowercase() == alloy.name.trim().to_lowercase());
        name_ok && self.filters.iter().all(|f| f.matches(alloy))
    }

    /// Label used in logs and errors.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn alloy(name: &str, c: f64) -> AlloyData {
        AlloyData {
            name: name.into(),
            composition: BTreeMap::from([("c".to_string(), c)]),
            sources: BTreeSet::new(),
        }
    }

    #[test]
    fn operators_parse_and_apply() {
        for (text, lhs, rhs, expected) in [
            (">", 0.45, 0.4, true),
            ("<", 0.45, 0.4, false),
            (">=", 0.4, 0.4, true),
            ("<=", 0.41, 0.4, false),
            ("==", 0.1 + 0.2, 0.3, true),
        ] {
            let op: ComparisonOp = text.parse().unwrap();
            assert_eq!(op.as_str(), text);
            assert_eq!(op.apply(lhs, rhs), expected, "{lhs} {text} {rhs}");
        }
        assert!("=>".parse::<ComparisonOp>().is_err());
    }

    #[test]
    fn objective_parses_case_insensitively() {
        assert_eq!("Balanced".parse::<Objective>().unwrap(), Objective::Balanced);
        assert_eq!("temp".parse::<Objective>().unwrap(), Objective::Temperature);
        assert!(matches!(
            "cheapest".parse::<Objective>(),
            Err(OptimError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn composition_filter_requires_attribute() {
        let f = CompositionFilter::new("%C", ComparisonOp::Gt, 0.4);
        assert!(f.matches(&alloy("A", 0.45)));
        assert!(!f.matches(&alloy("B", 0.2)));

        let missing = CompositionFilter::new("%Mo", ComparisonOp::Ge, 0.0);
        assert!(!missing.matches(&alloy("A", 0.45)));
    }

    #[test]
    fn alloy_name_match_ignores_case() {
        let q = Query::new(Objective::Time, ValueRange::new(0.0, 70.0)).with_alloy(" aisi 4140 ");
        assert!(q.accepts_alloy(&alloy("AISI 4140", 0.4)));
        assert!(!q.accepts_alloy(&alloy("AISI 1045", 0.45)));
    }

    #[test]
    fn alloy_name_match_folds_non_ascii_case() {
        let q = Query::new(Objective::Time, ValueRange::new(40.0, 60.0)).with_alloy(" ÅCIER 42CRMO4 ");
        assert!(q.accepts_alloy(&alloy("åcier 42CrMo4", 0.4)));
        assert!(!q.accepts_alloy(&alloy("acier 42CrMo4", 0.4)));
    }

    #[test]
    fn alpha_outside_unit_interval_is_invalid() {
        let base = Query::new(Objective::Balanced, ValueRange::new(40.0, 60.0));
        assert!(base.clone().with_alpha(0.0).validate().is_ok());
        assert!(base.clone().with_alpha(1.0).validate().is_ok());
        for alpha in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                base.clone().with_alpha(alpha).validate(),
                Err(OptimError::InvalidQuery { .. })
            ));
        }
    }

    #[test]
    fn inverted_range_is_invalid() {
        let q = Query::new(Objective::Time, ValueRange::new(60.0, 40.0));
        assert!(q.validate().is_err());
        let q = Query::new(Objective::Time, ValueRange::new(40.0, 60.0))
            .with_time_range(ValueRange::new(0.0, f64::INFINITY));
        assert!(q.validate().is_err());
    }

    #[test]
    fn temperature_cost_is_monotonic_and_non_negative() {
        let costs = [
            TemperatureCost::default(),
            TemperatureCost::Linear { scale: 1.0 },
            TemperatureCost::Logarithmic {
                base: 10.0,
                scale: 2.0,
            },
        ];
        for cost in costs {
            let mut last = -1.0;
            for celsius in [-273.15, 0.0, 150.0, 400.0, 700.0] {
                let v = cost.apply(celsius);
                assert!(v >= 0.0);
                assert!(v > last, "{cost:?} not increasing at {celsius}");
                last = v;
            }
        }
    }

    #[test]
    fn log_cost_matches_formula() {
        let cost = TemperatureCost::Logarithmic {
            base: 10.0,
            scale: 1.0,
        };
        let expected = (1.0 + 773.15_f64).log10();
        assert!((cost.apply(500.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn bad_temperature_cost_is_invalid() {
        let q = Query::new(Objective::Temperature, ValueRange::new(0.0, 70.0))
            .with_temperature_cost(TemperatureCost::Logarithmic {
                base: 1.0,
                scale: 1.0,
            });
        assert!(q.validate().is_err());
        let q = Query::new(Objective::Temperature, ValueRange::new(0.0, 70.0))
            .with_temperature_cost(TemperatureCost::Linear { scale: -1.0 });
        assert!(q.validate().is_err());
    }
}
