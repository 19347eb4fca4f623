//! Normalized tempering records.
//!
//! One record is one experimental observation: an alloy tempered for a given
//! time (s) at a given temperature (°C), yielding a final hardness (HRC).

use std::collections::BTreeMap;

/// A cleaned row as supplied by the data collaborator.
///
/// Time, temperature and hardness are optional so that incomplete rows can
/// be represented and rejected by the builder with a precise error.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemperingRecord {
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: String,
    pub alloy_id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub composition: BTreeMap<String, f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hardness: Option<f64>,
}

impl TemperingRecord {
    /// Complete record with an empty composition.
    pub fn new(alloy_id: impl Into<String>, time: f64, temperature: f64, hardness: f64) -> Self {
        Self {
            source: String::new(),
            alloy_id: alloy_id.into(),
            composition: BTreeMap::new(),
            time: Some(time),
            temperature: Some(temperature),
            hardness: Some(hardness),
        }
    }

    pub fn with_component(mut self, attribute: impl Into<String>, value: f64) -> Self {
        self.composition.insert(attribute.into(), value);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Canonical composition attribute name.
///
/// Lowercases, strips unit decorations (`(%wt)`, `%wt`, `%`, parentheses)
/// and joins the remaining words with `_`, so `"C (%wt)"`, `"%C"` and `"c"`
/// all name the same attribute.
pub fn normalize_attribute(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = lowered
        .replace("(%wt)", " ")
        .replace("%wt", " ")
        .replace(['%', '(', ')'], " ");
    stripped.split_whitespace().collect::<Vec<_>>().join("_")
}
