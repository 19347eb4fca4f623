//! tg-core: shared foundation for tempergraph.
//!
//! Contains:
//! - ids (compact ids for graph nodes and edges)
//! - numeric (Real + tolerances + float helpers)
//! - units (uom temperature constructors and °C/K conversion)
//! - error (shared error types)
//! - timing (opt-in phase timers)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TgError, TgResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
