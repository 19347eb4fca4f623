//! tg-graph: layered tempering graph for tempergraph.
//!
//! Provides:
//! - Normalized tempering records (the builder's input rows)
//! - Core graph data structures (Node, NodeKind, Edge, Graph)
//! - Topology builder with validation
//! - Layer indexing for O(1) lookup by layer, key and alloy name
//!
//! # Example
//!
//! ```
//! use tg_graph::{build_graph, Layer, TemperingRecord};
//!
//! let records = vec![
//!     TemperingRecord::new("4140", 3600.0, 500.0, 38.0).with_component("C (%wt)", 0.4),
//!     TemperingRecord::new("4140", 3600.0, 600.0, 31.0).with_component("C (%wt)", 0.4),
//! ];
//! let graph = build_graph(&records).unwrap();
//!
//! assert_eq!(graph.layer(Layer::Alloy).len(), 1);
//! assert_eq!(graph.layer(Layer::Time).len(), 1);
//! assert_eq!(graph.layer(Layer::Hardness).len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod record;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{GraphBuilder, build_graph};
pub use error::{GraphError, GraphResult};
pub use graph::{AlloyData, Edge, EdgeMetrics, Graph, Layer, Node, NodeKey, NodeKind, Observation};
pub use indexing::LayerIndex;
pub use record::{TemperingRecord, normalize_attribute};
