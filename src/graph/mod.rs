// Account interaction graph: snapshot model and structural analysis.

pub mod snapshot;
pub mod structure;

pub use snapshot::{GraphEdge, GraphIndex, GraphNode, GraphSnapshot, NodeMetadata, NodeSet};
