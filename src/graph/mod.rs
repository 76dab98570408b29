//! Graph snapshot, highlight propagation and search.

mod highlight;
mod model;
mod search;
mod store;

pub use highlight::{HighlightEngine, HighlightSet};
pub use model::{GraphSnapshot, GraphStats, Link, LinkKey, Node, NodeId};
pub use search::{SearchMatcher, SearchOutcome};
pub use store::GraphDataStore;
