//! UI state containers.
//!
//! Plain last-write-wins holders for what the front end shows:
//! - `AlgorithmSelection`: chosen algorithm and convergence threshold
//! - `GraphFilter`: focused area and filtered graph data
//! - `PageGate`: decides whether a page may be shown for the current session

pub mod algorithm;
pub mod gate;
pub mod graph;

pub use algorithm::AlgorithmSelection;
pub use gate::{Access, PageGate};
pub use graph::{GraphFilter, ItemStyle, LineStyle, LinkData, NodeData};
