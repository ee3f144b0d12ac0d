//! Graph model projection
//!
//! Turns arbitrary query results into a renderable node/edge model.
//!
//! ## Modules
//!
//! - [`models`] - GraphNode, GraphEdge, GraphElement, GraphModel
//! - [`projector`] - recursive result walk, dedup by composite id, label colors
//! - [`edit`] - update/delete statements for a single element
//! - [`view`] - `GraphView`, swapped only after a successful commit

pub mod edit;
pub mod models;
pub mod projector;
pub mod view;

pub use edit::{delete_statement, update_statement};
pub use models::{GraphEdge, GraphElement, GraphModel, GraphNode, RawId};
pub use projector::{classify, label_color, project, project_rows, ResultShape};
pub use view::{GraphView, REFRESH_QUERY};
