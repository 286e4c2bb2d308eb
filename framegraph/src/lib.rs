//! A tree of reference frames for space flight dynamics.
//!
//! Every frame but the root is defined by a [`Transform`] from its parent,
//! either constant or recomputed at each query date by a
//! [`TransformProvider`]. [`FrameGraph::transform_to`] combines them into the
//! transform between any two frames of the tree.
//!
//! ```
//! use framegraph::{AbsoluteDate, FrameGraph, Transform};
//! use nalgebra::Vector3;
//!
//! let mut graph = FrameGraph::new();
//! let offset = Transform::from_translation(Vector3::new(-7.0e6, 0.0, 0.0));
//! let spacecraft = graph.add_frame(graph.root(), "spacecraft", offset).unwrap();
//! let t = graph
//!     .transform_to(graph.root(), spacecraft, AbsoluteDate::J2000_EPOCH)
//!     .unwrap();
//! assert_eq!(t.transform_position(&Vector3::new(7.0e6, 1.0, 0.0)), Vector3::new(0.0, 1.0, 0.0));
//! ```

pub mod catalog;
pub mod config;
pub mod coordinates;
pub mod date;
pub mod error;
pub mod provider;
mod solver;
pub mod transform;
pub mod tree;

#[cfg(test)]
mod test_utils;

pub use catalog::{CatalogFrame, CatalogModels};
pub use config::{read_configuration, FrameConfig, GraphConfig};
pub use coordinates::{AngularCoordinates, Pose, PvCoordinates};
pub use date::AbsoluteDate;
pub use error::{FrameError, FrameResult};
pub use provider::{FixedProvider, FnProvider, ModelError, TransformProvider};
pub use transform::Transform;
pub use tree::{FrameGraph, FrameId, FramePath, DEFAULT_MAX_DEPTH};
