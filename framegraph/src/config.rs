//! RON description of a frame tree made of constant frames.
//!
//! ```ron
//! (
//!     root: "J2000",
//!     max_depth: 16,
//!     frames: [
//!         (name: "spacecraft", parent: "J2000", translation: (7000000.0, 0.0, 0.0)),
//!         (name: "star_tracker", parent: "spacecraft", rotation: (0.0, 0.0, 1.0, 0.0)),
//!     ],
//! )
//! ```

use crate::coordinates::{AngularCoordinates, PvCoordinates};
use crate::error::{FrameError, FrameResult};
use crate::transform::Transform;
use crate::tree::{FrameGraph, DEFAULT_MAX_DEPTH, DEFAULT_ROOT_NAME};
use log::debug;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use ron::extensions::Extensions;
use ron::Options;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;

fn default_root() -> String {
    DEFAULT_ROOT_NAME.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// A constant frame, defined from an already declared parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub name: String,
    pub parent: String,
    /// Meters, in the parent frame.
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub velocity: [f64; 3],
    /// Quaternion `(w, x, y, z)`, normalized when loaded. Identity if absent.
    #[serde(default)]
    pub rotation: Option<[f64; 4]>,
    /// Radians per second, in this frame.
    #[serde(default)]
    pub rotation_rate: [f64; 3],
}

impl FrameConfig {
    pub fn new(name: &str, parent: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.to_string(),
            translation: [0.0; 3],
            velocity: [0.0; 3],
            rotation: None,
            rotation_rate: [0.0; 3],
        }
    }

    /// Transform from the parent described by this entry.
    pub fn transform(&self) -> FrameResult<Transform> {
        let rotation = match self.rotation {
            None => UnitQuaternion::identity(),
            Some([w, x, y, z]) => {
                let q = Quaternion::new(w, x, y, z);
                UnitQuaternion::try_new(q, f64::EPSILON).ok_or_else(|| {
                    FrameError::Config(format!(
                        "rotation of frame '{}' is not a valid quaternion",
                        self.name
                    ))
                })?
            }
        };
        Ok(Transform::new(
            PvCoordinates::new(Vector3::from(self.translation), Vector3::from(self.velocity)),
            AngularCoordinates::new(rotation, Vector3::from(self.rotation_rate)),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Built in order, a frame can only refer to frames listed before it.
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_depth: default_max_depth(),
            frames: Vec::new(),
        }
    }
}

impl GraphConfig {
    fn get_options() -> Options {
        Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .with_default_extension(Extensions::UNWRAP_NEWTYPES)
            .with_default_extension(Extensions::UNWRAP_VARIANT_NEWTYPES)
    }

    pub fn from_ron(ron: &str) -> FrameResult<Self> {
        Self::get_options()
            .from_str(ron)
            .map_err(|e| FrameError::Config(format!("syntax error in frame configuration: {e}")))
    }

    pub fn to_ron(&self) -> FrameResult<String> {
        let pretty = ron::ser::PrettyConfig::default();
        Self::get_options()
            .to_string_pretty(self, pretty)
            .map_err(|e| FrameError::Config(e.to_string()))
    }
}

/// Read a frame configuration from a RON file.
pub fn read_configuration(config_filename: &str) -> FrameResult<GraphConfig> {
    let config_content = read_to_string(config_filename).map_err(|e| {
        FrameError::Config(format!(
            "failed to read configuration file {config_filename:?}: {e}"
        ))
    })?;
    GraphConfig::from_ron(&config_content)
}

impl FrameGraph {
    /// Build the tree described by `config`.
    pub fn from_config(config: &GraphConfig) -> FrameResult<Self> {
        let mut graph = FrameGraph::with_root(&config.root, config.max_depth);
        for frame in &config.frames {
            let parent = graph
                .find(&frame.parent)
                .ok_or_else(|| FrameError::MissingParent {
                    name: frame.name.clone(),
                    parent: frame.parent.clone(),
                })?;
            graph.add_frame(parent, &frame.name, frame.transform()?)?;
        }
        debug!(
            "Loaded {} frames under root '{}'",
            config.frames.len(),
            config.root
        );
        Ok(graph)
    }
}
