//! Well-known reference frames, built on demand and at most once per graph.
//!
//! The catalogue follows the IERS 2003 non-rotating origin chain:
//!
//! ```text
//! J2000 ── IRF2000A/B ── TIRF2000A/B ── ITRF2000A/B
//!   └──── VEIS1950
//! ```
//!
//! The physical models behind the dynamic members (precession-nutation, Earth
//! rotation angle, pole motion) are injected as [`TransformProvider`]s through
//! [`CatalogModels`]. VEIS1950 is a constant rotation from J2000 and needs no
//! model.

use crate::date::AbsoluteDate;
use crate::error::{FrameError, FrameResult};
use crate::provider::TransformProvider;
use crate::transform::Transform;
use crate::tree::{FrameGraph, FrameId, FrameLink};
use log::debug;
use nalgebra::{Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Keys of the frame catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CatalogFrame {
    /// Intermediate Reference Frame 2000, complete precession-nutation model.
    Irf2000A,
    /// Intermediate Reference Frame 2000, simplified precession-nutation model.
    Irf2000B,
    /// Terrestrial Intermediate Reference Frame, Earth rotation over IRF2000A.
    Tirf2000A,
    /// Terrestrial Intermediate Reference Frame, Earth rotation over IRF2000B.
    Tirf2000B,
    /// International Terrestrial Reference Frame, pole motion over TIRF2000A.
    Itrf2000A,
    /// International Terrestrial Reference Frame, pole motion over TIRF2000B.
    Itrf2000B,
    /// Historical mean-equator frame of 1950.
    Veis1950,
}

impl CatalogFrame {
    /// Every key, parents before children.
    pub const ALL: [CatalogFrame; 7] = [
        CatalogFrame::Irf2000A,
        CatalogFrame::Irf2000B,
        CatalogFrame::Tirf2000A,
        CatalogFrame::Tirf2000B,
        CatalogFrame::Itrf2000A,
        CatalogFrame::Itrf2000B,
        CatalogFrame::Veis1950,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CatalogFrame::Irf2000A => "IRF2000A",
            CatalogFrame::Irf2000B => "IRF2000B",
            CatalogFrame::Tirf2000A => "TIRF2000A",
            CatalogFrame::Tirf2000B => "TIRF2000B",
            CatalogFrame::Itrf2000A => "ITRF2000A",
            CatalogFrame::Itrf2000B => "ITRF2000B",
            CatalogFrame::Veis1950 => "VEIS1950",
        }
    }

    /// Catalogue parent, `None` when the frame hangs directly from the root.
    pub fn parent(&self) -> Option<CatalogFrame> {
        match self {
            CatalogFrame::Irf2000A | CatalogFrame::Irf2000B | CatalogFrame::Veis1950 => None,
            CatalogFrame::Tirf2000A => Some(CatalogFrame::Irf2000A),
            CatalogFrame::Tirf2000B => Some(CatalogFrame::Irf2000B),
            CatalogFrame::Itrf2000A => Some(CatalogFrame::Tirf2000A),
            CatalogFrame::Itrf2000B => Some(CatalogFrame::Tirf2000B),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, CatalogFrame::Veis1950)
    }

    fn known_keys() -> String {
        CatalogFrame::ALL
            .iter()
            .map(|frame| frame.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CatalogFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CatalogFrame {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogFrame::ALL
            .into_iter()
            .find(|frame| frame.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FrameError::UnknownCatalogFrame {
                key: s.to_string(),
                known: CatalogFrame::known_keys(),
            })
    }
}

/// Transform from J2000 to VEIS1950.
pub fn veis1950_transform() -> Transform {
    let q1: f64 = -2.01425201682020570e-5;
    let q2: f64 = -2.43283773387856897e-3;
    let q3: f64 = 5.59078052583013584e-3;
    let q0 = (1.0 - q1 * q1 - q2 * q2 - q3 * q3).sqrt();
    // the published quaternion maps frame axes, vectors rotate the other way
    Transform::from_rotation(UnitQuaternion::new_normalize(Quaternion::new(
        q0, -q1, -q2, -q3,
    )))
}

/// Models backing the dynamic catalogue frames.
///
/// Each provider computes the transform from the catalogue parent of its key.
/// Nothing is registered for VEIS1950.
#[derive(Debug, Clone, Default)]
pub struct CatalogModels {
    providers: HashMap<CatalogFrame, Arc<dyn TransformProvider>>,
}

impl CatalogModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, key: CatalogFrame, provider: Arc<dyn TransformProvider>) -> Self {
        self.register(key, provider);
        self
    }

    /// Register the model of `key`, replacing any previous one.
    pub fn register(&mut self, key: CatalogFrame, provider: Arc<dyn TransformProvider>) {
        self.providers.insert(key, provider);
    }

    pub fn get(&self, key: CatalogFrame) -> Option<&Arc<dyn TransformProvider>> {
        self.providers.get(&key)
    }
}

impl FrameGraph {
    /// The catalogue frame `key`, built with its missing ancestors on first
    /// request.
    ///
    /// `date` is only used to compute the initial transform of frames built by
    /// this call. Later requests return the same frame whatever the date.
    pub fn catalog_frame(&mut self, key: CatalogFrame, date: AbsoluteDate) -> FrameResult<FrameId> {
        if let Some(id) = self.catalog.get(&key) {
            return Ok(*id);
        }

        let parent = match key.parent() {
            Some(parent_key) => self.catalog_frame(parent_key, date)?,
            None => self.root(),
        };

        let id = if key.is_dynamic() {
            let provider = self
                .models
                .get(key)
                .cloned()
                .ok_or_else(|| FrameError::MissingModel(key.to_string()))?;
            let initial = provider
                .transform_at(date)
                .map_err(|source| FrameError::ModelData {
                    frame: key.to_string(),
                    date,
                    source,
                })?;
            self.insert_node(parent, key.key(), FrameLink::Dynamic(provider), initial)?
        } else {
            self.insert_node(parent, key.key(), FrameLink::Fixed, veis1950_transform())?
        };

        debug!("Built catalogue frame {} at {}", key, date);
        self.catalog.insert(key, id);
        Ok(id)
    }

    /// Same as [`FrameGraph::catalog_frame`] with a textual key such as
    /// `"ITRF2000B"`.
    pub fn catalog_frame_by_key(&mut self, key: &str, date: AbsoluteDate) -> FrameResult<FrameId> {
        let key = key.parse::<CatalogFrame>()?;
        self.catalog_frame(key, date)
    }

    /// The catalogue frame `key` if it was already built.
    pub fn built_catalog_frame(&self, key: CatalogFrame) -> Option<FrameId> {
        self.catalog.get(&key).copied()
    }
}
