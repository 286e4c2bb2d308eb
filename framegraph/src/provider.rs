//! Refresh hook of date-dependent frames.
//!
//! The graph does not know how precession, Earth rotation or pole motion are
//! computed. A dynamic frame carries a [`TransformProvider`] and the graph asks
//! it for the transform from the frame's parent at the query date, right before
//! that transform is used.

use crate::date::AbsoluteDate;
use crate::transform::Transform;
use std::fmt::Debug;
use thiserror::Error;

/// Failure of an external frame model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("no model data available at {date}: {reason}")]
    DataUnavailable { date: AbsoluteDate, reason: String },

    #[error("model computation failed: {0}")]
    Computation(String),
}

/// Computes the transform from a frame's parent to the frame at a given date.
///
/// Implementations must be deterministic in the date (and in the model data
/// they own) and must not touch any other frame.
pub trait TransformProvider: Debug + Send + Sync {
    fn transform_at(&self, date: AbsoluteDate) -> Result<Transform, ModelError>;
}

/// A provider returning the same transform at any date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedProvider(pub Transform);

impl TransformProvider for FixedProvider {
    fn transform_at(&self, _date: AbsoluteDate) -> Result<Transform, ModelError> {
        Ok(self.0)
    }
}

/// A provider backed by a closure.
///
/// # Example
/// ```
/// use framegraph::{AbsoluteDate, FnProvider, Transform, TransformProvider};
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let earth_rate = 7.292115e-5;
/// let rotation = FnProvider::new("simple earth rotation", move |date: AbsoluteDate| {
///     let angle = earth_rate * date.j2000_seconds();
///     Ok(Transform::from_rotation_rate(
///         UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -angle),
///         Vector3::new(0.0, 0.0, earth_rate),
///     ))
/// });
/// assert!(rotation.transform_at(AbsoluteDate::J2000_EPOCH).is_ok());
/// ```
pub struct FnProvider<F> {
    label: &'static str,
    model: F,
}

impl<F> FnProvider<F>
where
    F: Fn(AbsoluteDate) -> Result<Transform, ModelError> + Send + Sync,
{
    pub fn new(label: &'static str, model: F) -> Self {
        Self { label, model }
    }
}

impl<F> Debug for FnProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProvider")
            .field("label", &self.label)
            .finish()
    }
}

impl<F> TransformProvider for FnProvider<F>
where
    F: Fn(AbsoluteDate) -> Result<Transform, ModelError> + Send + Sync,
{
    fn transform_at(&self, date: AbsoluteDate) -> Result<Transform, ModelError> {
        (self.model)(date)
    }
}
