use crate::coordinates::{AngularCoordinates, PvCoordinates};
use crate::date::AbsoluteDate;
use crate::provider::{ModelError, TransformProvider};
use crate::transform::Transform;
use nalgebra::{UnitQuaternion, Vector3};

pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: f64, message: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= epsilon,
        "{message}: expected {expected}, got {actual}, difference {diff} exceeds epsilon {epsilon}",
    );
}

pub fn assert_transform_eq(actual: &Transform, expected: &Transform, epsilon: f64) {
    assert!(
        actual.approx_eq(expected, epsilon),
        "transforms differ by more than {epsilon}:\n  actual:   {actual:?}\n  expected: {expected:?}",
    );
}

/// A transform with every component set, scaled like a satellite-fixed frame:
/// kilometric offsets, slow rotation.
pub fn sample_transform(seed: f64) -> Transform {
    let s = seed + 1.7;
    Transform::new(
        PvCoordinates::with_acceleration(
            Vector3::new(1200.0 * s.sin(), -800.0 * s.cos(), 450.0 + 30.0 * s),
            Vector3::new(3.0 * s.cos(), 1.5 + s.sin(), -2.0),
            Vector3::new(1e-3, -2e-3 * s.cos(), 5e-4 * s),
        ),
        AngularCoordinates::with_acceleration(
            UnitQuaternion::from_euler_angles(0.3 * s, -0.2 + 0.1 * s, 1.1 * s.sin()),
            Vector3::new(2e-3 * s.sin(), -1e-3, 7e-4 * s),
            Vector3::new(-3e-6, 1e-6 * s.cos(), 2e-6),
        ),
    )
}

/// Uniform rotation about Z starting aligned with the parent at J2000.
#[derive(Debug)]
pub struct SpinProvider {
    rate: f64,
}

impl SpinProvider {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl TransformProvider for SpinProvider {
    fn transform_at(&self, date: AbsoluteDate) -> Result<Transform, ModelError> {
        let angle = self.rate * date.j2000_seconds();
        Ok(Transform::from_rotation_rate(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -angle),
            Vector3::new(0.0, 0.0, self.rate),
        ))
    }
}
