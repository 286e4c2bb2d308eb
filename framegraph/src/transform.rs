use crate::coordinates::{AngularCoordinates, Pose, PvCoordinates};
use bincode::{Decode, Encode};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Rigid motion between two frames, with its first and second time
/// derivatives.
///
/// A transform from frame A to frame B maps the coordinates of a point in A to
/// its coordinates in B by first translating then rotating:
/// `p_B = rotation * (p_A + translation)`.
///
/// The translational part (`cartesian`) carries the translation with its
/// velocity and acceleration, expressed in A. The rotational part (`angular`)
/// carries the rotation with the angular velocity and acceleration of B with
/// respect to A, expressed in B.
///
/// # Examples
///
/// ```
/// use framegraph::Transform;
/// use nalgebra::{UnitQuaternion, Vector3};
///
/// let shift = Transform::from_translation(Vector3::new(1.0, 0.0, 0.0));
/// let turn = Transform::from_rotation(UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3));
/// let both = Transform::compose(&shift, &turn);
///
/// let p = Vector3::new(0.0, 2.0, 0.0);
/// let direct = turn.transform_position(&shift.transform_position(&p));
/// assert!((both.transform_position(&p) - direct).norm() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub cartesian: PvCoordinates,
    pub angular: AngularCoordinates,
}

impl Transform {
    pub fn new(cartesian: PvCoordinates, angular: AngularCoordinates) -> Self {
        Self { cartesian, angular }
    }

    /// The empty composition: no translation, no rotation, no motion.
    pub fn identity() -> Self {
        Self {
            cartesian: PvCoordinates::zero(),
            angular: AngularCoordinates::identity(),
        }
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::from_pv(PvCoordinates::new(translation, Vector3::zeros()))
    }

    pub fn from_translation_velocity(translation: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self::from_pv(PvCoordinates::new(translation, velocity))
    }

    pub fn from_pv(cartesian: PvCoordinates) -> Self {
        Self {
            cartesian,
            angular: AngularCoordinates::identity(),
        }
    }

    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self::from_angular(AngularCoordinates::new(rotation, Vector3::zeros()))
    }

    pub fn from_rotation_rate(rotation: UnitQuaternion<f64>, rotation_rate: Vector3<f64>) -> Self {
        Self::from_angular(AngularCoordinates::new(rotation, rotation_rate))
    }

    pub fn from_angular(angular: AngularCoordinates) -> Self {
        Self {
            cartesian: PvCoordinates::zero(),
            angular,
        }
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.cartesian.position
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.cartesian.velocity
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.angular.rotation
    }

    pub fn rotation_rate(&self) -> Vector3<f64> {
        self.angular.rotation_rate
    }

    /// The transform equivalent to applying `first` then `second`.
    ///
    /// If `first` goes from P to Q and `second` from Q to R, the result goes
    /// from P to R.
    pub fn compose(first: &Transform, second: &Transform) -> Self {
        let back = first.angular.rotation.inverse();
        let w1 = first.angular.rotation_rate;
        let w1_dot = first.angular.rotation_acceleration;
        let t2 = second.cartesian.position;
        let v2 = second.cartesian.velocity;
        let a2 = second.cartesian.acceleration;

        let translation = first.cartesian.position + back * t2;
        let velocity = first.cartesian.velocity + back * (w1.cross(&t2) + v2);
        let acceleration = first.cartesian.acceleration
            + back * (w1.cross(&w1.cross(&t2)) + w1.cross(&v2) * 2.0 + w1_dot.cross(&t2) + a2);

        Self {
            cartesian: PvCoordinates::with_acceleration(translation, velocity, acceleration),
            angular: AngularCoordinates::compose(&first.angular, &second.angular),
        }
    }

    /// The transform undoing this one: `compose(t, t.inverse())` is the
    /// identity to rounding errors.
    pub fn inverse(&self) -> Self {
        let rotation = self.angular.rotation;
        let w = self.angular.rotation_rate;
        let w_dot = self.angular.rotation_acceleration;
        let t = rotation * self.cartesian.position;
        let v = rotation * self.cartesian.velocity;
        let a = rotation * self.cartesian.acceleration;

        let translation = -t;
        let velocity = w.cross(&t) - v;
        let acceleration = w_dot.cross(&t) - w.cross(&w.cross(&t)) + w.cross(&v) * 2.0 - a;

        Self {
            cartesian: PvCoordinates::with_acceleration(translation, velocity, acceleration),
            angular: self.angular.inverse(),
        }
    }

    /// Taylor extrapolation of the transform by `dt` seconds.
    pub fn shifted_by(&self, dt: f64) -> Self {
        Self {
            cartesian: self.cartesian.shifted_by(dt),
            angular: self.angular.shifted_by(dt),
        }
    }

    /// Coordinates of a point.
    pub fn transform_position(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.angular.rotation * (position + self.cartesian.position)
    }

    /// Coordinates of a free vector (a direction): only the rotation applies.
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.angular.rotation * vector
    }

    /// Position, velocity and acceleration of a moving point, including the
    /// transport, Coriolis and centrifugal terms due to the frame motion.
    pub fn transform_pv(&self, pv: &PvCoordinates) -> PvCoordinates {
        let rotation = self.angular.rotation;
        let w = self.angular.rotation_rate;
        let w_dot = self.angular.rotation_acceleration;

        let p = rotation * (pv.position + self.cartesian.position);
        let q_dot = rotation * (pv.velocity + self.cartesian.velocity);
        let q_ddot = rotation * (pv.acceleration + self.cartesian.acceleration);

        let v = q_dot - w.cross(&p);
        let a = q_ddot - w.cross(&v) * 2.0 - w.cross(&w.cross(&p)) - w_dot.cross(&p);

        PvCoordinates::with_acceleration(p, v, a)
    }

    /// Attitude with respect to the source frame turned into an attitude with
    /// respect to the destination frame.
    pub fn transform_angular(&self, attitude: &AngularCoordinates) -> AngularCoordinates {
        AngularCoordinates::compose(&self.angular.inverse(), attitude)
    }

    pub fn transform_pose(&self, pose: &Pose) -> Pose {
        Pose {
            pv: self.transform_pv(&pose.pv),
            attitude: self.transform_angular(&pose.attitude),
        }
    }

    /// Component-wise comparison, `tolerance` applies to every derivative
    /// order and to the rotation angle in radians.
    pub fn approx_eq(&self, other: &Transform, tolerance: f64) -> bool {
        let close = |a: &Vector3<f64>, b: &Vector3<f64>| (a - b).norm() <= tolerance;
        // twice the vector part of the relative quaternion is the angle for small angles
        let relative = self.angular.rotation.inverse() * other.angular.rotation;
        close(&self.cartesian.position, &other.cartesian.position)
            && close(&self.cartesian.velocity, &other.cartesian.velocity)
            && close(&self.cartesian.acceleration, &other.cartesian.acceleration)
            && 2.0 * relative.imag().norm() <= tolerance
            && close(&self.angular.rotation_rate, &other.angular.rotation_rate)
            && close(
                &self.angular.rotation_acceleration,
                &other.angular.rotation_acceleration,
            )
    }
}

/// `a * b` applies `b` first then `a`, like matrix products.
impl Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Transform::compose(&rhs, &self)
    }
}

impl Encode for Transform {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        self.cartesian.encode(encoder)?;
        self.angular.encode(encoder)
    }
}

impl Decode<()> for Transform {
    fn decode<D: bincode::de::Decoder<Context = ()>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        Ok(Self {
            cartesian: PvCoordinates::decode(decoder)?,
            angular: AngularCoordinates::decode(decoder)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_approx_eq, assert_transform_eq, sample_transform};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_is_neutral() {
        let t = sample_transform(0.4);
        assert_transform_eq(&Transform::compose(&Transform::identity(), &t), &t, 1e-15);
        assert_transform_eq(&Transform::compose(&t, &Transform::identity()), &t, 1e-15);
    }

    #[test]
    fn test_inverse_cancels() {
        let t = sample_transform(1.3);
        assert_transform_eq(
            &Transform::compose(&t, &t.inverse()),
            &Transform::identity(),
            1e-12,
        );
        assert_transform_eq(
            &Transform::compose(&t.inverse(), &t),
            &Transform::identity(),
            1e-12,
        );
    }

    #[test]
    fn test_composition_is_associative() {
        let a = sample_transform(0.2);
        let b = sample_transform(-0.7);
        let c = sample_transform(2.1);
        let left = Transform::compose(&Transform::compose(&a, &b), &c);
        let right = Transform::compose(&a, &Transform::compose(&b, &c));
        assert_transform_eq(&left, &right, 1e-12);
    }

    #[test]
    fn test_composition_matches_sequential_application() {
        let a = sample_transform(0.9);
        let b = sample_transform(-1.6);
        let pv = PvCoordinates::with_acceleration(
            Vector3::new(7000e3, -1200e3, 300e3),
            Vector3::new(1.5e3, 7.2e3, -0.4e3),
            Vector3::new(-8.0, 1.2, 0.3),
        );
        let sequential = b.transform_pv(&a.transform_pv(&pv));
        let composed = Transform::compose(&a, &b).transform_pv(&pv);
        assert!((sequential.position - composed.position).norm() < 1e-6);
        assert!((sequential.velocity - composed.velocity).norm() < 1e-9);
        assert!((sequential.acceleration - composed.acceleration).norm() < 1e-8);
    }

    #[test]
    fn test_inverse_restores_pv() {
        let t = sample_transform(-0.3);
        let pv = PvCoordinates::with_acceleration(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-0.5, 0.1, 0.2),
            Vector3::new(0.01, 0.0, -0.02),
        );
        let back = t.inverse().transform_pv(&t.transform_pv(&pv));
        assert!((back.position - pv.position).norm() < 1e-12);
        assert!((back.velocity - pv.velocity).norm() < 1e-12);
        assert!((back.acceleration - pv.acceleration).norm() < 1e-12);
    }

    #[test]
    fn test_translation_then_rotation() {
        let shift = Transform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let turn = Transform::from_rotation(UnitQuaternion::from_axis_angle(
            &Vector3::z_axis(),
            FRAC_PI_2,
        ));
        let t = Transform::compose(&shift, &turn);
        let p = t.transform_position(&Vector3::new(1.0, 0.0, 0.0));
        assert_approx_eq(p.x, 0.0, 1e-14, "x");
        assert_approx_eq(p.y, 2.0, 1e-14, "y");
        assert_approx_eq(p.z, 0.0, 1e-14, "z");
        // directions ignore the translation
        let d = t.transform_vector(&Vector3::new(1.0, 0.0, 0.0));
        assert_approx_eq(d.y, 1.0, 1e-14, "direction y");
    }

    #[test]
    fn test_rotating_frame_velocity() {
        // destination frame spins about Z at 1 rad/s
        let spin =
            Transform::from_rotation_rate(UnitQuaternion::identity(), Vector3::new(0.0, 0.0, 1.0));
        let fixed = PvCoordinates::new(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        let seen = spin.transform_pv(&fixed);
        assert_approx_eq(seen.velocity.y, -2.0, 1e-15, "transport velocity");
        // centripetal acceleration towards the axis
        assert_approx_eq(seen.acceleration.x, -2.0, 1e-15, "centripetal");
    }

    #[test]
    fn test_transform_angular() {
        let turn =
            Transform::from_rotation(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7));
        let attitude = AngularCoordinates::new(
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2),
            Vector3::new(0.0, 0.0, 0.01),
        );
        let converted = turn.transform_angular(&attitude);
        // a direction given in the destination frame reaches the same body axis
        let u_dest = Vector3::new(0.3, -0.2, 0.9);
        let u_src = turn.inverse().transform_vector(&u_dest);
        let via_src = attitude.rotation * u_src;
        let via_dest = converted.rotation * u_dest;
        assert!((via_src - via_dest).norm() < 1e-15);
        assert!((converted.rotation_rate - attitude.rotation_rate).norm() < 1e-15);
    }

    #[test]
    fn test_shifted_by_constant_motion() {
        let t = Transform::new(
            PvCoordinates::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)),
            AngularCoordinates::new(UnitQuaternion::identity(), Vector3::new(0.0, 0.0, FRAC_PI_2)),
        );
        let later = t.shifted_by(1.0);
        assert_approx_eq(later.translation().y, 1.0, 1e-15, "translation y");
        let seen = later.transform_vector(&Vector3::x());
        assert_approx_eq(seen.y, -1.0, 1e-14, "rotated y");
    }

    #[test]
    fn test_mul_operator_order() {
        let a = sample_transform(0.1);
        let b = sample_transform(0.5);
        assert_eq!(b * a, Transform::compose(&a, &b));
    }

    #[test]
    fn test_bincode_encoding() {
        let t = sample_transform(0.8);
        let bytes = bincode::encode_to_vec(t, bincode::config::standard()).unwrap();
        let (decoded, len): (Transform, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(len, bytes.len());
        assert_transform_eq(&decoded, &t, 1e-15);
    }
}
