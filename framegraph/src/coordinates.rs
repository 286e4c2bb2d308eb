//! Kinematic building blocks of a [`Transform`](crate::Transform): a
//! translational part carrying position and its first two derivatives, and a
//! rotational part carrying an orientation with its rate and acceleration.

use bincode::{Decode, Encode};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use uom::si::acceleration::meter_per_second_squared;
use uom::si::angular_velocity::radian_per_second;
use uom::si::f64::{Acceleration, AngularVelocity, Length, Velocity};
use uom::si::length::meter;
use uom::si::velocity::meter_per_second;

/// Position, velocity and acceleration, in meters and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvCoordinates {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
}

impl PvCoordinates {
    pub fn zero() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
        }
    }

    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector3::zeros(),
        }
    }

    pub fn with_acceleration(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    /// Second order Taylor extrapolation by `dt` seconds.
    pub fn shifted_by(&self, dt: f64) -> Self {
        Self {
            position: self.position + self.velocity * dt + self.acceleration * (0.5 * dt * dt),
            velocity: self.velocity + self.acceleration * dt,
            acceleration: self.acceleration,
        }
    }

    pub fn position_lengths(&self) -> [Length; 3] {
        [
            Length::new::<meter>(self.position.x),
            Length::new::<meter>(self.position.y),
            Length::new::<meter>(self.position.z),
        ]
    }

    pub fn velocity_units(&self) -> [Velocity; 3] {
        [
            Velocity::new::<meter_per_second>(self.velocity.x),
            Velocity::new::<meter_per_second>(self.velocity.y),
            Velocity::new::<meter_per_second>(self.velocity.z),
        ]
    }

    pub fn acceleration_units(&self) -> [Acceleration; 3] {
        [
            Acceleration::new::<meter_per_second_squared>(self.acceleration.x),
            Acceleration::new::<meter_per_second_squared>(self.acceleration.y),
            Acceleration::new::<meter_per_second_squared>(self.acceleration.z),
        ]
    }
}

impl Default for PvCoordinates {
    fn default() -> Self {
        Self::zero()
    }
}

/// Orientation with its time derivatives.
///
/// `rotation` maps coordinates of a vector in the reference frame to its
/// coordinates in the rotated frame. `rotation_rate` is the angular velocity
/// of the rotated frame with respect to the reference frame, expressed in the
/// rotated frame, so that a vector fixed in the reference frame is seen moving
/// at `-rotation_rate × v` from the rotated frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularCoordinates {
    pub rotation: UnitQuaternion<f64>,
    pub rotation_rate: Vector3<f64>,
    pub rotation_acceleration: Vector3<f64>,
}

impl AngularCoordinates {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            rotation_rate: Vector3::zeros(),
            rotation_acceleration: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f64>, rotation_rate: Vector3<f64>) -> Self {
        Self {
            rotation,
            rotation_rate,
            rotation_acceleration: Vector3::zeros(),
        }
    }

    pub fn with_acceleration(
        rotation: UnitQuaternion<f64>,
        rotation_rate: Vector3<f64>,
        rotation_acceleration: Vector3<f64>,
    ) -> Self {
        Self {
            rotation,
            rotation_rate,
            rotation_acceleration,
        }
    }

    /// Angular coordinates equivalent to applying `first` then `second`.
    pub fn compose(first: &AngularCoordinates, second: &AngularCoordinates) -> Self {
        let carried_rate = second.rotation * first.rotation_rate;
        Self {
            rotation: second.rotation * first.rotation,
            rotation_rate: second.rotation_rate + carried_rate,
            rotation_acceleration: second.rotation_acceleration
                + second.rotation * first.rotation_acceleration
                - second.rotation_rate.cross(&carried_rate),
        }
    }

    pub fn inverse(&self) -> Self {
        let back = self.rotation.inverse();
        Self {
            rotation: back,
            rotation_rate: -(back * self.rotation_rate),
            rotation_acceleration: -(back * self.rotation_acceleration),
        }
    }

    /// Extrapolation by `dt` seconds, exact when the rotation acceleration is
    /// null or aligned with the rotation rate.
    pub fn shifted_by(&self, dt: f64) -> Self {
        let swept = self.rotation_rate * dt + self.rotation_acceleration * (0.5 * dt * dt);
        Self {
            rotation: UnitQuaternion::from_scaled_axis(-swept) * self.rotation,
            rotation_rate: self.rotation_rate + self.rotation_acceleration * dt,
            rotation_acceleration: self.rotation_acceleration,
        }
    }

    pub fn rotation_rate_units(&self) -> [AngularVelocity; 3] {
        [
            AngularVelocity::new::<radian_per_second>(self.rotation_rate.x),
            AngularVelocity::new::<radian_per_second>(self.rotation_rate.y),
            AngularVelocity::new::<radian_per_second>(self.rotation_rate.z),
        ]
    }
}

impl Default for AngularCoordinates {
    fn default() -> Self {
        Self::identity()
    }
}

/// A position-velocity state together with an attitude, both expressed with
/// respect to the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub pv: PvCoordinates,
    pub attitude: AngularCoordinates,
}

fn encode_vector<E: bincode::enc::Encoder>(
    v: &Vector3<f64>,
    encoder: &mut E,
) -> Result<(), bincode::error::EncodeError> {
    [v.x, v.y, v.z].encode(encoder)
}

fn decode_vector<D: bincode::de::Decoder<Context = ()>>(
    decoder: &mut D,
) -> Result<Vector3<f64>, bincode::error::DecodeError> {
    let [x, y, z]: [f64; 3] = Decode::decode(decoder)?;
    Ok(Vector3::new(x, y, z))
}

impl Encode for PvCoordinates {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        encode_vector(&self.position, encoder)?;
        encode_vector(&self.velocity, encoder)?;
        encode_vector(&self.acceleration, encoder)
    }
}

impl Decode<()> for PvCoordinates {
    fn decode<D: bincode::de::Decoder<Context = ()>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        Ok(Self {
            position: decode_vector(decoder)?,
            velocity: decode_vector(decoder)?,
            acceleration: decode_vector(decoder)?,
        })
    }
}

impl Encode for AngularCoordinates {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        let q = self.rotation.quaternion();
        [q.w, q.i, q.j, q.k].encode(encoder)?;
        encode_vector(&self.rotation_rate, encoder)?;
        encode_vector(&self.rotation_acceleration, encoder)
    }
}

impl Decode<()> for AngularCoordinates {
    fn decode<D: bincode::de::Decoder<Context = ()>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let [w, i, j, k]: [f64; 4] = Decode::decode(decoder)?;
        Ok(Self {
            rotation: UnitQuaternion::from_quaternion(Quaternion::new(w, i, j, k)),
            rotation_rate: decode_vector(decoder)?,
            rotation_acceleration: decode_vector(decoder)?,
        })
    }
}
