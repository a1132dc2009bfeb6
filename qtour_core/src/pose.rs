use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TourError};

/// A camera position paired with the point the orbit controls look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub const fn new(position: Vec3, look_at: Vec3) -> Self {
        Self { position, look_at }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.look_at.is_finite()
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.look_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl ZoomLimits {
    pub const fn new(min_distance: f32, max_distance: f32) -> Self {
        Self {
            min_distance,
            max_distance,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let valid = self.min_distance.is_finite()
            && self.max_distance.is_finite()
            && self.min_distance > 0.0
            && self.min_distance <= self.max_distance;
        if valid {
            Ok(())
        } else {
            Err(TourError::InvalidZoom {
                min: self.min_distance,
                max: self.max_distance,
            })
        }
    }

    pub fn clamp(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub zoom: ZoomLimits,
}

/// The camera plus its orbit controls. The animator writes both halves while
/// a flight is in progress; user input only lands while `controls.enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraRig {
    pub position: Vec3,
    pub controls: OrbitControls,
}

impl CameraRig {
    pub fn new(pose: CameraPose, zoom: ZoomLimits) -> Self {
        Self {
            position: pose.position,
            controls: OrbitControls {
                target: pose.look_at,
                enabled: true,
                zoom,
            },
        }
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose::new(self.position, self.controls.target)
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = pose.position;
        self.controls.target = pose.look_at;
    }

    pub fn distance(&self) -> f32 {
        self.pose().distance()
    }

    /// Rotates the camera around the controls target. Returns false when the
    /// controls are disabled or the camera sits on the target.
    pub fn orbit(&mut self, yaw_radians: f32, pitch_radians: f32) -> bool {
        if !self.controls.enabled {
            return false;
        }
        let offset = self.position - self.controls.target;
        if offset.length_squared() <= f32::EPSILON {
            return false;
        }

        let mut rotated = Quat::from_rotation_y(yaw_radians) * offset;
        let right = rotated.cross(Vec3::Y);
        if right.length_squared() > f32::EPSILON {
            let pitched = Quat::from_axis_angle(right.normalize(), pitch_radians) * rotated;
            // keep the camera from flipping over the poles
            if pitched.normalize().dot(Vec3::Y).abs() < 0.999 {
                rotated = pitched;
            }
        }

        self.position = self.controls.target + rotated;
        true
    }

    /// Scales the distance to the target, clamped to the active zoom limits.
    pub fn zoom_by(&mut self, factor: f32) -> bool {
        if !self.controls.enabled || !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let offset = self.position - self.controls.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return false;
        }
        let clamped = self.controls.zoom.clamp(distance * factor);
        self.position = self.controls.target + offset * (clamped / distance);
        true
    }
}
