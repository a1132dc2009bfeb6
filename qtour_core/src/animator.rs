//! Camera flights between tour poses.
//!
//! A flight is two tweens (camera position and controls target) that share a
//! duration and easing curve, so both land on the same frame. The animator
//! is advanced by the host's frame loop and hands back the flight's
//! [`Ticket`] exactly once, on the frame the flight lands.

use std::time::Duration;

use glam::Vec3;
use serde::Serialize;

use crate::pose::{CameraPose, CameraRig};

pub const DEFAULT_FLIGHT_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    QuadraticOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticOut => t * (2.0 - t),
        }
    }
}

/// Interpolates a vector towards a destination, each axis independently.
#[derive(Debug, Clone)]
pub struct Tween {
    from: Vec3,
    to: Vec3,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    pub fn advance(&mut self, dt: Duration) -> Vec3 {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
        self.value()
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value(&self) -> Vec3 {
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(self.to, self.easing.apply(self.progress()))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn destination(&self) -> Vec3 {
        self.to
    }
}

/// Identifies one flight. Tickets are never reused within an animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Flight {
    ticket: Ticket,
    position: Tween,
    look_at: Tween,
    restore_controls: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CameraAnimator {
    flight: Option<Flight>,
    issued: u64,
    easing: Easing,
}

impl CameraAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_easing(easing: Easing) -> Self {
        Self {
            easing,
            ..Self::default()
        }
    }

    /// Starts a flight from the rig's current pose. User controls are
    /// disabled until the flight lands. A flight that is replaced before it
    /// lands never resolves its ticket.
    pub fn animate(&mut self, rig: &mut CameraRig, to: CameraPose, duration: Duration) -> Ticket {
        let restore_controls = match self.flight.take() {
            Some(previous) => {
                log::debug!(
                    "[animator] flight {} superseded before landing",
                    previous.ticket.id()
                );
                previous.restore_controls
            }
            None => rig.controls.enabled,
        };
        rig.controls.enabled = false;

        self.issued += 1;
        let ticket = Ticket(self.issued);
        let from = rig.pose();
        self.flight = Some(Flight {
            ticket,
            position: Tween::new(from.position, to.position, duration, self.easing),
            look_at: Tween::new(from.look_at, to.look_at, duration, self.easing),
            restore_controls,
        });
        ticket
    }

    /// Steps the current flight and writes the interpolated pose into the rig.
    /// Returns the flight's ticket on the frame it lands.
    pub fn advance(&mut self, dt: Duration, rig: &mut CameraRig) -> Option<Ticket> {
        let flight = self.flight.as_mut()?;
        rig.position = flight.position.advance(dt);
        rig.controls.target = flight.look_at.advance(dt);
        if !(flight.position.is_finished() && flight.look_at.is_finished()) {
            return None;
        }

        let landed = self.flight.take()?;
        rig.controls.enabled = landed.restore_controls;
        Some(landed.ticket)
    }

    pub fn is_animating(&self) -> bool {
        self.flight.is_some()
    }

    pub fn pending_pose(&self) -> Option<CameraPose> {
        self.flight.as_ref().map(|flight| {
            CameraPose::new(flight.position.destination(), flight.look_at.destination())
        })
    }

    pub fn progress(&self) -> Option<f32> {
        self.flight.as_ref().map(|flight| flight.position.progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::ZoomLimits;

    const FRAME: Duration = Duration::from_millis(16);

    fn rig_at(position: Vec3, look_at: Vec3) -> CameraRig {
        CameraRig::new(CameraPose::new(position, look_at), ZoomLimits::new(0.5, 50.0))
    }

    #[test]
    fn quadratic_out_front_loads_motion() {
        let easing = Easing::QuadraticOut;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
        assert!((easing.apply(0.5) - 0.75).abs() < 1e-6);
        assert!(easing.apply(0.25) > Easing::Linear.apply(0.25));
        assert_eq!(easing.apply(2.0), 1.0);
    }

    #[test]
    fn tween_interpolates_each_axis() {
        let mut tween = Tween::new(
            Vec3::ZERO,
            Vec3::new(10.0, -4.0, 2.0),
            Duration::from_millis(1000),
            Easing::Linear,
        );
        let halfway = tween.advance(Duration::from_millis(500));
        assert!((halfway - Vec3::new(5.0, -2.0, 1.0)).length() < 1e-4);
        assert!(!tween.is_finished());
        let end = tween.advance(Duration::from_millis(900));
        assert_eq!(end, Vec3::new(10.0, -4.0, 2.0));
        assert!(tween.is_finished());
    }

    #[test]
    fn flight_lands_exactly_once_on_destination() {
        let mut rig = rig_at(Vec3::new(2.0, 0.2, -3.0), Vec3::ZERO);
        let mut animator = CameraAnimator::new();
        let destination = CameraPose::new(Vec3::new(0.25, 0.9, -2.15), Vec3::new(0.2, 0.89, -2.15));
        let ticket = animator.animate(&mut rig, destination, Duration::from_millis(1000));
        assert!(!rig.controls.enabled);
        assert_eq!(animator.pending_pose(), Some(destination));

        let mut landed = Vec::new();
        for _ in 0..100 {
            if let Some(done) = animator.advance(FRAME, &mut rig) {
                landed.push(done);
            }
        }

        assert_eq!(landed, vec![ticket]);
        assert_eq!(rig.pose(), destination);
        assert!(rig.controls.enabled);
        assert!(!animator.is_animating());
    }

    #[test]
    fn superseded_flight_never_resolves() {
        let mut rig = rig_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let mut animator = CameraAnimator::new();
        let first = animator.animate(
            &mut rig,
            CameraPose::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO),
            Duration::from_millis(200),
        );
        animator.advance(FRAME, &mut rig);
        let second = animator.animate(
            &mut rig,
            CameraPose::new(Vec3::new(0.0, 5.0, 1.0), Vec3::ZERO),
            Duration::from_millis(200),
        );
        assert_ne!(first, second);

        let mut landed = Vec::new();
        while animator.is_animating() {
            landed.extend(animator.advance(FRAME, &mut rig));
        }
        assert_eq!(landed, vec![second]);
        assert!(rig.controls.enabled, "original enabled flag restored");
    }

    #[test]
    fn zero_duration_lands_on_next_advance() {
        let mut rig = rig_at(Vec3::ONE, Vec3::ZERO);
        let mut animator = CameraAnimator::new();
        let target = CameraPose::new(Vec3::new(3.0, 3.0, 3.0), Vec3::X);
        let ticket = animator.animate(&mut rig, target, Duration::ZERO);
        assert_eq!(animator.advance(Duration::ZERO, &mut rig), Some(ticket));
        assert_eq!(rig.pose(), target);
    }
}
