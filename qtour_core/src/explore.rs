//! Free exploration of the full cryostat: numbered marker spheres, an
//! onboarding popup that gates interaction, and click-to-focus camera
//! flights that return to the overview when the popup is closed.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::animator::{CameraAnimator, Ticket};
use crate::config::read_json;
use crate::controller::{NavOutcome, Stage};
use crate::decorations::{DecorationHandle, LabelSprite, MarkerDecorator, SceneGraph};
use crate::error::{Result, TourError};
use crate::events::{IgnoreReason, NavAction, TourEvent};
use crate::pose::{CameraPose, ZoomLimits};
use crate::presenter::{InstructionsView, MarkerView, PopupPresenter};

pub const MARKER_RADIUS: f32 = 0.3;
const MARKER_LABEL_LIFT: f32 = 0.5;
const MARKER_LABEL_SIZE: f32 = 0.6;
const FOV_DEGREES: f32 = 75.0;
const NEAR_CLIP: f32 = 0.1;
const FAR_CLIP: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub annotation: String,
    /// Centre of the clickable sphere.
    pub position: Vec3,
    /// Controls target while the marker is in focus.
    pub look_at: Vec3,
    /// Camera position while the marker is in focus.
    pub camera_position: Vec3,
}

impl Marker {
    pub fn focus_pose(&self) -> CameraPose {
        CameraPose::new(self.camera_position, self.look_at)
    }

    fn label(&self) -> LabelSprite {
        LabelSprite {
            text: self.number.to_string(),
            color: [1.0, 1.0, 1.0],
            size: MARKER_LABEL_SIZE,
            position: self.position + Vec3::Y * MARKER_LABEL_LIFT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MarkerDocument {
    markers: Vec<Marker>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new(markers: Vec<Marker>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for marker in &markers {
            if !seen.insert(marker.number) {
                return Err(TourError::DuplicateMarker(marker.number));
            }
            let field = if !marker.position.is_finite() {
                Some("position")
            } else if !marker.look_at.is_finite() {
                Some("look-at")
            } else if !marker.camera_position.is_finite() {
                Some("camera position")
            } else {
                None
            };
            if let Some(field) = field {
                return Err(TourError::NonFiniteMarker {
                    number: marker.number,
                    field,
                });
            }
        }
        Ok(Self { markers })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let document: MarkerDocument = read_json(path)?;
        Self::new(document.markers)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&MarkerDocument {
            markers: self.markers.clone(),
        })
    }

    /// Points of interest on the full dilution refrigerator model.
    pub fn builtin() -> Self {
        let marker = |number, title: &str, annotation: &str, position, look_at, camera_position| {
            Marker {
                number,
                title: title.to_string(),
                annotation: annotation.to_string(),
                position,
                look_at,
                camera_position,
            }
        };
        Self {
            markers: vec![
                marker(
                    1,
                    "Quantum Processor",
                    "• The **chip** holding the qubits sits at the very bottom of the fridge.\n• It is shielded from magnetic fields and stray light.",
                    Vec3::new(0.0, -12.0, -6.0),
                    Vec3::new(0.1, -8.9, -2.8),
                    Vec3::new(-5.0, -9.0, -2.8),
                ),
                marker(
                    2,
                    "Quantum Amplifiers",
                    "• Boost the faint readout signals leaving the qubits.\n• Add as little noise as physics allows.",
                    Vec3::new(5.0, -9.0, -3.0),
                    Vec3::new(1.5, -9.5, -4.0),
                    Vec3::new(5.76, -8.55, -6.4),
                ),
                marker(
                    3,
                    "Qubit Signal Amplifiers",
                    "• A second amplification stage at a warmer plate.\n• Lifts signals above the noise of room-temperature electronics.",
                    Vec3::new(6.0, 0.0, -3.0),
                    Vec3::new(3.0, 0.0, -3.0),
                    Vec3::new(7.4, 0.4, -0.65),
                ),
                marker(
                    4,
                    "Superconducting Coaxial Lines",
                    "• Carry signals between stages with **no resistance**.\n• Keep heat from leaking down to the processor.",
                    Vec3::new(6.0, -3.0, -1.0),
                    Vec3::new(1.0, -3.5, -1.0),
                    Vec3::new(1.08, -2.46, 3.9),
                ),
                marker(
                    5,
                    "Input Microwave Lines",
                    "• Deliver the microwave pulses that control the qubits.\n• Attenuated at each stage to filter thermal noise.",
                    Vec3::new(-4.5, -2.0, -7.0),
                    Vec3::new(-1.0, -1.0, -5.0),
                    Vec3::new(-3.26, -0.25, -9.4),
                ),
                marker(
                    6,
                    "Mixing Chamber",
                    "• The coldest stage, around **15 millikelvin**.\n• Cooling comes from mixing helium-3 into helium-4.",
                    Vec3::new(-4.5, -6.0, -4.0),
                    Vec3::new(0.0, -8.0, -3.0),
                    Vec3::new(-3.49, -6.0, -6.0),
                ),
                marker(
                    7,
                    "External Components",
                    "• Pumps, control racks and wiring that live outside the fridge.\n• They generate and read the signals sent to the processor.",
                    Vec3::new(0.0, 2.0, -2.0),
                    Vec3::new(0.0, 1.0, -3.0),
                    Vec3::new(0.0, 2.0, -8.0),
                ),
            ],
        }
    }

    pub fn get(&self, number: u32) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.number == number)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Nearest marker sphere the ray passes through.
    pub fn pick(&self, ray: &Ray) -> Option<&Marker> {
        self.markers
            .iter()
            .filter_map(|marker| {
                ray.sphere_hit(marker.position, MARKER_RADIUS)
                    .map(|distance| (distance, marker))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, marker)| marker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Casts from normalized device coordinates (x right, y up, both in
    /// -1..1) through the camera described by `pose`.
    pub fn from_ndc(ndc: Vec2, pose: CameraPose, aspect_ratio: f32) -> Option<Self> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return None;
        }
        if (pose.look_at - pose.position).length_squared() <= f32::EPSILON {
            return None;
        }
        let view = Mat4::look_at_rh(pose.position, pose.look_at, Vec3::Y);
        let projection =
            Mat4::perspective_rh(FOV_DEGREES.to_radians(), aspect_ratio, NEAR_CLIP, FAR_CLIP);
        let inverse = (projection * view).inverse();

        let near = inverse * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        if near.w.abs() <= f32::EPSILON || far.w.abs() <= f32::EPSILON {
            return None;
        }
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        let direction = (far - near).try_normalize()?;
        Some(Self {
            origin: near,
            direction,
        })
    }

    /// Distance along the ray to the first intersection with the sphere.
    pub fn sphere_hit(&self, center: Vec3, radius: f32) -> Option<f32> {
        let offset = self.origin - center;
        let b = offset.dot(self.direction);
        let c = offset.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}

/// Whether markers react to clicks. Locked until the onboarding popup is
/// dismissed; each session starts locked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InteractionGate {
    markers_clickable: bool,
}

impl InteractionGate {
    pub fn locked() -> Self {
        Self::default()
    }

    pub fn markers_clickable(&self) -> bool {
        self.markers_clickable
    }

    /// Returns true the first time the gate opens.
    pub fn open(&mut self) -> bool {
        let opened = !self.markers_clickable;
        self.markers_clickable = true;
        opened
    }

    pub fn reset(&mut self) {
        self.markers_clickable = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ExplorePhase {
    Idle,
    Onboarding,
    Browsing,
    Focusing { marker: u32 },
    Inspecting { marker: u32 },
    Returning,
}

#[derive(Debug, Clone, Copy)]
enum Flight {
    Focus { ticket: Ticket, marker: u32, anchor: Option<Vec2> },
    Return { ticket: Ticket },
}

impl Flight {
    fn ticket(&self) -> Ticket {
        match self {
            Flight::Focus { ticket, .. } | Flight::Return { ticket } => *ticket,
        }
    }
}

/// Drives the exploration page. Shares the popup seam, scene graph and
/// animator with the guided tour.
pub struct ExploreController<S, P> {
    markers: MarkerSet,
    stage: Stage<S, P>,
    animator: CameraAnimator,
    duration: Duration,
    overview_zoom: ZoomLimits,
    focus_zoom: ZoomLimits,
    touch: bool,
    gate: InteractionGate,
    phase: ExplorePhase,
    original_pose: Option<CameraPose>,
    flight: Option<Flight>,
    marker_labels: Vec<DecorationHandle>,
    events: Vec<TourEvent>,
}

impl<S, P> ExploreController<S, P>
where
    S: SceneGraph,
    P: PopupPresenter,
{
    pub fn new(
        markers: MarkerSet,
        stage: Stage<S, P>,
        duration: Duration,
        overview_zoom: ZoomLimits,
        focus_zoom: ZoomLimits,
    ) -> Self {
        Self {
            markers,
            stage,
            animator: CameraAnimator::new(),
            duration,
            overview_zoom,
            focus_zoom,
            touch: false,
            gate: InteractionGate::locked(),
            phase: ExplorePhase::Idle,
            original_pose: None,
            flight: None,
            marker_labels: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_touch_input(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    /// Places the numbered marker labels, locks the controls and shows the
    /// onboarding popup.
    pub fn start(&mut self) -> bool {
        if self.phase != ExplorePhase::Idle {
            return false;
        }
        let original = self.stage.rig.pose();
        self.original_pose = Some(original);
        self.gate.reset();
        self.stage.rig.controls.zoom = self.overview_zoom;
        self.stage.rig.controls.enabled = false;

        for marker in self.markers.iter() {
            let handle = self.stage.scene.add(marker.label());
            self.marker_labels.push(handle);
        }

        self.stage
            .popup
            .show_instructions(&InstructionsView::onboarding(self.touch));
        self.phase = ExplorePhase::Onboarding;
        self.events.push(TourEvent::Started { original });
        self.events.push(TourEvent::OnboardingShown);
        log::info!(
            "[explore] session started with {} markers",
            self.markers.len()
        );
        true
    }

    pub fn dismiss_onboarding(&mut self) -> NavOutcome {
        if self.phase != ExplorePhase::Onboarding {
            let reason = if self.phase == ExplorePhase::Idle {
                IgnoreReason::NotStarted
            } else {
                IgnoreReason::NoPopup
            };
            return self.ignore(NavAction::Dismiss, reason);
        }
        self.stage.popup.clear();
        self.gate.open();
        self.stage.rig.controls.enabled = true;
        self.phase = ExplorePhase::Browsing;
        self.events.push(TourEvent::PopupCleared);
        self.events.push(TourEvent::OnboardingDismissed);
        NavOutcome::Accepted
    }

    /// Handles a click at normalized device coordinates.
    pub fn click(&mut self, ndc: Vec2, aspect_ratio: f32) -> NavOutcome {
        if let Some(reason) = self.blocked() {
            return self.ignore(NavAction::Click, reason);
        }
        let hit = Ray::from_ndc(ndc, self.stage.rig.pose(), aspect_ratio)
            .and_then(|ray| self.markers.pick(&ray))
            .map(|marker| marker.number);
        match hit {
            Some(number) => self.focus_marker(number, Some(ndc)),
            None => {
                self.events.push(TourEvent::ClickMissed);
                NavOutcome::Accepted
            }
        }
    }

    /// Flies to a marker as if it had been clicked.
    pub fn focus(&mut self, number: u32) -> NavOutcome {
        if let Some(reason) = self.blocked() {
            return self.ignore(NavAction::Focus, reason);
        }
        if self.markers.get(number).is_none() {
            return self.ignore(NavAction::Focus, IgnoreReason::UnknownMarker);
        }
        self.focus_marker(number, None)
    }

    /// Closes the marker popup and flies back to the overview.
    pub fn close(&mut self) -> NavOutcome {
        let ExplorePhase::Inspecting { .. } = self.phase else {
            let reason = match self.phase {
                ExplorePhase::Idle => IgnoreReason::NotStarted,
                ExplorePhase::Focusing { .. } | ExplorePhase::Returning => IgnoreReason::Animating,
                _ => IgnoreReason::NoPopup,
            };
            return self.ignore(NavAction::Close, reason);
        };
        let Some(original) = self.original_pose else {
            return self.ignore(NavAction::Close, IgnoreReason::NotStarted);
        };
        self.stage.popup.clear();
        self.events.push(TourEvent::PopupCleared);
        self.stage.rig.controls.zoom = self.overview_zoom;
        let ticket = self
            .animator
            .animate(&mut self.stage.rig, original, self.duration);
        self.flight = Some(Flight::Return { ticket });
        self.phase = ExplorePhase::Returning;
        NavOutcome::Accepted
    }

    pub fn update(&mut self, dt: Duration) {
        let Some(ticket) = self.animator.advance(dt, &mut self.stage.rig) else {
            return;
        };
        let flight = match self.flight {
            Some(flight) if flight.ticket() == ticket => flight,
            _ => {
                self.events.push(TourEvent::StaleCompletion { ticket });
                return;
            }
        };
        self.flight = None;
        self.events.push(TourEvent::AnimationCompleted { ticket });

        match flight {
            Flight::Focus { marker, anchor, .. } => {
                let Some(found) = self.markers.get(marker) else {
                    self.phase = ExplorePhase::Browsing;
                    return;
                };
                let view = MarkerView::new(found, anchor);
                self.stage.popup.show_marker(&view);
                self.stage.rig.controls.zoom = self.focus_zoom;
                self.events.push(TourEvent::MarkerPopupShown {
                    number: marker,
                    title: found.title.clone(),
                });
                self.phase = ExplorePhase::Inspecting { marker };
            }
            Flight::Return { .. } => {
                self.phase = ExplorePhase::Browsing;
                self.events.push(TourEvent::ReturnedToOverview);
            }
        }
    }

    /// Removes the marker labels from the scene.
    pub fn teardown(&mut self) -> usize {
        self.stage.popup.clear();
        MarkerDecorator::retract(&mut self.marker_labels, &mut self.stage.scene)
    }

    pub fn phase(&self) -> ExplorePhase {
        self.phase
    }

    pub fn gate(&self) -> InteractionGate {
        self.gate
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn original_pose(&self) -> Option<CameraPose> {
        self.original_pose
    }

    pub fn stage(&self) -> &Stage<S, P> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage<S, P> {
        &mut self.stage
    }

    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn into_stage(self) -> Stage<S, P> {
        self.stage
    }

    fn blocked(&self) -> Option<IgnoreReason> {
        match self.phase {
            ExplorePhase::Idle => Some(IgnoreReason::NotStarted),
            _ if !self.gate.markers_clickable() => Some(IgnoreReason::MarkersLocked),
            ExplorePhase::Focusing { .. } | ExplorePhase::Returning => {
                Some(IgnoreReason::Animating)
            }
            _ => None,
        }
    }

    fn ignore(&mut self, action: NavAction, reason: IgnoreReason) -> NavOutcome {
        log::debug!("[explore] {action:?} ignored: {reason:?}");
        self.events
            .push(TourEvent::NavigationIgnored { action, reason });
        NavOutcome::Ignored(reason)
    }

    fn focus_marker(&mut self, number: u32, anchor: Option<Vec2>) -> NavOutcome {
        let Some(pose) = self.markers.get(number).map(Marker::focus_pose) else {
            return self.ignore(NavAction::Focus, IgnoreReason::UnknownMarker);
        };
        if matches!(self.phase, ExplorePhase::Inspecting { .. }) {
            self.stage.popup.clear();
            self.events.push(TourEvent::PopupCleared);
        }
        let ticket = self.animator.animate(&mut self.stage.rig, pose, self.duration);
        self.flight = Some(Flight::Focus {
            ticket,
            marker: number,
            anchor,
        });
        self.phase = ExplorePhase::Focusing { marker: number };
        self.events.push(TourEvent::MarkerFocused { number, ticket });
        log::debug!("[explore] focusing marker {number}");
        NavOutcome::Accepted
    }
}
