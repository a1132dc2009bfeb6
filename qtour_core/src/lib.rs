//! Sequencing core for the quantum processor guided tour.
//!
//! The crate owns the step catalog, the camera animator, the marker label
//! decorator and the two controllers (guided tour and free exploration).
//! Rendering, popups and the finish screen are reached through the traits in
//! [`presenter`] and [`decorations::SceneGraph`], so a browser page, a native
//! viewer or the headless host can all drive the same state machine.

pub mod animator;
pub mod annotation;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod decorations;
pub mod error;
pub mod events;
pub mod explore;
pub mod pose;
pub mod presenter;

pub use animator::{CameraAnimator, Easing, Ticket, Tween};
pub use catalog::{LoadedCatalog, Step, StepCatalog};
pub use config::{TourConfig, ViewportClass};
pub use controller::{NavOutcome, Stage, TourController, TourPhase, TourState};
pub use decorations::{DecorationHandle, DecorationKind, LabelSprite, MarkerDecorator, SceneGraph};
pub use error::{Result, TourError};
pub use events::{IgnoreReason, NavAction, TourEvent};
pub use explore::{ExploreController, ExplorePhase, InteractionGate, Marker, MarkerSet, Ray};
pub use pose::{CameraPose, CameraRig, OrbitControls, ZoomLimits};
pub use presenter::{FinishPrompt, NavButtons, PopupPresenter};
