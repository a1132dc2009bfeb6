//! Seams to the popup layer and the finish screen.

use glam::Vec2;
use serde::Serialize;

use crate::annotation::{self, Bullet};
use crate::catalog::Step;
use crate::explore::Marker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextLabel {
    Next,
    Finish,
}

impl NextLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            NextLabel::Next => "Next",
            NextLabel::Finish => "Finish",
        }
    }
}

/// Buttons a step popup offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavButtons {
    pub back: bool,
    pub next: NextLabel,
}

impl NavButtons {
    pub fn for_step(index: usize, total: usize) -> Self {
        Self {
            back: index > 0,
            next: if index + 1 >= total {
                NextLabel::Finish
            } else {
                NextLabel::Next
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub bullets: Vec<Bullet>,
}

impl StepView {
    pub fn new(index: usize, total: usize, step: &Step) -> Self {
        Self {
            index,
            total,
            title: step.title.clone(),
            bullets: annotation::bullets(&step.annotation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub number: u32,
    pub title: String,
    pub bullets: Vec<Bullet>,
    /// Normalized device coordinates of the click that opened the popup.
    pub anchor: Option<Vec2>,
}

impl MarkerView {
    pub fn new(marker: &Marker, anchor: Option<Vec2>) -> Self {
        Self {
            number: marker.number,
            title: marker.title.clone(),
            bullets: annotation::bullets(&marker.annotation),
            anchor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionsView {
    pub title: String,
    pub lines: Vec<String>,
}

impl InstructionsView {
    pub fn onboarding(touch: bool) -> Self {
        let (interact, rotate, zoom) = if touch {
            ("Tap", "Drag with one finger", "Pinch to zoom")
        } else {
            ("Click", "Use the mouse", "Scroll to zoom")
        };
        Self {
            title: "Welcome to the AR Quantum Tool!".to_string(),
            lines: vec![
                format!("{interact} on markers to view annotations."),
                format!("{rotate} to rotate the model."),
                format!("{zoom} in and out."),
                format!("{interact} the ✖ to close this popup and enable controls."),
            ],
        }
    }
}

/// The on-screen dialog. Showing any popup replaces the previous one.
pub trait PopupPresenter {
    fn show_step(&mut self, view: &StepView, buttons: NavButtons);
    fn show_marker(&mut self, view: &MarkerView);
    fn show_instructions(&mut self, view: &InstructionsView);
    fn clear(&mut self);
}

/// Invoked once when the guided tour runs out of steps.
pub trait FinishPrompt {
    fn show_finished(&mut self);
}
