use serde::Serialize;

use crate::animator::Ticket;
use crate::decorations::DecorationKind;
use crate::pose::CameraPose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    Next,
    Back,
    Click,
    Focus,
    Close,
    Dismiss,
}

/// Why a request was dropped instead of acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NotStarted,
    Animating,
    AtFirstStep,
    Finished,
    MarkersLocked,
    NoPopup,
    UnknownMarker,
}

/// Observable transitions, in the order they happened. Controllers queue
/// these and the host drains them once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TourEvent {
    Started {
        original: CameraPose,
    },
    PopupShown {
        step: usize,
        title: String,
    },
    PopupCleared,
    LabelsApplied {
        step: usize,
        kind: DecorationKind,
        count: usize,
    },
    LabelsRetracted {
        step: usize,
        count: usize,
    },
    AnimationStarted {
        ticket: Ticket,
        from_step: usize,
        to_step: usize,
        destination: CameraPose,
    },
    AnimationCompleted {
        ticket: Ticket,
    },
    StaleCompletion {
        ticket: Ticket,
    },
    NavigationIgnored {
        action: NavAction,
        reason: IgnoreReason,
    },
    Finished,
    OnboardingShown,
    OnboardingDismissed,
    MarkerFocused {
        number: u32,
        ticket: Ticket,
    },
    MarkerPopupShown {
        number: u32,
        title: String,
    },
    ClickMissed,
    ReturnedToOverview,
}
