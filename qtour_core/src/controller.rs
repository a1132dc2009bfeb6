//! The guided tour state machine.
//!
//! ```text
//! Idle --start--> Showing(0) --next--> Animating(0->1) --landed--> Showing(1) ...
//!                 Showing(i) --back--> Animating(i->i-1) --landed--> Showing(i-1)
//!                 Showing(N-1) --next--> Animating(N-1->N) --landed--> Finished
//! ```
//!
//! A transition retracts the current step's labels and clears its popup
//! before the camera leaves, and the next popup only appears once the flight
//! carrying the controller there has landed. Requests that arrive mid-flight
//! are dropped.

use std::time::Duration;

use serde::Serialize;

use crate::animator::{CameraAnimator, Ticket};
use crate::catalog::{Step, StepCatalog};
use crate::decorations::{DecorationHandle, MarkerDecorator, SceneGraph};
use crate::events::{IgnoreReason, NavAction, TourEvent};
use crate::pose::{CameraPose, CameraRig};
use crate::presenter::{FinishPrompt, NavButtons, PopupPresenter, StepView};

/// The collaborators a controller drives: scene graph, popup layer and the
/// camera rig.
#[derive(Debug)]
pub struct Stage<S, P> {
    pub scene: S,
    pub popup: P,
    pub rig: CameraRig,
}

impl<S, P> Stage<S, P> {
    pub fn new(scene: S, popup: P, rig: CameraRig) -> Self {
        Self { scene, popup, rig }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TourPhase {
    Idle,
    Showing { step: usize },
    Animating { from: usize, to: usize },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Accepted,
    Ignored(IgnoreReason),
}

impl NavOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, NavOutcome::Accepted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourState {
    pub current_step_index: usize,
    pub is_animating: bool,
    pub active_decorations: Vec<DecorationHandle>,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    ticket: Ticket,
    from: usize,
    to: usize,
}

pub struct TourController<S, P, F> {
    catalog: StepCatalog,
    decorator: MarkerDecorator,
    stage: Stage<S, P>,
    finish: F,
    animator: CameraAnimator,
    duration: Duration,
    state: TourState,
    started: bool,
    finished: bool,
    original_pose: Option<CameraPose>,
    pending: Option<Transition>,
    events: Vec<TourEvent>,
}

impl<S, P, F> TourController<S, P, F>
where
    S: SceneGraph,
    P: PopupPresenter,
    F: FinishPrompt,
{
    pub fn new(
        catalog: StepCatalog,
        decorator: MarkerDecorator,
        stage: Stage<S, P>,
        finish: F,
        duration: Duration,
    ) -> Self {
        Self {
            catalog,
            decorator,
            stage,
            finish,
            animator: CameraAnimator::new(),
            duration,
            state: TourState::default(),
            started: false,
            finished: false,
            original_pose: None,
            pending: None,
            events: Vec::new(),
        }
    }

    /// Captures the original pose and shows the first step. Returns false if
    /// the tour was already started.
    pub fn start(&mut self) -> bool {
        if self.started {
            log::debug!("[tour] start ignored; session already running");
            return false;
        }
        self.started = true;
        let original = self.stage.rig.pose();
        self.original_pose = Some(original);
        self.events.push(TourEvent::Started { original });
        log::info!("[tour] session started with {} steps", self.catalog.len());

        if self.catalog.is_empty() {
            self.finish();
        } else {
            self.enter_step(0);
        }
        true
    }

    pub fn next(&mut self) -> NavOutcome {
        if let Some(reason) = self.blocked() {
            return self.ignore(NavAction::Next, reason);
        }
        let from = self.state.current_step_index;
        let Some(destination) = self.catalog.get(from).map(|step| step.destination) else {
            return self.ignore(NavAction::Next, IgnoreReason::Finished);
        };
        self.leave_step(from);
        self.begin_transition(from, from + 1, destination);
        NavOutcome::Accepted
    }

    pub fn back(&mut self) -> NavOutcome {
        if let Some(reason) = self.blocked() {
            return self.ignore(NavAction::Back, reason);
        }
        let from = self.state.current_step_index;
        if from == 0 {
            return self.ignore(NavAction::Back, IgnoreReason::AtFirstStep);
        }
        let Some(destination) = self.back_target(from) else {
            return self.ignore(NavAction::Back, IgnoreReason::NotStarted);
        };
        self.leave_step(from);
        self.begin_transition(from, from - 1, destination);
        NavOutcome::Accepted
    }

    /// Advances the in-flight animation by one frame.
    pub fn update(&mut self, dt: Duration) {
        if let Some(ticket) = self.animator.advance(dt, &mut self.stage.rig) {
            self.complete(ticket);
        }
    }

    pub fn phase(&self) -> TourPhase {
        if !self.started {
            TourPhase::Idle
        } else if self.finished {
            TourPhase::Finished
        } else if let Some(transition) = self.pending {
            TourPhase::Animating {
                from: transition.from,
                to: transition.to,
            }
        } else {
            TourPhase::Showing {
                step: self.state.current_step_index,
            }
        }
    }

    pub fn state(&self) -> &TourState {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_step(&self) -> Option<&Step> {
        match self.phase() {
            TourPhase::Showing { step } => self.catalog.get(step),
            _ => None,
        }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn original_pose(&self) -> Option<CameraPose> {
        self.original_pose
    }

    pub fn pending_pose(&self) -> Option<CameraPose> {
        self.animator.pending_pose()
    }

    pub fn stage(&self) -> &Stage<S, P> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage<S, P> {
        &mut self.stage
    }

    pub fn finish_prompt(&self) -> &F {
        &self.finish
    }

    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn into_parts(self) -> (Stage<S, P>, F) {
        (self.stage, self.finish)
    }

    fn blocked(&self) -> Option<IgnoreReason> {
        if !self.started {
            Some(IgnoreReason::NotStarted)
        } else if self.finished {
            Some(IgnoreReason::Finished)
        } else if self.state.is_animating {
            Some(IgnoreReason::Animating)
        } else {
            None
        }
    }

    fn ignore(&mut self, action: NavAction, reason: IgnoreReason) -> NavOutcome {
        log::debug!("[tour] {action:?} ignored: {reason:?}");
        self.events
            .push(TourEvent::NavigationIgnored { action, reason });
        NavOutcome::Ignored(reason)
    }

    /// Showing step `from`, the camera sits where step `from - 1` sent it, so
    /// going back means returning to where step `from - 2` sent it (or the
    /// original pose when there is no such step).
    fn back_target(&self, from: usize) -> Option<CameraPose> {
        if from >= 2 {
            self.catalog.get(from - 2).map(|step| step.destination)
        } else {
            self.original_pose
        }
    }

    fn begin_transition(&mut self, from: usize, to: usize, destination: CameraPose) {
        let ticket = self
            .animator
            .animate(&mut self.stage.rig, destination, self.duration);
        self.pending = Some(Transition { ticket, from, to });
        self.state.is_animating = true;
        log::debug!("[tour] flight {} from step {from} to {to}", ticket.id());
        self.events.push(TourEvent::AnimationStarted {
            ticket,
            from_step: from,
            to_step: to,
            destination,
        });
    }

    fn complete(&mut self, ticket: Ticket) {
        let transition = match self.pending {
            Some(transition) if transition.ticket == ticket => transition,
            _ => {
                log::debug!("[tour] dropping stale completion {}", ticket.id());
                self.events.push(TourEvent::StaleCompletion { ticket });
                return;
            }
        };
        self.pending = None;
        self.state.is_animating = false;
        self.events.push(TourEvent::AnimationCompleted { ticket });

        if transition.to >= self.catalog.len() {
            self.finish();
        } else {
            self.enter_step(transition.to);
        }
    }

    fn enter_step(&mut self, index: usize) {
        self.teardown(index);
        let Some(step) = self.catalog.get(index) else {
            self.finish();
            return;
        };
        self.state.current_step_index = index;

        let view = StepView::new(index, self.catalog.len(), step);
        let buttons = NavButtons::for_step(index, self.catalog.len());
        self.stage.popup.show_step(&view, buttons);
        self.events.push(TourEvent::PopupShown {
            step: index,
            title: step.title.clone(),
        });

        let kind = step.decoration;
        self.state.active_decorations = self.decorator.apply(kind, &mut self.stage.scene);
        let count = self.state.active_decorations.len();
        if count > 0 {
            self.events.push(TourEvent::LabelsApplied {
                step: index,
                kind,
                count,
            });
        }
        log::debug!("[tour] showing step {index} ({})", step.title);
    }

    fn leave_step(&mut self, index: usize) {
        self.teardown(index);
    }

    /// Retracts labels and clears the popup. Safe to call repeatedly.
    fn teardown(&mut self, index: usize) {
        let retracted =
            MarkerDecorator::retract(&mut self.state.active_decorations, &mut self.stage.scene);
        if retracted > 0 {
            self.events.push(TourEvent::LabelsRetracted {
                step: index,
                count: retracted,
            });
        }
        self.stage.popup.clear();
        self.events.push(TourEvent::PopupCleared);
    }

    fn finish(&mut self) {
        let last = self.state.current_step_index;
        self.teardown(last);
        self.state.current_step_index = self.catalog.len();
        self.finished = true;
        self.finish.show_finished();
        self.events.push(TourEvent::Finished);
        log::info!("[tour] finished after {} steps", self.catalog.len());
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::config::ViewportClass;
    use crate::decorations::tests::TestScene;
    use crate::decorations::DecorationKind;
    use crate::pose::ZoomLimits;
    use crate::presenter::tests::{Shown, TestFinish, TestPopup};
    use crate::presenter::NextLabel;

    const FRAME: Duration = Duration::from_millis(16);
    const FLIGHT: Duration = Duration::from_millis(200);

    type Controller = TourController<TestScene, TestPopup, TestFinish>;

    fn origin() -> CameraPose {
        CameraPose::new(Vec3::new(2.0, 0.2, -3.0), Vec3::new(0.0, 0.0, -3.0))
    }

    fn abc_catalog() -> StepCatalog {
        StepCatalog::new(vec![
            Step::new("A", "a", Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, DecorationKind::QubitLabels),
            Step::new("B", "b", Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, DecorationKind::None),
            Step::new("C", "c", Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, DecorationKind::GateLabels),
        ])
        .expect("catalog")
    }

    fn controller(catalog: StepCatalog) -> Controller {
        let stage = Stage::new(
            TestScene::default(),
            TestPopup::default(),
            CameraRig::new(origin(), ZoomLimits::new(0.06, 4.0)),
        );
        TourController::new(
            catalog,
            MarkerDecorator::builtin(ViewportClass::Wide),
            stage,
            TestFinish::default(),
            FLIGHT,
        )
    }

    fn settle(controller: &mut Controller) {
        for _ in 0..1000 {
            if !controller.is_animating() {
                return;
            }
            controller.update(FRAME);
        }
        panic!("flight never landed");
    }

    fn visible_title(controller: &Controller) -> Option<String> {
        match &controller.stage().popup.visible {
            Some(Shown::Step(title, _)) => Some(title.clone()),
            _ => None,
        }
    }

    #[test]
    fn walks_abc_scenario_to_finish() {
        let mut tour = controller(abc_catalog());
        assert_eq!(tour.phase(), TourPhase::Idle);
        assert!(tour.start());
        assert_eq!(tour.phase(), TourPhase::Showing { step: 0 });
        assert_eq!(visible_title(&tour).as_deref(), Some("A"));

        assert!(tour.next().is_accepted());
        assert_eq!(tour.phase(), TourPhase::Animating { from: 0, to: 1 });
        assert!(tour.stage().popup.visible.is_none());
        settle(&mut tour);
        assert_eq!(visible_title(&tour).as_deref(), Some("B"));

        assert!(tour.next().is_accepted());
        settle(&mut tour);
        assert_eq!(tour.phase(), TourPhase::Showing { step: 2 });
        assert_eq!(
            tour.stage().popup.visible,
            Some(Shown::Step(
                "C".to_string(),
                NavButtons {
                    back: true,
                    next: NextLabel::Finish
                }
            ))
        );

        assert!(tour.next().is_accepted());
        settle(&mut tour);
        assert_eq!(tour.phase(), TourPhase::Finished);
        assert_eq!(tour.state().current_step_index, 3);
        assert_eq!(tour.finish_prompt().shown, 1);
        assert!(tour.stage().popup.visible.is_none());
        assert_eq!(tour.stage().popup.titles(), vec!["A", "B", "C"]);
        assert_eq!(tour.stage().rig.pose(), tour.catalog().get(2).map(|s| s.destination).expect("C"));

        assert_eq!(tour.next(), NavOutcome::Ignored(IgnoreReason::Finished));
        assert_eq!(tour.back(), NavOutcome::Ignored(IgnoreReason::Finished));
        assert_eq!(tour.finish_prompt().shown, 1);
    }

    #[test]
    fn back_from_last_step_flies_to_first_destination() {
        let mut tour = controller(abc_catalog());
        tour.start();
        tour.next();
        settle(&mut tour);
        tour.next();
        settle(&mut tour);

        assert!(tour.back().is_accepted());
        let step_zero = tour.catalog().get(0).map(|s| s.destination);
        assert_eq!(tour.pending_pose(), step_zero);
        settle(&mut tour);
        assert_eq!(tour.phase(), TourPhase::Showing { step: 1 });
        assert_eq!(visible_title(&tour).as_deref(), Some("B"));
        assert_eq!(Some(tour.stage().rig.pose()), step_zero);
    }

    #[test]
    fn back_then_next_returns_to_same_step() {
        let catalog = StepCatalog::builtin();
        let total = catalog.len();
        for i in 1..total {
            let mut tour = controller(catalog.clone());
            tour.start();
            for _ in 0..i {
                tour.next();
                settle(&mut tour);
            }
            assert_eq!(tour.phase(), TourPhase::Showing { step: i });

            tour.back();
            let target = tour.pending_pose().expect("back flight");
            if i == 1 {
                assert_eq!(Some(target), tour.original_pose());
            } else {
                assert_eq!(Some(target), tour.catalog().get(i - 2).map(|s| s.destination));
            }
            settle(&mut tour);
            assert_eq!(tour.phase(), TourPhase::Showing { step: i - 1 });

            tour.next();
            settle(&mut tour);
            assert_eq!(tour.phase(), TourPhase::Showing { step: i });
        }
    }

    #[test]
    fn next_n_times_finishes_exactly_once() {
        for n in 0..6 {
            let steps = (0..n)
                .map(|i| {
                    Step::new(
                        &format!("step {i}"),
                        "",
                        Vec3::new(i as f32, 1.0, 0.0),
                        Vec3::ZERO,
                        DecorationKind::None,
                    )
                })
                .collect();
            let mut tour = controller(StepCatalog::new(steps).expect("catalog"));
            tour.start();
            for _ in 0..n {
                assert!(tour.next().is_accepted());
                settle(&mut tour);
            }
            assert_eq!(tour.phase(), TourPhase::Finished, "n = {n}");
            assert_eq!(tour.finish_prompt().shown, 1);
            assert_eq!(tour.stage().popup.titles().len(), n);
        }
    }

    #[test]
    fn rapid_next_advances_once() {
        let mut tour = controller(abc_catalog());
        tour.start();
        assert!(tour.next().is_accepted());
        assert_eq!(tour.next(), NavOutcome::Ignored(IgnoreReason::Animating));
        assert_eq!(tour.back(), NavOutcome::Ignored(IgnoreReason::Animating));
        settle(&mut tour);
        assert_eq!(tour.phase(), TourPhase::Showing { step: 1 });

        let ignored = tour
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, TourEvent::NavigationIgnored { .. }))
            .count();
        assert_eq!(ignored, 2);
    }

    #[test]
    fn back_is_not_offered_on_first_step() {
        let mut tour = controller(abc_catalog());
        assert_eq!(tour.back(), NavOutcome::Ignored(IgnoreReason::NotStarted));
        tour.start();
        assert_eq!(tour.back(), NavOutcome::Ignored(IgnoreReason::AtFirstStep));
        assert_eq!(tour.phase(), TourPhase::Showing { step: 0 });
        assert!(matches!(
            tour.stage().popup.visible,
            Some(Shown::Step(_, NavButtons { back: false, .. }))
        ));
    }

    #[test]
    fn labels_are_gone_before_the_next_step_shows() {
        let mut tour = controller(StepCatalog::builtin());
        tour.start();
        for _ in 0..tour.catalog().len() {
            let live_before = tour.stage().scene.live.len();
            assert_eq!(live_before, tour.state().active_decorations.len());
            tour.next();
            assert!(tour.stage().scene.live.is_empty());
            assert!(tour.state().active_decorations.is_empty());
            settle(&mut tour);
        }

        // walk back from the entanglement step through the gate labels
        let mut tour = controller(StepCatalog::builtin());
        tour.start();
        for _ in 0..4 {
            tour.next();
            settle(&mut tour);
        }
        assert_eq!(tour.stage().scene.live.len(), 2);
        tour.back();
        assert!(tour.stage().scene.live.is_empty());
        settle(&mut tour);
        assert_eq!(tour.stage().scene.live.len(), 4);
    }

    #[test]
    fn controls_locked_only_while_flying() {
        let mut tour = controller(abc_catalog());
        tour.start();
        assert!(tour.stage().rig.controls.enabled);
        tour.next();
        assert!(!tour.stage().rig.controls.enabled);
        assert!(!tour.stage_mut().rig.orbit(0.3, 0.0));
        settle(&mut tour);
        assert!(tour.stage().rig.controls.enabled);
    }

    #[test]
    fn empty_catalog_finishes_on_start() {
        let mut tour = controller(StepCatalog::default());
        tour.start();
        assert_eq!(tour.phase(), TourPhase::Finished);
        assert_eq!(tour.finish_prompt().shown, 1);
        assert!(tour.stage().popup.titles().is_empty());
        assert!(!tour.start());
    }

    #[test]
    fn start_captures_original_pose_once() {
        let mut tour = controller(abc_catalog());
        tour.start();
        assert_eq!(tour.original_pose(), Some(origin()));
        tour.next();
        settle(&mut tour);
        assert!(!tour.start());
        assert_eq!(tour.original_pose(), Some(origin()));
    }
}
