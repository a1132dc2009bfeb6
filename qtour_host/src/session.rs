//! Fixed-timestep frame loop that feeds scripted actions into a controller.

use std::time::Duration;

use anyhow::{Result, bail, ensure};
use qtour_core::{
    CameraRig, ExploreController, FinishPrompt, NavOutcome, PopupPresenter, SceneGraph,
    TourController, TourEvent,
};
use serde::Serialize;

use crate::cli::Mode;
use crate::script::Action;
use crate::ui_layout::WindowSize;

/// Upper bound on frames a single `settle` may step.
pub const MAX_SETTLE_FRAMES: u64 = 100_000;

/// What the frame loop needs from a controller.
pub trait Driver {
    fn mode(&self) -> Mode;
    fn perform(&mut self, action: Action, window: WindowSize) -> Result<NavOutcome>;
    fn update(&mut self, dt: Duration);
    fn is_animating(&self) -> bool;
    fn rig_mut(&mut self) -> &mut CameraRig;
    fn drain_events(&mut self) -> Vec<TourEvent>;
}

impl<S, P, F> Driver for TourController<S, P, F>
where
    S: SceneGraph,
    P: PopupPresenter,
    F: FinishPrompt,
{
    fn mode(&self) -> Mode {
        Mode::Tour
    }

    fn perform(&mut self, action: Action, _window: WindowSize) -> Result<NavOutcome> {
        match action {
            Action::Next => Ok(self.next()),
            Action::Back => Ok(self.back()),
            other => bail!("{other} is not a tour action"),
        }
    }

    fn update(&mut self, dt: Duration) {
        TourController::update(self, dt);
    }

    fn is_animating(&self) -> bool {
        TourController::is_animating(self)
    }

    fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.stage_mut().rig
    }

    fn drain_events(&mut self) -> Vec<TourEvent> {
        TourController::drain_events(self)
    }
}

impl<S, P> Driver for ExploreController<S, P>
where
    S: SceneGraph,
    P: PopupPresenter,
{
    fn mode(&self) -> Mode {
        Mode::Explore
    }

    fn perform(&mut self, action: Action, window: WindowSize) -> Result<NavOutcome> {
        match action {
            Action::Dismiss => Ok(self.dismiss_onboarding()),
            Action::Click(ndc) => Ok(self.click(ndc, window.aspect_ratio())),
            Action::Focus(number) => Ok(self.focus(number)),
            Action::Close => Ok(self.close()),
            other => bail!("{other} is not an explore action"),
        }
    }

    fn update(&mut self, dt: Duration) {
        ExploreController::update(self, dt);
    }

    fn is_animating(&self) -> bool {
        ExploreController::is_animating(self)
    }

    fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.stage_mut().rig
    }

    fn drain_events(&mut self) -> Vec<TourEvent> {
        ExploreController::drain_events(self)
    }
}

/// An event stamped with the frame it was drained on.
#[derive(Debug, Clone, Serialize)]
pub struct FrameEvent {
    pub frame: u64,
    #[serde(flatten)]
    pub event: TourEvent,
}

pub struct Runner {
    frame: Duration,
    window: WindowSize,
    frames: u64,
    events: Vec<FrameEvent>,
    ignored: usize,
}

impl Runner {
    pub fn new(frame: Duration, window: WindowSize) -> Self {
        Self {
            frame,
            window,
            frames: 0,
            events: Vec::new(),
            ignored: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn events(&self) -> &[FrameEvent] {
        &self.events
    }

    pub fn ignored(&self) -> usize {
        self.ignored
    }

    /// Runs every action in order, then lets any last flight land.
    pub fn run<D: Driver>(&mut self, driver: &mut D, actions: &[Action]) -> Result<()> {
        self.collect(driver);
        for action in actions {
            ensure!(
                action.valid_in(driver.mode()),
                "{action} is not available in {} mode",
                driver.mode().name()
            );
            self.perform(driver, *action)?;
        }
        self.settle(driver)
    }

    fn perform<D: Driver>(&mut self, driver: &mut D, action: Action) -> Result<()> {
        match action {
            Action::Settle => self.settle(driver)?,
            Action::Tick(frames) => {
                for _ in 0..frames {
                    self.step(driver);
                }
            }
            Action::Orbit {
                yaw_degrees,
                pitch_degrees,
            } => {
                let moved = driver
                    .rig_mut()
                    .orbit(yaw_degrees.to_radians(), pitch_degrees.to_radians());
                if !moved {
                    log::debug!("[host] {action} dropped; controls locked");
                }
            }
            Action::Zoom(factor) => {
                if !driver.rig_mut().zoom_by(factor) {
                    log::debug!("[host] {action} dropped; controls locked");
                }
            }
            _ => {
                if let NavOutcome::Ignored(reason) = driver.perform(action, self.window)? {
                    self.ignored += 1;
                    log::info!("[host] {action} ignored ({reason:?})");
                }
                self.collect(driver);
            }
        }
        Ok(())
    }

    fn step<D: Driver>(&mut self, driver: &mut D) {
        driver.update(self.frame);
        self.frames += 1;
        self.collect(driver);
    }

    fn settle<D: Driver>(&mut self, driver: &mut D) -> Result<()> {
        let mut stepped = 0;
        while driver.is_animating() {
            ensure!(
                stepped < MAX_SETTLE_FRAMES,
                "camera flight did not land within {MAX_SETTLE_FRAMES} frames"
            );
            self.step(driver);
            stepped += 1;
        }
        Ok(())
    }

    fn collect<D: Driver>(&mut self, driver: &mut D) {
        let frame = self.frames;
        self.events.extend(
            driver
                .drain_events()
                .into_iter()
                .map(|event| FrameEvent { frame, event }),
        );
    }
}

#[cfg(test)]
mod tests {
    use qtour_core::{
        CameraPose, MarkerDecorator, Stage, StepCatalog, TourPhase, ViewportClass, ZoomLimits,
    };

    use super::*;
    use crate::presenter::{FinishBanner, TerminalPresenter};
    use crate::scene::RecordingScene;
    use crate::script::parse_script;
    use crate::ui_layout::PopupLayout;

    const WINDOW: WindowSize = WindowSize {
        width: 1280,
        height: 720,
    };

    fn tour() -> TourController<RecordingScene, TerminalPresenter, FinishBanner> {
        let layout = PopupLayout::new(WINDOW, ViewportClass::Wide).expect("layout");
        let rig = CameraRig::new(
            CameraPose::new(glam::Vec3::new(2.0, 0.2, -3.0), glam::Vec3::new(0.0, 0.0, -3.0)),
            ZoomLimits::new(0.06, 4.0),
        );
        let mut tour = TourController::new(
            StepCatalog::builtin(),
            MarkerDecorator::builtin(ViewportClass::Wide),
            Stage::new(RecordingScene::default(), TerminalPresenter::new(layout), rig),
            FinishBanner::default(),
            Duration::from_millis(100),
        );
        tour.start();
        tour
    }

    #[test]
    fn rapid_next_is_counted_as_ignored() {
        let mut tour = tour();
        let mut runner = Runner::new(Duration::from_millis(16), WINDOW);
        let actions = parse_script("next,next,settle").expect("script");
        runner.run(&mut tour, &actions).expect("run");
        assert_eq!(runner.ignored(), 1);
        assert_eq!(tour.phase(), TourPhase::Showing { step: 1 });
        assert!(runner.frames() >= 7);
    }

    #[test]
    fn explore_actions_are_refused_in_tour_mode() {
        let mut tour = tour();
        let mut runner = Runner::new(Duration::from_millis(16), WINDOW);
        let actions = parse_script("dismiss").expect("script");
        assert!(runner.run(&mut tour, &actions).is_err());
    }

    #[test]
    fn orbit_is_dropped_mid_flight() {
        let mut tour = tour();
        let mut runner = Runner::new(Duration::from_millis(16), WINDOW);
        let actions = parse_script("next,tick:1,orbit:30:0,settle").expect("script");
        runner.run(&mut tour, &actions).expect("run");
        assert_eq!(tour.phase(), TourPhase::Showing { step: 1 });
        let landed = tour.catalog().get(0).map(|step| step.destination.position);
        assert_eq!(Some(tour.stage().rig.position), landed);

        let actions = parse_script("orbit:30:0").expect("script");
        runner.run(&mut tour, &actions).expect("run");
        assert_ne!(Some(tour.stage().rig.position), landed);
    }

    #[test]
    fn events_are_stamped_with_frames() {
        let mut tour = tour();
        let mut runner = Runner::new(Duration::from_millis(50), WINDOW);
        runner
            .run(&mut tour, &parse_script("next").expect("script"))
            .expect("run");
        let started = runner
            .events()
            .iter()
            .find(|stamped| matches!(stamped.event, TourEvent::AnimationStarted { .. }))
            .expect("flight started");
        assert_eq!(started.frame, 0);
        let landed = runner
            .events()
            .iter()
            .find(|stamped| matches!(stamped.event, TourEvent::AnimationCompleted { .. }))
            .expect("flight landed");
        assert_eq!(landed.frame, 2);
    }
}
