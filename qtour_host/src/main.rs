mod cli;
mod presenter;
mod scene;
mod script;
mod session;
mod transcript;
mod ui_layout;

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use qtour_core::{
    CameraRig, ExploreController, ExplorePhase, LoadedCatalog, MarkerDecorator, MarkerSet, Stage,
    StepCatalog, TourConfig, TourController, TourPhase, ViewportClass,
};

use crate::cli::{Args, Mode};
use crate::presenter::{FinishBanner, TerminalPresenter};
use crate::scene::RecordingScene;
use crate::script::{Action, default_script, parse_script};
use crate::session::Runner;
use crate::transcript::{Outcome, Transcript, write_json};
use crate::ui_layout::{PopupLayout, WindowSize};

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    ensure!(args.frame_ms > 0, "--frame-ms must be at least 1");
    ensure!(
        args.viewport_width > 0 && args.viewport_height > 0,
        "viewport must be non-empty (got {}x{})",
        args.viewport_width,
        args.viewport_height
    );

    let config = match args.config.as_ref() {
        Some(path) => TourConfig::load(path)
            .with_context(|| format!("loading tour config {}", path.display()))?,
        None => TourConfig::default(),
    };
    let window = WindowSize::new(args.viewport_width, args.viewport_height);
    let viewport = config.viewport_for_width(args.viewport_width);
    log::info!(
        "[host] {} mode, {}x{} window ({} layout)",
        args.mode.name(),
        window.width,
        window.height,
        viewport.name()
    );

    match args.mode {
        Mode::Tour => run_tour(&args, &config, window, viewport),
        Mode::Explore => run_explore(&args, &config, window, viewport),
    }
}

fn script_for(args: &Args, steps: usize) -> Result<Vec<Action>> {
    match args.script.as_deref() {
        Some(script) => parse_script(script),
        None => Ok(default_script(args.mode, steps)),
    }
}

fn run_tour(
    args: &Args,
    config: &TourConfig,
    window: WindowSize,
    viewport: ViewportClass,
) -> Result<()> {
    let (catalog, overrides) = match args.catalog.as_ref() {
        Some(path) => {
            let loaded = LoadedCatalog::load(path)
                .with_context(|| format!("loading step catalog {}", path.display()))?;
            (loaded.steps, loaded.labels)
        }
        None => (StepCatalog::builtin(), BTreeMap::new()),
    };
    let decorator = MarkerDecorator::builtin(viewport).with_overrides(overrides);

    if let Some(path) = args.dump_catalog.as_ref() {
        write_json(path, &catalog.to_document(decorator.layouts()))?;
        println!("Saved step catalog JSON to {}", path.display());
        return Ok(());
    }

    let actions = script_for(args, catalog.len())?;
    let layout = PopupLayout::new(window, viewport).context("building popup layout")?;
    let rig = CameraRig::new(config.tour_initial_pose(viewport), config.tour_zoom);
    let stage = Stage::new(RecordingScene::default(), TerminalPresenter::new(layout), rig);
    let mut tour = TourController::new(
        catalog,
        decorator,
        stage,
        FinishBanner::default(),
        config.animation_duration(),
    );

    tour.start();
    let mut runner = Runner::new(Duration::from_millis(args.frame_ms), window);
    runner.run(&mut tour, &actions).context("running tour script")?;

    let phase = tour.phase();
    println!(
        "Tour {} after {} frames ({} actions ignored)",
        match phase {
            TourPhase::Finished => "finished".to_string(),
            TourPhase::Showing { step } => format!("stopped at step {}", step + 1),
            TourPhase::Animating { from, to } => format!("mid-flight {from}->{to}"),
            TourPhase::Idle => "never started".to_string(),
        },
        runner.frames(),
        runner.ignored()
    );

    if let Some(path) = args.transcript_json.as_ref() {
        let transcript = Transcript {
            mode: args.mode.name(),
            viewport,
            window: [window.width, window.height],
            frame_ms: args.frame_ms,
            frames: runner.frames(),
            ignored_actions: runner.ignored(),
            events: runner.events(),
            popups: tour.stage().popup.shown(),
            scene: tour.stage().scene.summary(),
            camera: tour.stage().rig.pose(),
            outcome: Outcome::Tour {
                phase,
                state: tour.state(),
                finish_prompts: tour.finish_prompt().times_shown(),
            },
        };
        write_json(path, &transcript)?;
        println!("Saved tour transcript JSON to {}", path.display());
    }
    Ok(())
}

fn run_explore(
    args: &Args,
    config: &TourConfig,
    window: WindowSize,
    viewport: ViewportClass,
) -> Result<()> {
    let markers = match args.catalog.as_ref() {
        Some(path) => MarkerSet::load(path)
            .with_context(|| format!("loading marker set {}", path.display()))?,
        None => MarkerSet::builtin(),
    };

    if let Some(path) = args.dump_catalog.as_ref() {
        let json = markers.to_json().context("serializing marker set")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing marker set JSON to {}", path.display()))?;
        println!("Saved marker set JSON to {}", path.display());
        return Ok(());
    }

    let actions = script_for(args, markers.len())?;
    let layout = PopupLayout::new(window, viewport).context("building popup layout")?;
    let rig = CameraRig::new(config.explore_initial_pose(viewport), config.explore_zoom);
    let stage = Stage::new(RecordingScene::default(), TerminalPresenter::new(layout), rig);
    let mut explorer = ExploreController::new(
        markers,
        stage,
        config.animation_duration(),
        config.explore_zoom,
        config.focus_zoom,
    )
    .with_touch_input(args.touch);

    explorer.start();
    let mut runner = Runner::new(Duration::from_millis(args.frame_ms), window);
    runner
        .run(&mut explorer, &actions)
        .context("running explore script")?;

    let phase = explorer.phase();
    println!(
        "Explore session {} after {} frames ({} actions ignored)",
        match phase {
            ExplorePhase::Inspecting { marker } => format!("inspecting marker {marker}"),
            ExplorePhase::Focusing { marker } => format!("flying to marker {marker}"),
            ExplorePhase::Onboarding => "still onboarding".to_string(),
            ExplorePhase::Browsing => "browsing".to_string(),
            ExplorePhase::Returning => "returning to overview".to_string(),
            ExplorePhase::Idle => "never started".to_string(),
        },
        runner.frames(),
        runner.ignored()
    );

    if let Some(path) = args.transcript_json.as_ref() {
        let transcript = Transcript {
            mode: args.mode.name(),
            viewport,
            window: [window.width, window.height],
            frame_ms: args.frame_ms,
            frames: runner.frames(),
            ignored_actions: runner.ignored(),
            events: runner.events(),
            popups: explorer.stage().popup.shown(),
            scene: explorer.stage().scene.summary(),
            camera: explorer.stage().rig.pose(),
            outcome: Outcome::Explore {
                phase,
                gate: explorer.gate(),
            },
        };
        write_json(path, &transcript)?;
        println!("Saved explore transcript JSON to {}", path.display());
    }
    Ok(())
}
