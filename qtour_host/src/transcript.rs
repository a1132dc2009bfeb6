use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use qtour_core::{CameraPose, ExplorePhase, InteractionGate, TourPhase, TourState, ViewportClass};
use serde::Serialize;

use crate::presenter::PopupRecord;
use crate::scene::SceneSummary;
use crate::session::FrameEvent;

#[derive(Debug, Serialize)]
pub struct Transcript<'a> {
    pub mode: &'static str,
    pub viewport: ViewportClass,
    pub window: [u32; 2],
    pub frame_ms: u64,
    pub frames: u64,
    pub ignored_actions: usize,
    pub events: &'a [FrameEvent],
    pub popups: &'a [PopupRecord],
    pub scene: SceneSummary,
    pub camera: CameraPose,
    pub outcome: Outcome<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<'a> {
    Tour {
        phase: TourPhase,
        state: &'a TourState,
        finish_prompts: usize,
    },
    Explore {
        phase: ExplorePhase,
        gate: InteractionGate,
    },
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing JSON output")?;
    fs::write(path, json).with_context(|| format!("writing JSON to {}", path.display()))
}
