use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    about = "Headless host that plays the quantum processor tour against a recording scene",
    version
)]
pub struct Args {
    /// Which page to drive: the guided tour or free exploration
    #[arg(long, value_enum, default_value_t = Mode::Tour)]
    pub mode: Mode,

    /// Step catalog JSON (tour) or marker set JSON (explore); defaults to the built-in data
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Optional TourConfig JSON (viewport, animation duration, zoom limits, initial camera)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Simulated window width in pixels; widths above 768 use the wide layout
    #[arg(long, default_value_t = 1280)]
    pub viewport_width: u32,

    /// Simulated window height in pixels
    #[arg(long, default_value_t = 720)]
    pub viewport_height: u32,

    /// Comma-separated user actions (next, back, settle, tick:N, dismiss, click:X:Y, focus:N, close, orbit:YAW:PITCH, zoom:F)
    #[arg(long)]
    pub script: Option<String>,

    /// Fixed frame timestep in milliseconds
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u64,

    /// Use touch wording in the onboarding instructions
    #[arg(long)]
    pub touch: bool,

    /// Path to write the event transcript and final state as JSON
    #[arg(long)]
    pub transcript_json: Option<PathBuf>,

    /// Write the active catalog (or marker set) as JSON and exit
    #[arg(long)]
    pub dump_catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Tour,
    Explore,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Tour => "tour",
            Mode::Explore => "explore",
        }
    }
}
