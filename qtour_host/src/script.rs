//! Parses the `--script` action list fed to the controllers between frames.

use std::fmt;

use anyhow::{Context, Result, bail, ensure};
use glam::Vec2;

use crate::cli::Mode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Next,
    Back,
    /// Step frames until no flight is in progress.
    Settle,
    Tick(u32),
    Dismiss,
    Click(Vec2),
    Focus(u32),
    Close,
    Orbit { yaw_degrees: f32, pitch_degrees: f32 },
    Zoom(f32),
}

impl Action {
    /// Modes the action means something in. Frame and camera actions work in both.
    pub fn valid_in(&self, mode: Mode) -> bool {
        match self {
            Action::Next | Action::Back => mode == Mode::Tour,
            Action::Dismiss | Action::Click(_) | Action::Focus(_) | Action::Close => {
                mode == Mode::Explore
            }
            Action::Settle | Action::Tick(_) | Action::Orbit { .. } | Action::Zoom(_) => true,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Next => write!(f, "next"),
            Action::Back => write!(f, "back"),
            Action::Settle => write!(f, "settle"),
            Action::Tick(frames) => write!(f, "tick:{frames}"),
            Action::Dismiss => write!(f, "dismiss"),
            Action::Click(ndc) => write!(f, "click:{}:{}", ndc.x, ndc.y),
            Action::Focus(number) => write!(f, "focus:{number}"),
            Action::Close => write!(f, "close"),
            Action::Orbit {
                yaw_degrees,
                pitch_degrees,
            } => write!(f, "orbit:{yaw_degrees}:{pitch_degrees}"),
            Action::Zoom(factor) => write!(f, "zoom:{factor}"),
        }
    }
}

pub fn parse_script(script: &str) -> Result<Vec<Action>> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| parse_action(token).with_context(|| format!("parsing script action {token:?}")))
        .collect()
}

fn parse_action(token: &str) -> Result<Action> {
    let mut parts = token.split(':');
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let action = match (name.as_str(), args.as_slice()) {
        ("next", []) => Action::Next,
        ("back", []) => Action::Back,
        ("settle", []) => Action::Settle,
        ("dismiss", []) => Action::Dismiss,
        ("close", []) => Action::Close,
        ("tick", [frames]) => Action::Tick(frames.parse().context("tick frame count")?),
        ("focus", [number]) => Action::Focus(number.parse().context("marker number")?),
        ("click", [x, y]) => {
            let ndc = Vec2::new(parse_finite(x)?, parse_finite(y)?);
            ensure!(
                (-1.0..=1.0).contains(&ndc.x) && (-1.0..=1.0).contains(&ndc.y),
                "click coordinates must be normalized device coordinates in -1..1"
            );
            Action::Click(ndc)
        }
        ("orbit", [yaw, pitch]) => Action::Orbit {
            yaw_degrees: parse_finite(yaw)?,
            pitch_degrees: parse_finite(pitch)?,
        },
        ("zoom", [factor]) => {
            let factor = parse_finite(factor)?;
            ensure!(factor > 0.0, "zoom factor must be positive (got {factor})");
            Action::Zoom(factor)
        }
        (
            "next" | "back" | "settle" | "dismiss" | "close" | "tick" | "focus" | "click"
            | "orbit" | "zoom",
            _,
        ) => bail!("wrong number of arguments for {name}"),
        _ => bail!("unknown action {name:?}"),
    };
    Ok(action)
}

fn parse_finite(text: &str) -> Result<f32> {
    let value: f32 = text
        .parse()
        .with_context(|| format!("{text:?} is not a number"))?;
    ensure!(value.is_finite(), "{text:?} is not finite");
    Ok(value)
}

/// Script used when `--script` is omitted.
pub fn default_script(mode: Mode, steps: usize) -> Vec<Action> {
    match mode {
        Mode::Tour => {
            let mut actions = Vec::with_capacity(steps * 2);
            for _ in 0..steps {
                actions.push(Action::Next);
                actions.push(Action::Settle);
            }
            actions
        }
        Mode::Explore => vec![Action::Dismiss],
    }
}
