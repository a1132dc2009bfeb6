use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TourError};
use crate::pose::{CameraPose, ZoomLimits};

/// Layout family the page is rendered in. Selects initial camera poses,
/// label coordinates and popup placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportClass {
    Compact,
    #[default]
    Wide,
}

impl ViewportClass {
    /// Widths above this many pixels use the wide layout.
    pub const BREAKPOINT_PX: u32 = 768;

    pub fn from_width(width_px: u32) -> Self {
        if width_px > Self::BREAKPOINT_PX {
            ViewportClass::Wide
        } else {
            ViewportClass::Compact
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewportClass::Compact => "compact",
            ViewportClass::Wide => "wide",
        }
    }
}

const TOUR_LOOK_AT: Vec3 = Vec3::new(0.0, 0.0, -3.0);
const EXPLORE_LOOK_AT: Vec3 = Vec3::new(0.0, -12.5, -3.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    /// Pins the viewport class instead of deriving it from the width.
    pub viewport: Option<ViewportClass>,
    pub animation_ms: u64,
    pub tour_zoom: ZoomLimits,
    pub explore_zoom: ZoomLimits,
    pub focus_zoom: ZoomLimits,
    pub initial_camera: Option<CameraPose>,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            viewport: None,
            animation_ms: 1000,
            tour_zoom: ZoomLimits::new(0.06, 4.0),
            explore_zoom: ZoomLimits::new(2.0, 20.0),
            focus_zoom: ZoomLimits::new(2.0, 10.0),
            initial_camera: None,
        }
    }
}

impl TourConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: TourConfig = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tour_zoom.validate()?;
        self.explore_zoom.validate()?;
        self.focus_zoom.validate()?;
        if let Some(pose) = self.initial_camera {
            if !pose.is_finite() {
                return Err(TourError::InvalidConfig(
                    "initial_camera must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn viewport_for_width(&self, width_px: u32) -> ViewportClass {
        self.viewport
            .unwrap_or_else(|| ViewportClass::from_width(width_px))
    }

    pub fn tour_initial_pose(&self, viewport: ViewportClass) -> CameraPose {
        self.initial_camera.unwrap_or_else(|| {
            let position = match viewport {
                ViewportClass::Wide => Vec3::new(2.0, 0.2, -3.0),
                ViewportClass::Compact => Vec3::new(3.0, 0.0, -3.0),
            };
            CameraPose::new(position, TOUR_LOOK_AT)
        })
    }

    pub fn explore_initial_pose(&self, viewport: ViewportClass) -> CameraPose {
        self.initial_camera.unwrap_or_else(|| {
            let position = match viewport {
                ViewportClass::Wide => Vec3::new(0.0, 2.0, -18.0),
                ViewportClass::Compact => Vec3::new(0.0, 2.0, -20.0),
            };
            CameraPose::new(position, EXPLORE_LOOK_AT)
        })
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|source| TourError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| TourError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
