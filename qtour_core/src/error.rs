use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while loading tour data. Navigation itself never fails;
/// rejected requests are reported through [`crate::NavOutcome`].
#[derive(Debug, Error)]
pub enum TourError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("step {index} ({title}) has a non-finite {field}")]
    NonFiniteStep {
        index: usize,
        title: String,
        field: &'static str,
    },
    #[error("marker {number} has a non-finite {field}")]
    NonFiniteMarker { number: u32, field: &'static str },
    #[error("label layout for {kind} has a non-finite position")]
    NonFiniteLabel { kind: &'static str },
    #[error("marker number {0} appears more than once")]
    DuplicateMarker(u32),
    #[error("invalid zoom limits: min {min} must be positive and not exceed max {max}")]
    InvalidZoom { min: f32, max: f32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TourError>;
