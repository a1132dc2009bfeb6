use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::read_json;
use crate::decorations::{DecorationKind, LabelLayout};
use crate::error::{Result, TourError};
use crate::pose::CameraPose;

/// One entry in the guided tour. `destination` is where the camera flies
/// when the user leaves this step with Next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub title: String,
    pub annotation: String,
    pub destination: CameraPose,
    pub decoration: DecorationKind,
}

impl Step {
    pub fn new(
        title: &str,
        annotation: &str,
        camera: Vec3,
        look_at: Vec3,
        decoration: DecorationKind,
    ) -> Self {
        Self {
            title: title.to_string(),
            annotation: annotation.to_string(),
            destination: CameraPose::new(camera, look_at),
            decoration,
        }
    }
}

/// Ordered, immutable list of tour steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepCatalog {
    steps: Vec<Step>,
}

impl StepCatalog {
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        for (index, step) in steps.iter().enumerate() {
            let field = if !step.destination.position.is_finite() {
                Some("camera destination")
            } else if !step.destination.look_at.is_finite() {
                Some("look-at destination")
            } else {
                None
            };
            if let Some(field) = field {
                return Err(TourError::NonFiniteStep {
                    index,
                    title: step.title.clone(),
                    field,
                });
            }
        }
        Ok(Self { steps })
    }

    /// The quantum processor walkthrough.
    pub fn builtin() -> Self {
        Self {
            steps: vec![
                Step::new(
                    "Quantum processor",
                    "These qubits use superconducting circuits cooled to near absolute zero to maintain quantum states.",
                    Vec3::new(0.25, 0.9, -2.15),
                    Vec3::new(0.2, 0.89, -2.15),
                    DecorationKind::None,
                ),
                Step::new(
                    "1: Qubits",
                    "Here's how qubits are arranged...",
                    Vec3::new(0.11, 0.92, -1.98),
                    Vec3::new(0.115, 0.88, -2.1),
                    DecorationKind::QubitLabels,
                ),
                Step::new(
                    "1: Qubit Materials",
                    "Each qubit is made from...",
                    Vec3::new(0.25, 0.9, -2.15),
                    Vec3::new(0.2, 0.89, -2.15),
                    DecorationKind::None,
                ),
                Step::new(
                    "2: Quantum Logic Gates",
                    "These gold lines represented with a '2' are resonators. Resonators carry microwave signals to the qubit to modify its state - acting as a quantum logic gate. They also do readouts on the qubit.",
                    Vec3::new(0.25, 0.9, -2.15),
                    Vec3::new(0.2, 0.89, -2.15),
                    DecorationKind::GateLabels,
                ),
                Step::new(
                    "2: Entanglement",
                    "The resonators labeled here are responsible for connecting the qubits together - quantum coupling. This allows entanglement...",
                    Vec3::new(3.0, 0.0, -3.0),
                    Vec3::new(0.2, 0.0, -3.0),
                    DecorationKind::EntanglementLabels,
                ),
            ],
        }
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn to_document(&self, labels: &BTreeMap<DecorationKind, LabelLayout>) -> CatalogDocument {
        CatalogDocument {
            steps: self
                .steps
                .iter()
                .map(|step| StepRecord {
                    title: step.title.clone(),
                    annotation: step.annotation.clone(),
                    camera: step.destination.position,
                    look_at: step.destination.look_at,
                    decoration: Some(step.decoration.name().to_string()),
                })
                .collect(),
            labels: labels
                .iter()
                .map(|(kind, layout)| (kind.name().to_string(), layout.clone()))
                .collect(),
        }
    }
}

/// On-disk catalog format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, LabelLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub title: String,
    #[serde(default)]
    pub annotation: String,
    pub camera: Vec3,
    pub look_at: Vec3,
    #[serde(default)]
    pub decoration: Option<String>,
}

/// A catalog file resolved into steps plus any label layout overrides.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub steps: StepCatalog,
    pub labels: BTreeMap<DecorationKind, LabelLayout>,
}

impl LoadedCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let document: CatalogDocument = read_json(path)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let steps = document
            .steps
            .into_iter()
            .map(|record| {
                let decoration = DecorationKind::resolve(record.decoration.as_deref());
                Step::new(
                    &record.title,
                    &record.annotation,
                    record.camera,
                    record.look_at,
                    decoration,
                )
            })
            .collect();
        let steps = StepCatalog::new(steps)?;

        let mut labels = BTreeMap::new();
        for (name, layout) in document.labels {
            match DecorationKind::from_name(&name) {
                Some(DecorationKind::None) | None => {
                    log::warn!("[catalog] ignoring label layout for unknown kind {name:?}");
                }
                Some(kind) => {
                    layout.validate(kind)?;
                    labels.insert(kind, layout);
                }
            }
        }

        log::debug!(
            "[catalog] loaded {} steps, {} label overrides",
            steps.len(),
            labels.len()
        );
        Ok(Self { steps, labels })
    }
}
