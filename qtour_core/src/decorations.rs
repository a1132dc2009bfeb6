//! Transient label sprites shown while a tour step is on screen.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::ViewportClass;
use crate::error::{Result, TourError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    #[default]
    None,
    QubitLabels,
    GateLabels,
    EntanglementLabels,
}

impl DecorationKind {
    pub const ALL: [DecorationKind; 4] = [
        DecorationKind::None,
        DecorationKind::QubitLabels,
        DecorationKind::GateLabels,
        DecorationKind::EntanglementLabels,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DecorationKind::None => "none",
            DecorationKind::QubitLabels => "qubit_labels",
            DecorationKind::GateLabels => "gate_labels",
            DecorationKind::EntanglementLabels => "entanglement_labels",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Some(DecorationKind::None);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
    }

    /// Resolves a catalog name, falling back to no decoration for names
    /// nobody registered.
    pub fn resolve(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return DecorationKind::None;
        };
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("[decorations] unknown decoration kind {name:?}; showing no labels");
            DecorationKind::None
        })
    }
}

/// A text sprite inserted into the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSprite {
    pub text: String,
    pub color: [f32; 3],
    pub size: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecorationHandle(pub u64);

/// The part of the renderer's scene graph the tour touches.
pub trait SceneGraph {
    fn add(&mut self, sprite: LabelSprite) -> DecorationHandle;
    /// Returns false when the handle is not (or no longer) in the scene.
    fn remove(&mut self, handle: DecorationHandle) -> bool;
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

fn default_color() -> [f32; 3] {
    WHITE
}

/// Text, size and pre-authored positions for one decoration kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelLayout {
    pub text: String,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    pub size: f32,
    pub positions: Vec<Vec3>,
    /// Replacement coordinates for compact viewports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact_positions: Option<Vec<Vec3>>,
}

impl LabelLayout {
    pub fn new(text: &str, size: f32, positions: Vec<Vec3>) -> Self {
        Self {
            text: text.to_string(),
            color: WHITE,
            size,
            positions,
            compact_positions: None,
        }
    }

    pub fn positions_for(&self, viewport: ViewportClass) -> &[Vec3] {
        match (viewport, self.compact_positions.as_deref()) {
            (ViewportClass::Compact, Some(compact)) => compact,
            _ => &self.positions,
        }
    }

    pub fn sprites(&self, viewport: ViewportClass) -> impl Iterator<Item = LabelSprite> + '_ {
        self.positions_for(viewport)
            .iter()
            .map(move |position| LabelSprite {
                text: self.text.clone(),
                color: self.color,
                size: self.size,
                position: *position,
            })
    }

    pub fn validate(&self, kind: DecorationKind) -> Result<()> {
        let compact = self.compact_positions.iter().flatten();
        if self.positions.iter().chain(compact).all(|p| p.is_finite()) && self.size.is_finite() {
            Ok(())
        } else {
            Err(TourError::NonFiniteLabel { kind: kind.name() })
        }
    }
}

fn builtin_layouts() -> BTreeMap<DecorationKind, LabelLayout> {
    let mut layouts = BTreeMap::new();
    layouts.insert(
        DecorationKind::QubitLabels,
        LabelLayout::new(
            "1",
            0.015,
            vec![
                Vec3::new(0.1, 0.875, -2.13),
                Vec3::new(0.1, 0.854, -2.217),
                Vec3::new(0.1, 0.84, -2.172),
                Vec3::new(0.1, 0.8, -2.132),
                Vec3::new(0.1, 0.821, -2.217),
            ],
        ),
    );
    layouts.insert(
        DecorationKind::GateLabels,
        LabelLayout::new(
            "2",
            0.012,
            vec![
                Vec3::new(0.1, 0.895, -2.135),
                Vec3::new(0.1, 0.885, -2.211),
                Vec3::new(0.1, 0.785, -2.14),
                Vec3::new(0.1, 0.8, -2.217),
            ],
        ),
    );
    layouts.insert(
        DecorationKind::EntanglementLabels,
        LabelLayout::new(
            "2",
            0.012,
            vec![Vec3::new(0.1, 0.87, -2.175), Vec3::new(0.1, 0.81, -2.175)],
        ),
    );
    layouts
}

/// Maps decoration kinds to label layouts and moves sprites in and out of
/// the scene.
#[derive(Debug, Clone)]
pub struct MarkerDecorator {
    viewport: ViewportClass,
    layouts: BTreeMap<DecorationKind, LabelLayout>,
}

impl MarkerDecorator {
    pub fn builtin(viewport: ViewportClass) -> Self {
        Self {
            viewport,
            layouts: builtin_layouts(),
        }
    }

    pub fn empty(viewport: ViewportClass) -> Self {
        Self {
            viewport,
            layouts: BTreeMap::new(),
        }
    }

    pub fn with_layout(mut self, kind: DecorationKind, layout: LabelLayout) -> Self {
        self.layouts.insert(kind, layout);
        self
    }

    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (DecorationKind, LabelLayout)>,
    {
        self.layouts.extend(overrides);
        self
    }

    pub fn viewport(&self) -> ViewportClass {
        self.viewport
    }

    pub fn layout(&self, kind: DecorationKind) -> Option<&LabelLayout> {
        self.layouts.get(&kind)
    }

    pub fn layouts(&self) -> &BTreeMap<DecorationKind, LabelLayout> {
        &self.layouts
    }

    /// Inserts the labels for `kind` and hands ownership of their handles to
    /// the caller. Kinds without a registered layout add nothing.
    pub fn apply<S>(&self, kind: DecorationKind, scene: &mut S) -> Vec<DecorationHandle>
    where
        S: SceneGraph + ?Sized,
    {
        if kind == DecorationKind::None {
            return Vec::new();
        }
        let Some(layout) = self.layouts.get(&kind) else {
            log::warn!(
                "[decorations] no label layout registered for {}; showing no labels",
                kind.name()
            );
            return Vec::new();
        };
        layout
            .sprites(self.viewport)
            .map(|sprite| scene.add(sprite))
            .collect()
    }

    /// Removes every handle from the scene and empties the list. Returns the
    /// number of handles that were drained.
    pub fn retract<S>(handles: &mut Vec<DecorationHandle>, scene: &mut S) -> usize
    where
        S: SceneGraph + ?Sized,
    {
        let count = handles.len();
        for handle in handles.drain(..) {
            if !scene.remove(handle) {
                log::debug!("[decorations] label {:?} was already gone", handle);
            }
        }
        count
    }
}
