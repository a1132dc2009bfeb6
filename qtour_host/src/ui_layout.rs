//! Popup placement on top of the Taffy layout engine. Step and onboarding
//! popups sit in fixed slots that depend on the viewport class; marker popups
//! follow the click that opened them and stay inside the window.

use anyhow::{Context, Result};
use glam::Vec2;
use qtour_core::ViewportClass;
use serde::Serialize;
use taffy::prelude::*;

pub const WIDE_STEP_SIDE: f32 = 300.0;
pub const WIDE_STEP_LEFT_FRACTION: f32 = 0.05;
pub const COMPACT_STEP_WIDTH_FRACTION: f32 = 0.8;
pub const COMPACT_STEP_HEIGHT: f32 = 120.0;
pub const COMPACT_STEP_BOTTOM: f32 = 20.0;
pub const INSTRUCTIONS_WIDTH: f32 = 350.0;
pub const INSTRUCTIONS_HEIGHT: f32 = 260.0;
pub const INSTRUCTIONS_MARGIN: f32 = 20.0;
pub const MARKER_POPUP_WIDTH: f32 = 300.0;
pub const MARKER_POPUP_HEIGHT: f32 = 180.0;
pub const MARKER_POPUP_MARGIN: f32 = 10.0;
/// Gap kept from the window edge for markers that pin their popup to a side.
const PINNED_SIDE_MARGIN: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Converts normalized device coordinates to window pixels (origin top-left).
    pub fn ndc_to_pixels(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    Step,
    Instructions,
    Marker,
}

pub struct PopupLayout {
    tree: TaffyTree<()>,
    root: NodeId,
    step: NodeId,
    instructions: NodeId,
    marker: NodeId,
    window: WindowSize,
    viewport: ViewportClass,
}

impl PopupLayout {
    pub fn new(window: WindowSize, viewport: ViewportClass) -> Result<Self> {
        let mut tree = TaffyTree::new();
        let step = tree
            .new_leaf(step_style(window, viewport))
            .context("creating step popup node")?;
        let instructions = tree
            .new_leaf(instructions_style(window, viewport))
            .context("creating instructions popup node")?;
        let marker = tree
            .new_leaf(marker_style(window, Vec2::ZERO))
            .context("creating marker popup node")?;
        let root = tree
            .new_with_children(root_style(window), &[step, instructions, marker])
            .context("creating popup root node")?;

        let mut layout = Self {
            tree,
            root,
            step,
            instructions,
            marker,
            window,
            viewport,
        };
        layout.recompute()?;
        Ok(layout)
    }

    pub fn recompute(&mut self) -> Result<()> {
        self.tree
            .compute_layout(
                self.root,
                Size {
                    width: AvailableSpace::Definite(self.window.width as f32),
                    height: AvailableSpace::Definite(self.window.height as f32),
                },
            )
            .context("recomputing popup layout")
    }

    pub fn rect(&self, kind: PopupKind) -> Option<ViewportRect> {
        let node = match kind {
            PopupKind::Step => self.step,
            PopupKind::Instructions => self.instructions,
            PopupKind::Marker => self.marker,
        };
        let layout = self.tree.layout(node).ok()?;
        Some(ViewportRect {
            x: layout.location.x,
            y: layout.location.y,
            width: layout.size.width,
            height: layout.size.height,
        })
    }

    /// Moves the marker popup next to the click that opened it. Without an
    /// anchor the popup goes to the window centre.
    pub fn place_marker(&mut self, number: u32, anchor: Option<Vec2>) -> Result<ViewportRect> {
        let click = anchor
            .map(|ndc| self.window.ndc_to_pixels(ndc))
            .unwrap_or_else(|| {
                Vec2::new(self.window.width as f32, self.window.height as f32) * 0.5
            });
        let origin = marker_origin(self.window, self.viewport, number, click);
        self.tree
            .set_style(self.marker, marker_style(self.window, origin))
            .context("moving marker popup")?;
        self.recompute()?;
        self.rect(PopupKind::Marker)
            .context("marker popup has no layout")
    }
}

fn root_style(window: WindowSize) -> Style {
    Style {
        size: Size {
            width: Dimension::Length(window.width as f32),
            height: Dimension::Length(window.height as f32),
        },
        ..Default::default()
    }
}

fn step_style(window: WindowSize, viewport: ViewportClass) -> Style {
    match viewport {
        ViewportClass::Wide => Style {
            position: Position::Absolute,
            inset: Rect {
                left: LengthPercentageAuto::Percent(WIDE_STEP_LEFT_FRACTION),
                right: LengthPercentageAuto::Auto,
                top: LengthPercentageAuto::Length(
                    ((window.height as f32 - WIDE_STEP_SIDE) * 0.5).max(0.0),
                ),
                bottom: LengthPercentageAuto::Auto,
            },
            size: Size {
                width: Dimension::Length(WIDE_STEP_SIDE),
                height: Dimension::Length(WIDE_STEP_SIDE),
            },
            ..Default::default()
        },
        ViewportClass::Compact => Style {
            position: Position::Absolute,
            inset: Rect {
                left: LengthPercentageAuto::Percent((1.0 - COMPACT_STEP_WIDTH_FRACTION) * 0.5),
                right: LengthPercentageAuto::Auto,
                top: LengthPercentageAuto::Auto,
                bottom: LengthPercentageAuto::Length(COMPACT_STEP_BOTTOM),
            },
            size: Size {
                width: Dimension::Percent(COMPACT_STEP_WIDTH_FRACTION),
                height: Dimension::Length(COMPACT_STEP_HEIGHT),
            },
            ..Default::default()
        },
    }
}

fn instructions_style(window: WindowSize, viewport: ViewportClass) -> Style {
    let width = INSTRUCTIONS_WIDTH.min(window.width as f32 - 2.0 * INSTRUCTIONS_MARGIN).max(0.0);
    let (left, top) = match viewport {
        ViewportClass::Wide => (INSTRUCTIONS_MARGIN, INSTRUCTIONS_MARGIN),
        ViewportClass::Compact => (
            ((window.width as f32 - width) * 0.5).max(0.0),
            ((window.height as f32 - INSTRUCTIONS_HEIGHT) * 0.5).max(0.0),
        ),
    };
    absolute_box(Vec2::new(left, top), Vec2::new(width, INSTRUCTIONS_HEIGHT))
}

fn marker_style(window: WindowSize, origin: Vec2) -> Style {
    absolute_box(origin, marker_size(window))
}

fn absolute_box(origin: Vec2, size: Vec2) -> Style {
    Style {
        position: Position::Absolute,
        inset: Rect {
            left: LengthPercentageAuto::Length(origin.x),
            right: LengthPercentageAuto::Auto,
            top: LengthPercentageAuto::Length(origin.y),
            bottom: LengthPercentageAuto::Auto,
        },
        size: Size {
            width: Dimension::Length(size.x),
            height: Dimension::Length(size.y),
        },
        ..Default::default()
    }
}

fn marker_size(window: WindowSize) -> Vec2 {
    let width = MARKER_POPUP_WIDTH
        .min(window.width as f32 - 2.0 * MARKER_POPUP_MARGIN)
        .max(0.0);
    Vec2::new(width, MARKER_POPUP_HEIGHT)
}

/// Top-left corner of a marker popup for a click at `click` (pixels).
fn marker_origin(window: WindowSize, viewport: ViewportClass, number: u32, click: Vec2) -> Vec2 {
    let size = marker_size(window);
    let bounds = Vec2::new(window.width as f32, window.height as f32);

    let mut origin = click + Vec2::splat(MARKER_POPUP_MARGIN);
    if origin.x + size.x > bounds.x {
        origin.x = bounds.x - size.x - MARKER_POPUP_MARGIN;
    }
    if origin.y + size.y > bounds.y {
        origin.y = bounds.y - size.y - MARKER_POPUP_MARGIN;
    }
    origin = origin.max(Vec2::splat(MARKER_POPUP_MARGIN));

    let centred_y = ((bounds.y - size.y) * 0.5).max(0.0);
    match (viewport, number) {
        // the amplifier and coax markers sit on the right of the model, so
        // their popups are pinned to the side instead of covering it
        (ViewportClass::Wide, 4 | 5) => {
            Vec2::new((bounds.x - size.x - PINNED_SIDE_MARGIN).max(0.0), centred_y)
        }
        (ViewportClass::Wide, 3) => Vec2::new(PINNED_SIDE_MARGIN, centred_y),
        (ViewportClass::Wide, _) => origin,
        (ViewportClass::Compact, _) => Vec2::new(
            origin.x,
            (bounds.y - size.y - MARKER_POPUP_MARGIN).max(0.0),
        ),
    }
}
