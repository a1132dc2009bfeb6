//! Terminal rendition of the popups. Every popup is printed once, placed with
//! [`PopupLayout`], and kept in a log for the transcript.

use qtour_core::annotation::{Bullet, Span};
use qtour_core::presenter::{InstructionsView, MarkerView, StepView};
use qtour_core::{FinishPrompt, NavButtons, PopupPresenter};
use serde::Serialize;

use crate::ui_layout::{PopupKind, PopupLayout, ViewportRect};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "popup", rename_all = "snake_case")]
pub enum PopupRecord {
    Step {
        index: usize,
        title: String,
        back: bool,
        next: &'static str,
        rect: Option<ViewportRect>,
    },
    Marker {
        number: u32,
        title: String,
        rect: Option<ViewportRect>,
    },
    Instructions {
        title: String,
        rect: Option<ViewportRect>,
    },
}

pub struct TerminalPresenter {
    layout: PopupLayout,
    visible: bool,
    shown: Vec<PopupRecord>,
}

impl TerminalPresenter {
    pub fn new(layout: PopupLayout) -> Self {
        Self {
            layout,
            visible: false,
            shown: Vec::new(),
        }
    }

    pub fn shown(&self) -> &[PopupRecord] {
        &self.shown
    }

    fn open(&mut self, record: PopupRecord) {
        self.visible = true;
        self.shown.push(record);
    }
}

fn render_bullet(bullet: &Bullet) -> String {
    bullet
        .spans
        .iter()
        .map(|span| match span {
            Span::Plain(text) => text.clone(),
            Span::Strong(text) => format!("*{text}*"),
        })
        .collect()
}

fn describe_rect(rect: Option<ViewportRect>) -> String {
    match rect {
        Some(rect) => format!(
            "{:.0},{:.0} {:.0}x{:.0}",
            rect.x, rect.y, rect.width, rect.height
        ),
        None => "unplaced".to_string(),
    }
}

impl PopupPresenter for TerminalPresenter {
    fn show_step(&mut self, view: &StepView, buttons: NavButtons) {
        let rect = self.layout.rect(PopupKind::Step);
        println!(
            "[popup] {} ({}/{}) @ {}",
            view.title,
            view.index + 1,
            view.total,
            describe_rect(rect)
        );
        for bullet in &view.bullets {
            println!("    • {}", render_bullet(bullet));
        }
        let back = if buttons.back { "[Back] " } else { "" };
        println!("    {back}[{}]", buttons.next.as_str());

        self.open(PopupRecord::Step {
            index: view.index,
            title: view.title.clone(),
            back: buttons.back,
            next: buttons.next.as_str(),
            rect,
        });
    }

    fn show_marker(&mut self, view: &MarkerView) {
        let rect = match self.layout.place_marker(view.number, view.anchor) {
            Ok(rect) => Some(rect),
            Err(err) => {
                log::warn!("[popup] could not place marker {} popup: {err:?}", view.number);
                None
            }
        };
        println!(
            "[popup] marker {}: {} @ {}",
            view.number,
            view.title,
            describe_rect(rect)
        );
        for bullet in &view.bullets {
            println!("    • {}", render_bullet(bullet));
        }
        println!("    [✖]");

        self.open(PopupRecord::Marker {
            number: view.number,
            title: view.title.clone(),
            rect,
        });
    }

    fn show_instructions(&mut self, view: &InstructionsView) {
        let rect = self.layout.rect(PopupKind::Instructions);
        println!("[popup] {} @ {}", view.title, describe_rect(rect));
        for line in &view.lines {
            println!("    - {line}");
        }

        self.open(PopupRecord::Instructions {
            title: view.title.clone(),
            rect,
        });
    }

    fn clear(&mut self) {
        if self.visible {
            log::debug!("[popup] cleared");
        }
        self.visible = false;
    }
}

/// End-of-tour banner.
#[derive(Debug, Default)]
pub struct FinishBanner {
    shown: usize,
}

impl FinishBanner {
    pub fn times_shown(&self) -> usize {
        self.shown
    }
}

impl FinishPrompt for FinishBanner {
    fn show_finished(&mut self) {
        self.shown += 1;
        println!("[finish] Tour complete. Explore the full quantum computer next.");
    }
}
