//! Results views: where a submission's outcome ends up.
//!
//! A [`ResultsView`] is the page surface the controller mutates: one error
//! banner and one results container. [`MemoryView`] keeps everything in
//! memory and records the order of mutations; [`TerminalView`] is what the
//! `lookbook` binary renders into.

use serde::Serialize;
use std::io::Write;

use crate::models::Card;
use crate::render::card_html;

pub trait ResultsView: Send {
    /// Show `message` in the error banner.
    fn show_error(&mut self, message: &str);

    /// Remove every rendered card.
    fn clear_results(&mut self);

    /// Append one card after the existing ones.
    fn append_card(&mut self, card: &Card);
}

/// One mutation of a [`MemoryView`], in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Error(String),
    Cleared,
    Appended(String),
}

#[derive(Debug, Default)]
pub struct MemoryView {
    error: Option<String>,
    cards: Vec<Card>,
    events: Vec<ViewEvent>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }
}

impl ResultsView for MemoryView {
    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.events.push(ViewEvent::Error(message.to_string()));
    }

    fn clear_results(&mut self) {
        self.cards.clear();
        self.events.push(ViewEvent::Cleared);
    }

    fn append_card(&mut self, card: &Card) {
        self.cards.push(card.clone());
        self.events.push(ViewEvent::Appended(card.identifier.clone()));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One numbered line per card.
    #[default]
    Text,
    /// One JSON object per card.
    Json,
    /// Bootstrap card markup.
    Html,
}

#[derive(Serialize)]
struct CardLine<'a> {
    rank: usize,
    #[serde(flatten)]
    card: &'a Card,
}

/// Writes cards to `out` as they are appended and the error banner to `err`.
///
/// The terminal cannot take back what it printed, so clearing only resets
/// the rank counter.
pub struct TerminalView<W: Write + Send, E: Write + Send> {
    out: W,
    err: E,
    format: OutputFormat,
    rank: usize,
}

impl<W: Write + Send, E: Write + Send> TerminalView<W, E> {
    pub fn new(out: W, err: E, format: OutputFormat) -> Self {
        Self {
            out,
            err,
            format,
            rank: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// The card writer and the error writer.
    pub fn into_parts(self) -> (W, E) {
        (self.out, self.err)
    }

    fn write_card(&mut self, card: &Card) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let title = card.title.as_deref().unwrap_or("(no product info)");
                writeln!(self.out, "{:>2}. {:<40} {}", self.rank, title, card.image_src)
            }
            OutputFormat::Json => {
                let line = CardLine {
                    rank: self.rank,
                    card,
                };
                let json = serde_json::to_string(&line)?;
                writeln!(self.out, "{}", json)
            }
            OutputFormat::Html => write!(self.out, "{}", card_html(card)),
        }
    }
}

impl<W: Write + Send, E: Write + Send> ResultsView for TerminalView<W, E> {
    fn show_error(&mut self, message: &str) {
        if let Err(e) = writeln!(self.err, "Error: {}", message) {
            tracing::warn!(error = %e, "failed to write error banner");
        }
    }

    fn clear_results(&mut self) {
        self.rank = 0;
    }

    fn append_card(&mut self, card: &Card) {
        self.rank += 1;
        if let Err(e) = self.write_card(card) {
            let _ = writeln!(self.err, "Warning: failed to write result: {}", e);
        }
    }
}
