//! The upload-and-recommend workflow.
//!
//! A [`Controller`] owns a [`SimilarityBackend`], a [`CatalogCache`], a
//! [`CardRenderer`] and the [`ResultsView`] it renders into. Each call to
//! [`submit`](Controller::submit) is one submission:
//!
//! ```text
//!  no file ──▶ error banner "Please select an image" (nothing else changes)
//!
//!  file ──▶ clear results ──▶ POST upload ──▶ error field? ──▶ error banner
//!                                  │
//!                                  ▼
//!                          catalog (cached) ──▶ join first N ──▶ append cards
//! ```
//!
//! Any failure after validation ends the submission with its message in the
//! error banner; nothing is rendered after a failure.
//!
//! # Concurrent submissions
//!
//! Every validated submission takes the next generation number. The view is
//! only mutated while the submission's generation is still the newest one,
//! checked under the view lock, so an older submission that resolves late
//! cannot overwrite the results of a newer one. All cards of a submission are
//! appended under one lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::catalog::CatalogCache;
use crate::client::SimilarityBackend;
use crate::config::Config;
use crate::error::{LookbookError, Result};
use crate::models::{Card, ImageUpload};
use crate::render::CardRenderer;
use crate::view::ResultsView;

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This many cards were rendered.
    Rendered(usize),
    /// The submission failed; the message is in the error banner.
    Failed(String),
    /// No file was selected.
    Rejected,
    /// A newer submission started first; this one left the view alone.
    Superseded,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Rendered(_))
    }
}

pub struct Controller<B, V> {
    backend: B,
    catalog: CatalogCache,
    renderer: CardRenderer,
    max_results: usize,
    view: Mutex<V>,
    generation: AtomicU64,
}

impl<B, V> Controller<B, V>
where
    B: SimilarityBackend,
    V: ResultsView,
{
    pub fn new(
        backend: B,
        view: V,
        catalog: CatalogCache,
        renderer: CardRenderer,
        max_results: usize,
    ) -> Self {
        Self {
            backend,
            catalog,
            renderer,
            max_results,
            view: Mutex::new(view),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_config(backend: B, view: V, config: &Config) -> Self {
        Self::new(
            backend,
            view,
            CatalogCache::new(config.catalog.cache),
            CardRenderer::new(config.render.policy, config.render.local_image_prefix.clone()),
            config.render.max_results,
        )
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `f` against the view.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        let view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        f(&view)
    }

    pub fn into_view(self) -> V {
        self.view.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the cached catalog so the next submission fetches it again.
    pub async fn invalidate_catalog(&self) {
        self.catalog.invalidate().await;
    }

    /// Put an error that happened before submitting, such as an unreadable
    /// image, into the error banner.
    ///
    /// Takes no generation, so in-flight submissions are not cancelled.
    pub fn report_error(&self, error: &LookbookError) -> SubmitOutcome {
        let message = error.user_message();
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .show_error(&message);
        SubmitOutcome::Failed(message)
    }

    /// Handle one submission of the upload form.
    pub async fn submit(&self, selection: Option<&ImageUpload>) -> SubmitOutcome {
        let Some(image) = selection else {
            let message = LookbookError::NoFileSelected.user_message();
            self.view
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .show_error(&message);
            return SubmitOutcome::Rejected;
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, file = %image.file_name, "submission started");

        if !self.update_view(generation, |view| view.clear_results()) {
            return SubmitOutcome::Superseded;
        }

        match self.recommend(image).await {
            Ok(cards) => {
                let count = cards.len();
                let applied = self.update_view(generation, |view| {
                    for card in &cards {
                        view.append_card(card);
                    }
                });
                if applied {
                    info!(generation, cards = count, "results rendered");
                    SubmitOutcome::Rendered(count)
                } else {
                    SubmitOutcome::Superseded
                }
            }
            Err(e) => {
                let message = e.user_message();
                if self.update_view(generation, |view| view.show_error(&message)) {
                    info!(generation, error = %message, "submission failed");
                    SubmitOutcome::Failed(message)
                } else {
                    SubmitOutcome::Superseded
                }
            }
        }
    }

    async fn recommend(&self, image: &ImageUpload) -> Result<Vec<Card>> {
        let matches = self.backend.upload(image).await?.into_matches()?;
        let index = self.catalog.get_or_fetch(&self.backend).await?;

        Ok(matches
            .iter()
            .take(self.max_results)
            .map(|identifier| self.renderer.render(identifier, index.get(identifier)))
            .collect())
    }

    /// Apply `f` if `generation` is still the newest submission.
    fn update_view(&self, generation: u64, f: impl FnOnce(&mut V)) -> bool {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            debug!(generation, latest, "dropping stale submission output");
            return false;
        }
        f(&mut view);
        true
    }
}
