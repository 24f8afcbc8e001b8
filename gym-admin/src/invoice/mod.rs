//! Invoice generation.
//!
//! Rendering is split in two stages:
//!
//! 1. [`InvoiceLayout::build`] turns a member, a subscription record and the
//!    organization settings into a deterministic document model.
//! 2. A [`DocumentRenderer`] (by default [`PdfRenderer`]) turns the model into
//!    bytes.
//!
//! The generator never writes to storage; callers hand the bytes to an
//! [`ArtifactStore`](crate::artifacts::ArtifactStore).

mod badge;
pub mod format;
mod layout;
mod pdf;

use std::{fmt, sync::Arc};

pub use badge::{BadgeTone, StatusBadge};
pub use layout::{Cell, Header, InvoiceLayout, Row, Section};
pub use pdf::PdfRenderer;
use tracing::debug;

use crate::{
    error::Result, membership::Member, settings::OrgSettings,
    subscriptions::models::SubscriptionRecord,
};

/// Turns a laid-out invoice into document bytes.
pub trait DocumentRenderer: Send + Sync + fmt::Debug {
    /// Renders `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Render`](crate::error::AdminError::Render) when the
    /// document cannot be produced.
    fn render(&self, layout: &InvoiceLayout) -> Result<Vec<u8>>;
}

/// Produces invoice documents for subscription records.
#[derive(Debug, Clone)]
pub struct InvoiceGenerator {
    renderer: Arc<dyn DocumentRenderer>,
}

impl Default for InvoiceGenerator {
    fn default() -> Self {
        Self::new(Arc::new(PdfRenderer::new()))
    }
}

impl InvoiceGenerator {
    /// Creates a generator backed by `renderer`.
    #[must_use]
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { renderer }
    }

    /// Renders the invoice of `record` for `member`.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's error.
    pub fn render(
        &self,
        member: &Member,
        record: &SubscriptionRecord,
        settings: &OrgSettings,
    ) -> Result<Vec<u8>> {
        let layout = InvoiceLayout::build(member, record, settings);
        let bytes = self.renderer.render(&layout)?;
        debug!(invoice = %record.invoice_id(), bytes = bytes.len(), "invoice rendered");
        Ok(bytes)
    }
}
