//! Crate error types.
//!
//! The transformation pipeline itself never fails a request: injector
//! errors degrade to warnings (see the crate docs). The only typed error
//! is the outermost parse boundary, exposed for callers that drive
//! [`crate::dom::Document`] directly.

use thiserror::Error;

/// Errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The page markup could not be tokenized at all.
    ///
    /// `prepare_page` never returns this - it falls back to passing the
    /// markup through untouched - but `Document::parse` reports it.
    #[error("failed to parse page markup: {0}")]
    HtmlParse(String),
}
