//! Server-side rehydration engine for visually-authored pages.
//!
//! A page builder produces static HTML + CSS; the backing content API
//! produces live data (product lists, blog posts, navigation menus).
//! This crate splices the two together per request:
//!
//! - locates placeholder components via `data-component-type` markers and
//!   fills them with freshly generated markup, reusing the authored DOM
//!   structure so the original design is not disturbed
//! - partitions the authored CSS into a critical subset (inlined) and a
//!   deferred subset (injected client-side on idle)
//! - annotates images with loading/priority/responsive-source attributes
//! - classifies carousels as above/below the fold and emits per-instance
//!   init scripts plus a first-paint CSS guarantee
//!
//! The whole pass is stateless and request-scoped: parse once, mutate in
//! place, serialize back to a string. Nothing in here is allowed to abort
//! page rendering; every failure degrades to "render without this
//! enhancement" plus a log line.
//!
//! Entry point: [`render::prepare_page`].

#[macro_use]
pub mod logger;

pub mod config;
pub mod dom;
pub mod error;
pub mod model;
pub mod related;
pub mod render;
pub mod utils;

pub use config::RenderConfig;
pub use error::RenderError;
pub use related::RelatedContentFetcher;
pub use render::{RenderInput, RenderOutput, prepare_page};
