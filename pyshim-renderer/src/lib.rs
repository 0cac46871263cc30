//! # pyshim-renderer
//!
//! Tera-based rendering of wrapper scripts, and the inverse: recognising a
//! pyshim wrapper by its ownership marker and recovering its target.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pyshim_renderer::{classify, Ownership, Renderer};
//!
//! fn roundtrip() {
//!     if let Ok(renderer) = Renderer::new(Path::new("/system/bin/sh")) {
//!         if let Ok(content) = renderer.render(Path::new("/data/adb/python/bin/pip")) {
//!             assert!(matches!(classify(content.as_bytes()), Ownership::Owned(_)));
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod marker;

pub use context::{shell_quote, WrapperContext};
pub use engine::Renderer;
pub use error::RenderError;
pub use marker::{classify, ForeignReason, Ownership, WrapperInfo, MARKER_VERSION};
