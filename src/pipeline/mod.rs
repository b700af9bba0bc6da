//! Pipeline stages for HTML-deck-to-PDF conversion.
//!
//! Each submodule implements exactly one step. Every stage that touches the
//! document receives the [`crate::browser::RenderSession`] explicitly, so the
//! stages can be tested against a scripted session.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ format ──▶ slides ──▶ { navigate ──▶ capture }* ──▶ assemble
//! (path)   (page size) (count)     (per slide, in order)       (lopdf)
//! ```
//!
//! 1. [`input`]    — validate the local HTML file and build its `file://` URL
//! 2. [`format`]   — choose the page dimensions (fixed preset or inspection)
//! 3. [`slides`]   — ordered detection cascade producing the slide count
//! 4. [`navigate`] — best-effort strategies that show slide `i`
//! 5. [`capture`]  — navigate, settle, print one page per slide
//! 6. [`assemble`] — append the single-page PDFs into one document

pub mod assemble;
pub mod capture;
pub mod format;
pub mod input;
pub mod navigate;
pub mod slides;
