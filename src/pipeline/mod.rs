//! Pipeline stages for transcript analysis.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! the others (and without pdfium or a live model).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ metadata ──▶ llm ──▶ normalize
//! (PDF file) (pdfium)   (sniff JSON)  (model)  (reply → AnalysisResult)
//! ```
//!
//! 1. [`input`]     — check the chosen file is a readable PDF
//! 2. [`extract`]   — read the text of every page; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`metadata`]  — best-effort parse of JSON-shaped transcripts, used for
//!    the organization-mismatch check and the pilot id
//! 4. [`llm`]       — the single model call; the only stage with model I/O
//! 5. [`normalize`] — coerce the model's JSON into the fixed result shape

pub mod extract;
pub mod input;
pub mod llm;
pub mod metadata;
pub mod normalize;
