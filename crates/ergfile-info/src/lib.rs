//! Streaming key/value parser for archive sidecar files.
//!
//! A sidecar is UTF-8 text with two entry forms: single-line
//! `Key = value` and multi-line `Key:` followed by tab- or space-indented
//! continuation lines. Parsing is zero-copy over the input buffer — line
//! and separator scans go through `ergfile-simd` — and every committed key
//! and value lands in a dual arena so millions of entries cost a handful
//! of chunk allocations. Insertion order is preserved; duplicate keys are
//! tolerated with first-wins lookup.

mod parse;
mod table;
mod write;

pub use table::InfoFile;
