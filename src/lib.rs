//! Purpose: Library crate for building file-backed data packages incrementally.
//! Exports: `api` (resources, packages, options) and `core` (codec, storage, errors).
//! Role: Backing library for export drivers; no CLI or network surface here.
//! Invariants: All filesystem writes go through resource and package operations.
//! Invariants: The value codec is the only path between cell text and typed values.
pub mod api;
pub mod core;
