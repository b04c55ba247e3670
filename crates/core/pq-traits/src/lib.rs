//! Core traits for parquet-queue.
//!
//! This crate defines the collaborator seams of the pipeline:
//! - [`RowSource`] / [`RowReader`] - Row counts and ranged reads over one local file
//! - [`Publisher`] - Sink accepting one batch and reporting per-record outcomes
//! - [`ObjectFetcher`] - Retrieval of a remote object onto local storage
//!
//! Implementations are stateless capability objects shared by reference
//! between concurrent workers; none of them hold a cursor or other mutable
//! per-call state.

pub mod fetcher;
pub mod publisher;
pub mod source;

pub use fetcher::*;
pub use publisher::*;
pub use source::*;
