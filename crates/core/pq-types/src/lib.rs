//! Core types for parquet-queue.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`RowRange`] - Half-open slice of row indices assigned to one worker
//! - [`Record`] - Opaque, serializable unit corresponding to one row
//! - [`Batch`] - Bounded group of records sized for one publish call
//! - [`ProcessRequest`] / [`ProcessResponse`] - Inbound unit of work

pub mod batch;
pub mod range;
pub mod record;
pub mod request;

pub use batch::*;
pub use range::*;
pub use record::*;
pub use request::*;
