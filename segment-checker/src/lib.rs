//! Segment checker of the query coordinator.
//!
//! A checker pass compares the collection targets with the segments query nodes report and emits
//! load and release tasks. The checker never executes tasks itself.

pub mod checker;
pub mod cli;
pub mod context;
pub mod error;
pub mod snapshot;

pub use crate::checker::{Checker, CheckerType, SegmentChecker};
pub use crate::cli::Cli;
pub use crate::context::{CheckerContext, CheckerContextBuilder};
pub use crate::error::CheckerError;
