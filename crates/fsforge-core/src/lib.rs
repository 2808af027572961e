//! Core types shared across the fsforge workspace.
//!
//! This crate provides the error taxonomy and the cooperative cancellation
//! token used by every other fsforge crate.

mod cancel;
mod error;

pub use cancel::CancelToken;
pub use error::{CopyError, FsError, HashError, WalkError, WatchError};
