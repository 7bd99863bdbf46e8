//! Numeric routines behind the training pipeline
//!
//! Everything here operates on tiny fixed-shape inputs (a handful of
//! rows and columns), so the implementations are plain slice arithmetic.

pub mod blob;
pub mod clustering;
pub mod regression;
