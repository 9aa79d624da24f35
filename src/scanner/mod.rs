//! Scan pipeline: parallel directory walking, candidate qualification, and
//! the sequential move into trash.

pub mod filter;
pub mod mover;
pub mod walker;
