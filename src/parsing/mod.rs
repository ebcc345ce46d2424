//! Line classification for chat documents.
//!
//! This module contains the pure, per-line functions used by the
//! [`parser`](crate::parser) and the [`merge engine`](crate::core::merge):
//!
//! - [`markers`] - time marker, heading and delimiter recognition
//! - [`normalize`] - hashable-line normalization and hashing

pub mod markers;
pub mod normalize;

// Re-export commonly used items
pub use markers::{TagShape, classify_heading, classify_time_tag, is_delimiter};
pub use normalize::{LineNormalizer, hash_line, normalize_for_hashing};
