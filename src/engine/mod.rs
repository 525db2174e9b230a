//! Pure computation for the draw engine.

pub mod lottery;

pub use lottery::{draw, total_weight, Weighted};
