//! Image utilities shared by the pipeline stages.

pub mod crop;

pub use crop::{crop_exact, crop_padded, decode_page, open_page};
