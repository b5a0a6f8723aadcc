//! Image preparation for captioning
//!
//! Normalizes decoded images to 3-channel RGB and encodes them for upload to
//! vision backends. Decoding and encoding are CPU-bound and run on the
//! blocking pool.

pub mod processor;

pub use processor::{encode_for_captioning, load_image, normalize_rgb, CAPTION_MIME_TYPE};
