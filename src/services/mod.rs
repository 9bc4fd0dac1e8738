//! Service layer around the matte pipeline
//!
//! Decoding, encoding and text transcoding stay out of the pixel stages,
//! which only ever operate on an owned RGBA buffer.

pub mod codec;
pub mod format;
pub mod io;

pub use codec::Base64Codec;
pub use format::OutputFormatHandler;
pub use io::ImageIOService;
