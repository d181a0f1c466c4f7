//! JWT token encoding and decoding.

pub mod decoder;
pub mod encoder;

pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
