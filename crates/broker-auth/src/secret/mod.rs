//! Client secret generation and hashing.

pub mod hasher;

pub use hasher::SecretHasher;
