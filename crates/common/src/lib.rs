pub mod digest;
pub mod error;

pub use digest::ContentDigest;
pub use error::{Error, Result};
