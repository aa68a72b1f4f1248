pub mod config;
pub mod games;
pub mod identifiers;
pub mod logger;
pub mod session_rng;

pub use identifiers::*;
