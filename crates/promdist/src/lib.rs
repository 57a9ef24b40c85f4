//! Top-level facade crate for promdist.
//!
//! Re-exports core types and the engine library so users can depend on a single crate.

pub mod core {
    pub use promdist_core::*;
}

pub mod engine {
    pub use promdist_engine::*;
}
