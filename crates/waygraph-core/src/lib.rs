//! **waygraph-core**: shared types for the *waygraph* crates.
//!
//! This crate provides the geometry primitive used to place graph nodes in
//! space ([`Position`]) and the cooperative-cancellation token used by
//! incremental searches ([`CancelToken`]).

pub mod cancel;
pub mod geom;

pub use cancel::CancelToken;
pub use geom::Position;
