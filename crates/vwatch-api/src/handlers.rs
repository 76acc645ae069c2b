//! HTTP handlers.

pub mod health;
pub mod runs;
pub mod statistics;
pub mod videos;

pub use health::health;
