//! Data models for the Content AI backend.
//!
//! Field names serialize in camelCase to match the browser client.

mod content;
mod generation;
mod kind;
mod trend;
mod user;

pub use content::*;
pub use generation::*;
pub use kind::*;
pub use trend::*;
pub use user::*;
