//! Common types, traits, and error definitions for survey_planner
//!
//! This module provides the foundational building blocks used across
//! the grid model, the planners and the mission stages.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
