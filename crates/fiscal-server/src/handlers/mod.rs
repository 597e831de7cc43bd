//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod assistant;
pub mod compare;
pub mod insights;
pub mod ministries;
pub mod status;
pub mod years;

// Re-export all handlers for use in router
pub use assistant::*;
pub use compare::*;
pub use insights::*;
pub use ministries::*;
pub use status::*;
pub use years::*;
