//! HTTP request handlers organized by domain

pub mod dashboard;
pub mod transactions;

// Re-export all handlers for use in router
pub use dashboard::*;
pub use transactions::*;
