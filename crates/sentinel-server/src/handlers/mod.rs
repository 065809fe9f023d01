//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod dashboard;
pub mod providers;
pub mod runway;
pub mod subscriptions;
pub mod transactions;

// Re-export all handlers for use in router
pub use dashboard::*;
pub use providers::*;
pub use runway::*;
pub use subscriptions::*;
pub use transactions::*;
