//! Permission system for tool execution
//!
//! Tools that change things ask the user first unless they have been trusted.

mod manager;

pub use manager::{PermissionDecision, PermissionManager, PermissionRequest, PERMISSION_DENIED};
