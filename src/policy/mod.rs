//! Role-based access control.

pub mod rbac;

pub use rbac::{check_ownership, filter_by_ownership, handler, require_role, HandlerFn};
