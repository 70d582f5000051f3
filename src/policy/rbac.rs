//! Role guards and ownership filtering.
//!
//! Permission logic is declared once per capability by wrapping its handler
//! with [`require_role`]; business logic never re-checks roles. A failed
//! check produces a typed [`Denial`] listing the required roles and the
//! caller's role, never a fault. Ownership filtering is the companion for
//! list/read paths: admins see everything, everyone else only what they own.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::a2a::errors::{CoreError, Denial};
use crate::a2a::types::{CallerContext, Role};

/// Boxed future returned by capability handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, CoreError>> + Send>>;

/// A capability handler: validated params plus caller context in, result or
/// `CoreError` out.
pub type HandlerFn = Arc<dyn Fn(Value, CallerContext) -> HandlerFuture + Send + Sync>;

/// Box an async closure into a [`HandlerFn`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Value, CallerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, CoreError>> + Send + 'static,
{
    Arc::new(move |params, context| Box::pin(f(params, context)))
}

/// Wrap `inner` with a role check.
///
/// The caller's role must cover at least one of `allowed` (admin covers
/// employee). On failure the handler short-circuits with
/// `CoreError::Authorization` carrying the full [`Denial`].
pub fn require_role(capability: &str, allowed: &[Role], inner: HandlerFn) -> HandlerFn {
    let capability = capability.to_string();
    let allowed = allowed.to_vec();
    Arc::new(move |params, context| {
        if allowed.iter().any(|r| context.role.covers(*r)) {
            inner(params, context)
        } else {
            let denial = Denial {
                capability: capability.clone(),
                required_roles: allowed.clone(),
                user_role: context.role,
            };
            Box::pin(async move { Err(CoreError::Authorization(denial)) })
        }
    })
}

/// Filter `items` down to what the caller may see.
///
/// Admins see everything; other callers only items whose owner matches
/// their subject id.
pub fn filter_by_ownership<T, F>(context: &CallerContext, items: Vec<T>, owner_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    if context.role == Role::Admin {
        return items;
    }
    items
        .into_iter()
        .filter(|item| owner_of(item) == context.subject_id)
        .collect()
}

/// Whether the caller may touch a single item owned by `owner_id`.
pub fn check_ownership(context: &CallerContext, owner_id: &str) -> bool {
    context.role == Role::Admin || context.subject_id == owner_id
}
