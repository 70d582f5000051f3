//! Capability providers bundled with the core.

pub mod expense;

pub use expense::{ExpenseProvider, EXPENSE_PROVIDER_ID};
