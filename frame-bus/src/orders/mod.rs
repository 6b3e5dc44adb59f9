//! Order domain
//!
//! Status changes go through [`OrderLifecycle`], which validates the request
//! before anything in the store is mutated.

pub mod lifecycle;

pub use lifecycle::{LifecycleError, OrderLifecycle, StatusChange};
