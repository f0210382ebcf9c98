//! Tasker step handler implementations for the logistics API.
//!
//! - `mail`: notification e-mails (1 handler)
//!
//! Handlers are plain functions over the task context; `handler_registry`
//! adapts them to the `StepHandler` trait from tasker-worker.

pub mod mail;
