//! Background generation jobs.
//!
//! A [`GenerationJob`] carries a ready payload, an optional model and an
//! optional named callback. [`JobRunner`] sends it with bounded retries on a
//! fixed delay schedule and then hands the response to the callback, if one
//! is registered under that name. Jobs go straight to the client; the response
//! cache is not consulted.

mod callback;
mod runner;

pub use callback::{CallbackRegistry, JobCallback};
pub use runner::{GenerationJob, JobRunner, RetryPolicy};
