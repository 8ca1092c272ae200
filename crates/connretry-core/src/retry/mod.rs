//! Connection retry controller.
//!
//! This module encapsulates transient error classification, the fixed-interval
//! retry policy and the controller that races retries against the overall
//! connect timeout, so connectors only have to report one attempt at a time.

mod classify;
mod controller;
mod error;
mod event;
mod policy;
mod state;

pub use classify::{
    CodeSetLookup, DefaultTransientErrorLookup, TransientErrorLookup, DEFAULT_TRANSIENT_CODES,
};
pub use controller::RetryController;
pub use error::{AttemptError, ConnectError, PolicyError};
pub use event::ConnectEvent;
pub use policy::RetryPolicy;
pub use state::{AttemptState, Phase};
