//! Courier: mediator-style request dispatch.
//!
//! A process-wide registry maps each request type to exactly one handler and
//! at most one validator; a [`Mediator`] resolves a request instance to its
//! handler at call time, runs the validation gate, invokes the handler, and
//! returns the typed response. Callers depend only on request types, never
//! on the code that handles them.
//!
//! ## Key Components
//!
//! - [`Request`] - marker trait tying a request type to its response type
//! - [`Handler`] / [`Validator`] - object-shaped handling and validation
//! - [`register_handler_fn`] / [`register_validator_fn`] - function shapes
//! - [`Mediator`] - the `send` entry point
//! - [`HandlerActivator`] - pluggable per-dispatch handler instantiation
//!
//! ## Example
//!
//! ```rust,ignore
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = &'static str;
//! }
//!
//! courier::register_handler_fn(|_request: Ping| "pong");
//!
//! let mediator = Mediator::new();
//! assert_eq!(mediator.send(Ping).await?, "pong");
//! ```

pub mod error;
pub mod handlers;
pub mod mediator;
pub mod observability;
pub mod request;

pub use error::{BoxError, DispatchError, DispatchResult, RequestEnvelope};
pub use handlers::{
    DefaultActivator, Handler, HandlerActivator, HandlerBlueprint, HandlerFn, HandlerInstance,
    Pipeline, Registry, Validator, ValidatorFn, default_registry, handler, register_handler,
    register_handler_fn, register_validator, register_validator_fn, validator,
};
pub use mediator::{Mediator, MediatorBuilder, RequestExt};
pub use observability::{DispatchMetrics, MetricsSnapshot};
pub use request::Request;
