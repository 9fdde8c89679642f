//! Handler system for courier.
//!
//! This module provides the handler/validator traits, the registry that maps
//! request types to them, and the activation seam used to instantiate
//! object-shaped handlers per dispatch.
//!
//! ## Key Components
//!
//! - [`Handler`] / [`Validator`] - object-shaped traits (one request type
//!   each, declared via the associated type)
//! - [`HandlerFn`] / [`ValidatorFn`] - function shapes, sync or async
//! - [`Registry`] - request type → handler/validator mapping
//! - [`HandlerActivator`] - pluggable per-dispatch instantiation
//!
//! ## Example
//!
//! ```rust,ignore
//! use courier::handlers::Registry;
//!
//! let registry = Registry::new();
//! registry.register_handler_fn(|request: Ping| "pong");
//! registry.register_validator_fn(|request: Ping| {
//!     if request.value < 0 {
//!         return Err(RangeError);
//!     }
//!     Ok(request)
//! });
//! ```

mod activator;
pub(crate) mod erased;
mod registry;
mod traits;

pub use activator::{
    DefaultActivator, HandlerActivator, HandlerBlueprint, HandlerInstance, Pipeline,
};
pub use registry::{
    Registry, default_registry, handler, register_handler, register_handler_fn,
    register_validator, register_validator_fn, validator,
};
pub use traits::{
    BoxFuture, FutureShape, Handler, HandlerFn, Validator, ValidatorFn, ValueShape,
};
