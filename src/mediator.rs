//! The dispatch entry point.
//!
//! A [`Mediator`] resolves a request to its registered handler and optional
//! validator, runs the validation gate, then invokes the handler and hands
//! the typed response back. One dispatch walks
//! `null check → resolve → activate → validate → invoke`; every failure is
//! terminal, nothing is retried.

use std::any::TypeId;
use std::future::Future;
use std::sync::Arc;

use tracing::trace;

use crate::error::{DispatchError, DispatchResult, RequestEnvelope};
use crate::handlers::erased::{ErasedHandler, ErasedRequest, ErasedValidator};
use crate::handlers::{
    DefaultActivator, HandlerActivator, HandlerInstance, Pipeline, Registry, default_registry,
};
use crate::observability::DispatchMetrics;
use crate::request::Request;

/// Entry point for sending requests and receiving responses.
///
/// A mediator is a cheap handle: the registry and activator are shared, so
/// clones dispatch against the same state. By default it reads the
/// process-wide registry and constructs object-shaped handlers with
/// no-argument construction; both can be overridden through
/// [`Mediator::builder`].
///
/// ```rust,ignore
/// courier::register_handler_fn(|request: Ping| "pong");
///
/// let mediator = Mediator::new();
/// let response = mediator.send(Ping).await?;
/// ```
#[derive(Clone)]
pub struct Mediator {
    registry: Arc<Registry>,
    activator: Arc<dyn HandlerActivator>,
    metrics: Arc<DispatchMetrics>,
}

impl Mediator {
    /// Mediator over the process-wide default registry with default
    /// activation.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// The registry this mediator resolves against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatch counters for this mediator handle.
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Dispatch a request to its registered handler.
    ///
    /// Accepts the request directly or as an `Option`; `None` fails with
    /// [`DispatchError::InvalidRequest`] before any resolution happens. If a
    /// validator is registered for the request type it runs first, as an
    /// independently spawned task awaited to completion; a validator error
    /// aborts the dispatch and the handler is never invoked.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn send<R: Request>(
        &self,
        request: impl Into<Option<R>>,
    ) -> DispatchResult<R::Response> {
        let result = self.dispatch(request.into()).await;
        match &result {
            Ok(_) => self.metrics.dispatch_completed(),
            Err(DispatchError::Validation(_)) => self.metrics.validation_rejected(),
            Err(_) => self.metrics.dispatch_failed(),
        }
        result
    }

    async fn dispatch<R: Request>(&self, request: Option<R>) -> DispatchResult<R::Response> {
        let Some(request) = request else {
            return Err(DispatchError::InvalidRequest);
        };

        let type_id = TypeId::of::<R>();
        let type_name = std::any::type_name::<R>();

        let Some(handler) = self.registry.handler_for(type_id, type_name) else {
            return Err(DispatchError::HandlerNotFound(RequestEnvelope::new(request)));
        };
        if handler.request_type_id() != type_id {
            // Name-fallback hit for a same-named type with a different
            // identity; the entry cannot accept this request in-process.
            return Err(DispatchError::HandlerNotFound(RequestEnvelope::new(request)));
        }

        let validator = self
            .registry
            .validator_for(type_id, type_name)
            .filter(|validator| validator.request_type_id() == type_id);

        let handler_instance = self.activate_handler(handler.as_ref())?;

        let mut request: ErasedRequest = Box::new(request);

        if let Some(validator) = validator {
            let instance = self.activate_validator(validator.as_ref())?;
            let validation = validator.call(instance, request)?;

            // Independently scheduled, but run to completion before the
            // handler is invoked; validate and handle never overlap.
            let outcome = match tokio::spawn(validation).await {
                Ok(outcome) => outcome,
                Err(join_err) if join_err.is_panic() => {
                    std::panic::resume_unwind(join_err.into_panic())
                }
                Err(join_err) => return Err(DispatchError::Validation(Box::new(join_err))),
            };

            request = outcome.map_err(DispatchError::Validation)?;
            trace!(request = type_name, "Validation passed");
        }

        let response = handler.call(handler_instance, request)?.await;

        let response =
            response
                .downcast::<R::Response>()
                .map_err(|_| DispatchError::InvalidHandler {
                    handler: handler.handler_type(),
                    reason: "handler produced a response of an unexpected type".to_string(),
                    source: None,
                })?;

        trace!(request = type_name, "Dispatch complete");
        Ok(*response)
    }

    fn activate_handler(
        &self,
        handler: &dyn ErasedHandler,
    ) -> DispatchResult<Option<HandlerInstance>> {
        let Some(blueprint) = handler.blueprint() else {
            return Ok(None);
        };

        self.activator
            .activate(blueprint, Pipeline::Handler)
            .map(Some)
            .map_err(|source| DispatchError::InvalidHandler {
                handler: handler.handler_type(),
                reason: "activation failed".to_string(),
                source: Some(source),
            })
    }

    fn activate_validator(
        &self,
        validator: &dyn ErasedValidator,
    ) -> DispatchResult<Option<HandlerInstance>> {
        let Some(blueprint) = validator.blueprint() else {
            return Ok(None);
        };

        self.activator
            .activate(blueprint, Pipeline::Validation)
            .map(Some)
            .map_err(|source| DispatchError::InvalidValidator {
                validator: validator.validator_type(),
                reason: "activation failed".to_string(),
                source: Some(source),
            })
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Mediator`] handles with a custom registry or activator.
pub struct MediatorBuilder {
    registry: Option<Arc<Registry>>,
    activator: Option<Arc<dyn HandlerActivator>>,
}

impl MediatorBuilder {
    fn new() -> Self {
        Self {
            registry: None,
            activator: None,
        }
    }

    /// Resolve against the given registry instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Substitute the instantiation strategy for object-shaped handlers and
    /// validators (e.g. a dependency-injection container).
    pub fn activator<A>(mut self, activator: A) -> Self
    where
        A: HandlerActivator + 'static,
    {
        self.activator = Some(Arc::new(activator));
        self
    }

    pub fn build(self) -> Mediator {
        Mediator {
            registry: self.registry.unwrap_or_else(default_registry),
            activator: self
                .activator
                .unwrap_or_else(|| Arc::new(DefaultActivator)),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }
}

/// Fluent dispatch: `request.send_via(&mediator)`.
///
/// Same resolution, validation, and invocation as [`Mediator::send`]; this
/// only flips the call shape around for request-first code.
pub trait RequestExt: Request + Sized {
    fn send_via(
        self,
        mediator: &Mediator,
    ) -> impl Future<Output = DispatchResult<Self::Response>> + Send + '_;
}

impl<R: Request> RequestExt for R {
    fn send_via(
        self,
        mediator: &Mediator,
    ) -> impl Future<Output = DispatchResult<Self::Response>> + Send + '_ {
        mediator.send(self)
    }
}
