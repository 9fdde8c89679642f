use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Open error currency for validator failures and activator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A request carried inside an error for diagnostics.
///
/// `HandlerNotFound` hands the rejected request back to the caller in erased
/// form; `downcast` recovers the concrete value when the caller knows the
/// type.
pub struct RequestEnvelope {
    payload: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl RequestEnvelope {
    pub(crate) fn new<R: Send + 'static>(request: R) -> Self {
        Self {
            payload: Box::new(request),
            type_name: std::any::type_name::<R>(),
        }
    }

    /// Name of the request type this envelope was built from.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the request by value; returns the envelope untouched if `R`
    /// is not the contained type.
    pub fn downcast<R: 'static>(self) -> Result<R, Self> {
        let type_name = self.type_name;
        match self.payload.downcast::<R>() {
            Ok(request) => Ok(*request),
            Err(payload) => Err(Self { payload, type_name }),
        }
    }

    /// Borrow the request without consuming the envelope.
    pub fn downcast_ref<R: 'static>(&self) -> Option<&R> {
        self.payload.downcast_ref::<R>()
    }
}

impl fmt::Debug for RequestEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestEnvelope")
            .field(&self.type_name)
            .finish()
    }
}

/// Dispatch and registration failures.
///
/// All of these are programmer or configuration errors, not transient
/// conditions; the mediator never retries and performs no recovery of its
/// own. They surface unmodified at the `send` call site.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `send` was called with `None` in place of a request.
    #[error("request must be an object of a defined request type")]
    InvalidRequest,

    /// No handler is registered for the request's type, neither under its
    /// type identity nor under its type name.
    #[error("handler for request '{}' is not registered", .0.type_name())]
    HandlerNotFound(RequestEnvelope),

    /// The handler side failed a runtime shape check: the activator errored,
    /// produced an instance of a different type, or the entry could not
    /// accept the live request or response type.
    #[error("incorrect handler '{handler}': {reason}")]
    InvalidHandler {
        handler: &'static str,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Same as [`DispatchError::InvalidHandler`], for the validation
    /// pipeline.
    #[error("incorrect validator '{validator}': {reason}")]
    InvalidValidator {
        validator: &'static str,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The validator rejected the request; the handler was never invoked.
    /// The source is the validator's own error and can be downcast to its
    /// concrete type.
    #[error("request validation failed: {0}")]
    Validation(#[source] BoxError),
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
