//! Erased dispatch capabilities.
//!
//! Both accepted shapes (plain function, object with a named method) are
//! collapsed into one erased interface per pipeline at registration time;
//! dispatch never re-detects shapes. Function entries close over the
//! callable itself. Object entries carry only a [`HandlerBlueprint`] so a
//! live instance can be activated per dispatch.

use std::any::{Any, TypeId};
use std::marker::PhantomData;

use super::activator::{HandlerBlueprint, HandlerInstance};
use super::traits::{BoxFuture, Handler, HandlerFn, Validator, ValidatorFn};
use crate::error::{BoxError, DispatchError};
use crate::request::Request;

pub(crate) type ErasedRequest = Box<dyn Any + Send>;
pub(crate) type ErasedResponse = Box<dyn Any + Send>;

/// Erased handler capability stored in the registry.
pub(crate) trait ErasedHandler: Send + Sync {
    fn request_type_id(&self) -> TypeId;
    fn request_type(&self) -> &'static str;
    fn handler_type(&self) -> &'static str;
    /// Present for object-shaped entries, which are activated per dispatch.
    fn blueprint(&self) -> Option<&HandlerBlueprint>;
    fn call(
        &self,
        instance: Option<HandlerInstance>,
        request: ErasedRequest,
    ) -> Result<BoxFuture<'static, ErasedResponse>, DispatchError>;
}

/// Erased validator capability stored in the registry.
///
/// The success value of the returned future is the request itself, handed
/// back so the handler can consume it afterwards.
pub(crate) trait ErasedValidator: Send + Sync {
    fn request_type_id(&self) -> TypeId;
    fn request_type(&self) -> &'static str;
    fn validator_type(&self) -> &'static str;
    fn blueprint(&self) -> Option<&HandlerBlueprint>;
    fn call(
        &self,
        instance: Option<HandlerInstance>,
        request: ErasedRequest,
    ) -> Result<BoxFuture<'static, Result<ErasedRequest, BoxError>>, DispatchError>;
}

/// Function-shaped handler entry.
pub(crate) struct FunctionHandlerEntry<R, S, F> {
    callable: F,
    _shape: PhantomData<fn(R) -> S>,
}

impl<R, S, F> FunctionHandlerEntry<R, S, F>
where
    R: Request,
    S: 'static,
    F: HandlerFn<R, S>,
{
    pub(crate) fn new(callable: F) -> Self {
        Self {
            callable,
            _shape: PhantomData,
        }
    }
}

impl<R, S, F> ErasedHandler for FunctionHandlerEntry<R, S, F>
where
    R: Request,
    S: 'static,
    F: HandlerFn<R, S>,
{
    fn request_type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn request_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn handler_type(&self) -> &'static str {
        std::any::type_name::<F>()
    }

    fn blueprint(&self) -> Option<&HandlerBlueprint> {
        None
    }

    fn call(
        &self,
        _instance: Option<HandlerInstance>,
        request: ErasedRequest,
    ) -> Result<BoxFuture<'static, ErasedResponse>, DispatchError> {
        let request = *request
            .downcast::<R>()
            .map_err(|_| request_mismatch_handler(self.handler_type(), self.request_type()))?;

        let fut = self.callable.invoke(request);
        Ok(Box::pin(async move {
            Box::new(fut.await) as ErasedResponse
        }))
    }
}

/// Object-shaped handler entry: blueprint only, no live instance.
pub(crate) struct ObjectHandlerEntry<H> {
    blueprint: HandlerBlueprint,
    _handler: PhantomData<fn() -> H>,
}

impl<H> ObjectHandlerEntry<H>
where
    H: Handler + Default,
{
    pub(crate) fn new() -> Self {
        Self {
            blueprint: HandlerBlueprint::of::<H>(),
            _handler: PhantomData,
        }
    }
}

impl<H> ErasedHandler for ObjectHandlerEntry<H>
where
    H: Handler,
{
    fn request_type_id(&self) -> TypeId {
        TypeId::of::<H::Request>()
    }

    fn request_type(&self) -> &'static str {
        std::any::type_name::<H::Request>()
    }

    fn handler_type(&self) -> &'static str {
        std::any::type_name::<H>()
    }

    fn blueprint(&self) -> Option<&HandlerBlueprint> {
        Some(&self.blueprint)
    }

    fn call(
        &self,
        instance: Option<HandlerInstance>,
        request: ErasedRequest,
    ) -> Result<BoxFuture<'static, ErasedResponse>, DispatchError> {
        let instance = instance.ok_or_else(|| DispatchError::InvalidHandler {
            handler: self.handler_type(),
            reason: "object-shaped handler invoked without an activated instance".to_string(),
            source: None,
        })?;

        let instance = instance
            .downcast::<H>()
            .map_err(|_| DispatchError::InvalidHandler {
                handler: self.handler_type(),
                reason: "activator produced an instance of a different type".to_string(),
                source: None,
            })?;

        let request = *request
            .downcast::<H::Request>()
            .map_err(|_| request_mismatch_handler(self.handler_type(), self.request_type()))?;

        Ok(Box::pin(async move {
            Box::new(instance.handle(request).await) as ErasedResponse
        }))
    }
}

/// Function-shaped validator entry.
pub(crate) struct FunctionValidatorEntry<R, S, F> {
    callable: F,
    _shape: PhantomData<fn(R) -> S>,
}

impl<R, S, F> FunctionValidatorEntry<R, S, F>
where
    R: Request,
    S: 'static,
    F: ValidatorFn<R, S>,
{
    pub(crate) fn new(callable: F) -> Self {
        Self {
            callable,
            _shape: PhantomData,
        }
    }
}

impl<R, S, F> ErasedValidator for FunctionValidatorEntry<R, S, F>
where
    R: Request,
    S: 'static,
    F: ValidatorFn<R, S>,
{
    fn request_type_id(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn request_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn validator_type(&self) -> &'static str {
        std::any::type_name::<F>()
    }

    fn blueprint(&self) -> Option<&HandlerBlueprint> {
        None
    }

    fn call(
        &self,
        _instance: Option<HandlerInstance>,
        request: ErasedRequest,
    ) -> Result<BoxFuture<'static, Result<ErasedRequest, BoxError>>, DispatchError> {
        let request = *request
            .downcast::<R>()
            .map_err(|_| request_mismatch_validator(self.validator_type(), self.request_type()))?;

        let fut = self.callable.invoke(request);
        Ok(Box::pin(async move {
            fut.await.map(|request| Box::new(request) as ErasedRequest)
        }))
    }
}

/// Object-shaped validator entry.
pub(crate) struct ObjectValidatorEntry<V> {
    blueprint: HandlerBlueprint,
    _validator: PhantomData<fn() -> V>,
}

impl<V> ObjectValidatorEntry<V>
where
    V: Validator + Default,
{
    pub(crate) fn new() -> Self {
        Self {
            blueprint: HandlerBlueprint::of::<V>(),
            _validator: PhantomData,
        }
    }
}

impl<V> ErasedValidator for ObjectValidatorEntry<V>
where
    V: Validator,
{
    fn request_type_id(&self) -> TypeId {
        TypeId::of::<V::Request>()
    }

    fn request_type(&self) -> &'static str {
        std::any::type_name::<V::Request>()
    }

    fn validator_type(&self) -> &'static str {
        std::any::type_name::<V>()
    }

    fn blueprint(&self) -> Option<&HandlerBlueprint> {
        Some(&self.blueprint)
    }

    fn call(
        &self,
        instance: Option<HandlerInstance>,
        request: ErasedRequest,
    ) -> Result<BoxFuture<'static, Result<ErasedRequest, BoxError>>, DispatchError> {
        let instance = instance.ok_or_else(|| DispatchError::InvalidValidator {
            validator: self.validator_type(),
            reason: "object-shaped validator invoked without an activated instance".to_string(),
            source: None,
        })?;

        let instance = instance
            .downcast::<V>()
            .map_err(|_| DispatchError::InvalidValidator {
                validator: self.validator_type(),
                reason: "activator produced an instance of a different type".to_string(),
                source: None,
            })?;

        let request = *request
            .downcast::<V::Request>()
            .map_err(|_| request_mismatch_validator(self.validator_type(), self.request_type()))?;

        Ok(Box::pin(async move {
            instance
                .validate(request)
                .await
                .map(|request| Box::new(request) as ErasedRequest)
        }))
    }
}

fn request_mismatch_handler(handler: &'static str, expected: &'static str) -> DispatchError {
    DispatchError::InvalidHandler {
        handler,
        reason: format!("received a request that is not a '{expected}'"),
        source: None,
    }
}

fn request_mismatch_validator(validator: &'static str, expected: &'static str) -> DispatchError {
    DispatchError::InvalidValidator {
        validator,
        reason: format!("received a request that is not a '{expected}'"),
        source: None,
    }
}
