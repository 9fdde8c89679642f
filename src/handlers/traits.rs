use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::request::Request;

/// Boxed future for erased handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-shaped handler: a type exposing `handle` for exactly one request
/// type, declared through the associated type.
///
/// Object-shaped handlers are registered by type and instantiated fresh on
/// every dispatch through the mediator's activator (no-argument construction
/// by default, hence the `Default` bound on registration).
///
/// ```rust,ignore
/// struct GetUserHandler;
///
/// #[async_trait]
/// impl Handler for GetUserHandler {
///     type Request = GetUser;
///
///     async fn handle(&self, request: GetUser) -> Option<User> {
///         lookup(request.id).await
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// The request type this handler accepts.
    type Request: Request;

    async fn handle(&self, request: Self::Request) -> <Self::Request as Request>::Response;
}

/// Object-shaped validator: pre-checks a request before its handler runs.
///
/// A validator takes the request by value and hands it back on success, so
/// it may also normalize the request on the way through. An `Err` aborts the
/// dispatch; the handler is never invoked.
#[async_trait]
pub trait Validator: Send + Sync + 'static {
    /// The request type this validator accepts.
    type Request: Request;

    async fn validate(&self, request: Self::Request) -> Result<Self::Request, BoxError>;
}

/// Shape marker: a plain function returning the response value directly.
pub struct ValueShape;

/// Shape marker: a function returning a future of the response.
pub struct FutureShape;

/// Function-shaped handler: any `Fn(R) -> R::Response` or
/// `Fn(R) -> impl Future<Output = R::Response>`.
///
/// The `Shape` parameter lets both forms register through the same surface;
/// it is inferred, never written by callers. Synchronous results are treated
/// as already resolved, futures are awaited transparently.
pub trait HandlerFn<R: Request, Shape>: Send + Sync + 'static {
    fn invoke(&self, request: R) -> BoxFuture<'static, R::Response>;
}

impl<F, R> HandlerFn<R, ValueShape> for F
where
    R: Request,
    F: Fn(R) -> R::Response + Send + Sync + 'static,
{
    fn invoke(&self, request: R) -> BoxFuture<'static, R::Response> {
        Box::pin(std::future::ready(self(request)))
    }
}

impl<F, R, Fut> HandlerFn<R, (FutureShape, Fut)> for F
where
    R: Request,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R::Response> + Send + 'static,
{
    fn invoke(&self, request: R) -> BoxFuture<'static, R::Response> {
        Box::pin(self(request))
    }
}

/// Function-shaped validator: `Fn(R) -> Result<R, E>` or its async form.
///
/// Mirrors [`HandlerFn`]; the error converts into [`BoxError`] so callers
/// can downcast it back to the concrete type after a rejected dispatch.
pub trait ValidatorFn<R: Request, Shape>: Send + Sync + 'static {
    fn invoke(&self, request: R) -> BoxFuture<'static, Result<R, BoxError>>;
}

impl<F, R, E> ValidatorFn<R, ValueShape> for F
where
    R: Request,
    F: Fn(R) -> Result<R, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    fn invoke(&self, request: R) -> BoxFuture<'static, Result<R, BoxError>> {
        Box::pin(std::future::ready(self(request).map_err(Into::into)))
    }
}

impl<F, R, E, Fut> ValidatorFn<R, (FutureShape, Fut)> for F
where
    R: Request,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    fn invoke(&self, request: R) -> BoxFuture<'static, Result<R, BoxError>> {
        let fut = self(request);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
