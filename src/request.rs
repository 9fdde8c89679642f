/// Marker trait for dispatchable request types.
///
/// A request carries its response type with it, so the mediator can hand the
/// handler's result back to the caller fully typed:
///
/// ```rust,ignore
/// struct GetUser { id: u64 }
///
/// impl Request for GetUser {
///     type Response = Option<User>;
/// }
/// ```
///
/// Nothing else is required of a request type beyond being sendable across
/// tasks; the mediator distinguishes requests by their runtime type (and by
/// type name on the fallback resolution path).
pub trait Request: Send + 'static {
    /// The value the registered handler produces for this request.
    type Response: Send + 'static;
}
