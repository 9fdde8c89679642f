use std::any::TypeId;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::erased::{
    ErasedHandler, ErasedValidator, FunctionHandlerEntry, FunctionValidatorEntry,
    ObjectHandlerEntry, ObjectValidatorEntry,
};
use super::traits::{Handler, HandlerFn, Validator, ValidatorFn};
use crate::request::Request;

/// Registry mapping request types to their handler and optional validator.
///
/// Entries are keyed twice: by `TypeId` (the primary key) and by type name
/// (the fallback key, for same-named types whose identity drifted across
/// separately compiled artifacts). Registration is first-write-wins per key;
/// a duplicate registration is silently ignored. There is no removal.
///
/// Maps are concurrency-safe, so late registration during live dispatch is
/// allowed even though the expected pattern is registration at startup.
pub struct Registry {
    handlers_by_type: DashMap<TypeId, Arc<dyn ErasedHandler>>,
    handlers_by_name: DashMap<&'static str, Arc<dyn ErasedHandler>>,
    validators_by_type: DashMap<TypeId, Arc<dyn ErasedValidator>>,
    validators_by_name: DashMap<&'static str, Arc<dyn ErasedValidator>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            handlers_by_type: DashMap::new(),
            handlers_by_name: DashMap::new(),
            validators_by_type: DashMap::new(),
            validators_by_name: DashMap::new(),
        }
    }

    /// Register an object-shaped handler by type.
    ///
    /// The `Default` bound feeds the blueprint's no-argument constructor; a
    /// custom activator may ignore it and construct the instance itself.
    pub fn register_handler<H>(&self)
    where
        H: Handler + Default,
    {
        self.insert_handler(Arc::new(ObjectHandlerEntry::<H>::new()));
    }

    /// Register a function-shaped handler (synchronous or asynchronous).
    pub fn register_handler_fn<R, S, F>(&self, handler: F)
    where
        R: Request,
        S: 'static,
        F: HandlerFn<R, S>,
    {
        self.insert_handler(Arc::new(FunctionHandlerEntry::<R, S, F>::new(handler)));
    }

    /// Register an object-shaped validator by type.
    pub fn register_validator<V>(&self)
    where
        V: Validator + Default,
    {
        self.insert_validator(Arc::new(ObjectValidatorEntry::<V>::new()));
    }

    /// Register a function-shaped validator (synchronous or asynchronous).
    pub fn register_validator_fn<R, S, F>(&self, validator: F)
    where
        R: Request,
        S: 'static,
        F: ValidatorFn<R, S>,
    {
        self.insert_validator(Arc::new(FunctionValidatorEntry::<R, S, F>::new(validator)));
    }

    pub fn has_handler<R: Request>(&self) -> bool {
        self.handlers_by_type.contains_key(&TypeId::of::<R>())
    }

    pub fn has_validator<R: Request>(&self) -> bool {
        self.validators_by_type.contains_key(&TypeId::of::<R>())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers_by_type.len()
    }

    pub fn validator_count(&self) -> usize {
        self.validators_by_type.len()
    }

    /// Names of all request types with a registered handler.
    pub fn registered_request_types(&self) -> Vec<&'static str> {
        self.handlers_by_name.iter().map(|entry| *entry.key()).collect()
    }

    fn insert_handler(&self, entry: Arc<dyn ErasedHandler>) {
        let type_id = entry.request_type_id();
        let name = entry.request_type();

        match self.handlers_by_type.entry(type_id) {
            Entry::Occupied(_) => {
                debug!(request = name, "Handler already registered, keeping the first");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&entry));
            }
        }

        self.handlers_by_name.entry(name).or_insert(entry);
        debug!(request = name, "Handler registered");
    }

    fn insert_validator(&self, entry: Arc<dyn ErasedValidator>) {
        let type_id = entry.request_type_id();
        let name = entry.request_type();

        match self.validators_by_type.entry(type_id) {
            Entry::Occupied(_) => {
                debug!(request = name, "Validator already registered, keeping the first");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&entry));
            }
        }

        self.validators_by_name.entry(name).or_insert(entry);
        debug!(request = name, "Validator registered");
    }

    /// Resolve a handler: type identity first, type name as fallback.
    pub(crate) fn handler_for(
        &self,
        type_id: TypeId,
        type_name: &str,
    ) -> Option<Arc<dyn ErasedHandler>> {
        if let Some(entry) = self.handlers_by_type.get(&type_id) {
            return Some(Arc::clone(entry.value()));
        }

        let fallback = self
            .handlers_by_name
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()));
        if fallback.is_some() {
            tracing::trace!(request = type_name, "Handler resolved through name fallback");
        }
        fallback
    }

    /// Resolve a validator with the same two-step lookup. A miss is not an
    /// error; the dispatch simply skips validation.
    pub(crate) fn validator_for(
        &self,
        type_id: TypeId,
        type_name: &str,
    ) -> Option<Arc<dyn ErasedValidator>> {
        if let Some(entry) = self.validators_by_type.get(&type_id) {
            return Some(Arc::clone(entry.value()));
        }

        self.validators_by_name
            .get(type_name)
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// The process-wide default registry backing the module-level registration
/// functions. Lives for the lifetime of the process.
pub fn default_registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

/// Register an object-shaped handler with the default registry.
pub fn register_handler<H>()
where
    H: Handler + Default,
{
    default_registry().register_handler::<H>();
}

/// Register a function-shaped handler with the default registry.
pub fn register_handler_fn<R, S, F>(handler: F)
where
    R: Request,
    S: 'static,
    F: HandlerFn<R, S>,
{
    default_registry().register_handler_fn(handler);
}

/// Register an object-shaped validator with the default registry.
pub fn register_validator<V>()
where
    V: Validator + Default,
{
    default_registry().register_validator::<V>();
}

/// Register a function-shaped validator with the default registry.
pub fn register_validator_fn<R, S, F>(validator: F)
where
    R: Request,
    S: 'static,
    F: ValidatorFn<R, S>,
{
    default_registry().register_validator_fn(validator);
}

/// Decorator-style registration: registers the function with the default
/// registry and hands it back unchanged, for use in expression position.
pub fn handler<R, S, F>(f: F) -> F
where
    R: Request,
    S: 'static,
    F: HandlerFn<R, S> + Clone,
{
    default_registry().register_handler_fn(f.clone());
    f
}

/// Decorator-style counterpart of [`handler`] for validators.
pub fn validator<R, S, F>(f: F) -> F
where
    R: Request,
    S: 'static,
    F: ValidatorFn<R, S> + Clone,
{
    default_registry().register_validator_fn(f.clone());
    f
}
