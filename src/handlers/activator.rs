use std::any::{Any, TypeId};
use std::fmt;

use crate::error::BoxError;

/// A freshly constructed handler or validator instance, type-erased.
pub type HandlerInstance = Box<dyn Any + Send + Sync>;

/// Registration-time record of an object-shaped handler or validator:
/// its type identity, its type name, and a no-argument constructor.
///
/// The blueprint is what the activator sees at dispatch time. A custom
/// activator may key off [`HandlerBlueprint::type_id`] to resolve the
/// instance from its own container instead of calling
/// [`HandlerBlueprint::construct`].
pub struct HandlerBlueprint {
    type_id: TypeId,
    type_name: &'static str,
    construct: fn() -> HandlerInstance,
}

impl HandlerBlueprint {
    pub(crate) fn of<T>() -> Self
    where
        T: Default + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            construct: || Box::new(T::default()),
        }
    }

    /// Type identity of the handler/validator this blueprint describes.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the handler/validator this blueprint describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// No-argument construction of the described type.
    pub fn construct(&self) -> HandlerInstance {
        (self.construct)()
    }
}

impl fmt::Debug for HandlerBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerBlueprint")
            .field(&self.type_name)
            .finish()
    }
}

/// Which pipeline an activation serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pipeline {
    /// The instance will run `handle`.
    Handler,
    /// The instance will run `validate`.
    Validation,
}

/// Pluggable instantiation of object-shaped handlers and validators.
///
/// The mediator calls this once per dispatch for each object-shaped entry it
/// resolved. Substituting an implementation is how applications plug in
/// their own construction strategy, e.g. a dependency-injection container:
///
/// ```rust,ignore
/// struct ContainerActivator { container: Container }
///
/// impl HandlerActivator for ContainerActivator {
///     fn activate(
///         &self,
///         blueprint: &HandlerBlueprint,
///         _pipeline: Pipeline,
///     ) -> Result<HandlerInstance, BoxError> {
///         self.container.resolve(blueprint.type_id())
///     }
/// }
/// ```
pub trait HandlerActivator: Send + Sync {
    fn activate(
        &self,
        blueprint: &HandlerBlueprint,
        pipeline: Pipeline,
    ) -> Result<HandlerInstance, BoxError>;
}

/// Default activation: no-argument construction from the blueprint.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultActivator;

impl HandlerActivator for DefaultActivator {
    fn activate(
        &self,
        blueprint: &HandlerBlueprint,
        _pipeline: Pipeline,
    ) -> Result<HandlerInstance, BoxError> {
        Ok(blueprint.construct())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct EchoHandler {
        greeting: &'static str,
    }

    #[test]
    fn blueprint_reports_identity() {
        let blueprint = HandlerBlueprint::of::<EchoHandler>();
        assert_eq!(blueprint.type_id(), TypeId::of::<EchoHandler>());
        assert!(blueprint.type_name().ends_with("EchoHandler"));
    }

    #[test]
    fn default_activator_constructs_from_blueprint() {
        let blueprint = HandlerBlueprint::of::<EchoHandler>();
        let instance = DefaultActivator
            .activate(&blueprint, Pipeline::Handler)
            .unwrap();

        let echo = instance.downcast::<EchoHandler>().unwrap();
        assert_eq!(echo.greeting, "");
    }
}
