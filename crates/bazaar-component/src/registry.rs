//! Name-to-factory table for components.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use bazaar_core::ConfigError;

use crate::component::Component;

/// Builds a component from its JSON configuration.
pub type ComponentFactory = fn(&serde_json::Value) -> Result<Box<dyn Component>, ConfigError>;

/// Maps component names to factories.
///
/// Populated at startup and read-only afterwards. The builtin table is
/// provided by `bazaar-components`; callers clone it and register their
/// own entries to extend it.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: IndexMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: ComponentFactory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate `name` with `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownComponent`] if nothing is registered under
    /// `name`, or whatever the factory reports for a bad config.
    pub fn create(
        &self,
        name: &str,
        config: &serde_json::Value,
    ) -> Result<Box<dyn Component>, ConfigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownComponent {
                name: name.to_string(),
            })?;
        factory(config)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Decode a typed parameter struct from a component's JSON config.
///
/// `null` yields `T::default()`, so a component listed without
/// parameters gets its defaults.
///
/// # Examples
///
/// ```
/// use bazaar_component::parse_config;
/// use serde::Deserialize;
///
/// #[derive(Default, Deserialize)]
/// #[serde(default)]
/// struct Params { rate: f64 }
///
/// let p: Params = parse_config("Demo", &serde_json::json!({ "rate": 0.5 })).unwrap();
/// assert_eq!(p.rate, 0.5);
/// let d: Params = parse_config("Demo", &serde_json::Value::Null).unwrap();
/// assert_eq!(d.rate, 0.0);
/// assert!(parse_config::<Params>("Demo", &serde_json::json!({ "rate": "x" })).is_err());
/// ```
pub fn parse_config<T>(component: &str, value: &serde_json::Value) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    T::deserialize(value).map_err(|e| ConfigError::ComponentConfig {
        component: component.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ActionSubspace, AgentClass};
    use crate::context::ComponentContext;
    use crate::slice::ActionSlice;
    use bazaar_core::{AgentKey, ComponentError};
    use bazaar_obs::AgentObs;
    use bazaar_world::World;

    struct Idle;

    impl Component for Idle {
        fn name(&self) -> &str {
            "Idle"
        }
        fn action_subspaces(&self, _class: AgentClass) -> Vec<ActionSubspace> {
            Vec::new()
        }
        fn generate_masks(&self, _world: &World, _c: u64) -> IndexMap<AgentKey, Vec<f32>> {
            IndexMap::new()
        }
        fn component_step(
            &mut self,
            _ctx: &mut ComponentContext<'_>,
            _actions: &ActionSlice,
        ) -> Result<(), ComponentError> {
            Ok(())
        }
        fn generate_observations(&self, _world: &World) -> IndexMap<AgentKey, AgentObs> {
            IndexMap::new()
        }
    }

    fn make_idle(_: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
        Ok(Box::new(Idle))
    }

    #[test]
    fn create_known_and_unknown() {
        let mut reg = ComponentRegistry::new();
        reg.register("Idle", make_idle);
        assert!(reg.contains("Idle"));
        let c = reg.create("Idle", &serde_json::Value::Null).unwrap();
        assert_eq!(c.name(), "Idle");
        assert_eq!(c.n_actions(AgentClass::Mobile), 0);
        assert!(matches!(
            reg.create("Nope", &serde_json::Value::Null),
            Err(ConfigError::UnknownComponent { .. })
        ));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["Idle"]);
    }
}
