//! Signal exchange APIs and their registration table

use std::fmt;
use std::panic;
use std::sync::{Arc, Mutex, PoisonError};

use super::content::ensure_unique;
use crate::command::{synthesize, CommandSurface};
use crate::error::{SigexError, SigexResult};
use crate::schema::{describe, CollabSchema, FieldDescriptor};

/// Error type returned by API factories
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Zero-argument constructor for an API
pub type ApiFactory = fn() -> Result<Arc<dyn SignalExchangeApi>, FactoryError>;

/// An integration with an external signal exchange
pub trait SignalExchangeApi: Send + Sync {
    /// Short name used on the command line and stored on collabs
    fn name(&self) -> &str;

    /// Fully qualified implementation identifier
    fn qualified_name(&self) -> &str;

    /// Declarative field set of this API's collab configs
    fn collab_schema(&self) -> CollabSchema;

    /// Sample APIs are listed but get no edit surface
    fn is_sample(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn SignalExchangeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalExchangeApi")
            .field("name", &self.name())
            .field("qualified_name", &self.qualified_name())
            .finish()
    }
}

/// Registration table entry: the API's name and how to build it
#[derive(Clone, Copy)]
pub struct ApiType {
    pub name: &'static str,
    pub qualified_name: &'static str,
    pub factory: ApiFactory,
}

impl ApiType {
    /// Construct an instance
    ///
    /// A factory that fails or panics yields `Instantiation`, as does an
    /// instance whose name differs from the registered one.
    ///
    /// # Errors
    /// Returns `Instantiation` naming this API type
    pub fn instantiate(&self) -> SigexResult<Arc<dyn SignalExchangeApi>> {
        let instantiation = |message: String| SigexError::Instantiation {
            api: self.qualified_name.to_string(),
            message,
        };

        let built = catch_quietly(self.factory)
            .map_err(|payload| instantiation(panic_message(payload.as_ref())))?
            .map_err(|e| instantiation(e.to_string()))?;

        if built.name() != self.name {
            return Err(instantiation(format!(
                "registered as '{}' but built '{}'",
                self.name,
                built.name()
            )));
        }
        Ok(built)
    }
}

impl fmt::Debug for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiType")
            .field("name", &self.name)
            .field("qualified_name", &self.qualified_name)
            .finish_non_exhaustive()
    }
}

static PANIC_HOOK: Mutex<()> = Mutex::new(());

/// `catch_unwind` with the panic hook silenced, so a failing factory is
/// reported once through its `Instantiation` error
fn catch_quietly<R>(f: fn() -> R) -> std::thread::Result<R> {
    let _guard = PANIC_HOOK.lock().unwrap_or_else(PoisonError::into_inner);
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(f);
    panic::set_hook(hook);
    result
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "constructor panicked".to_string()
    }
}

/// A live API with its schema and cached field descriptors
#[derive(Debug, Clone)]
pub struct RegisteredApi {
    pub api: Arc<dyn SignalExchangeApi>,
    pub schema: CollabSchema,
    pub descriptors: Vec<FieldDescriptor>,
}

/// The set of known API instances, keyed by unique name
#[derive(Debug, Clone, Default)]
pub struct ApiMapping {
    apis: Vec<RegisteredApi>,
}

impl ApiMapping {
    /// Register instances, describing each schema once
    ///
    /// # Errors
    /// Returns `DuplicateRegistration` on a name collision, or a schema
    /// error if an API's schema is malformed
    pub fn new(apis: Vec<Arc<dyn SignalExchangeApi>>) -> SigexResult<Self> {
        ensure_unique("api", apis.iter().map(|a| a.name()))?;

        let apis = apis
            .into_iter()
            .map(|api| {
                let schema = api.collab_schema();
                if schema.api != api.name() {
                    return Err(SigexError::schema(
                        api.name(),
                        format!("collab schema is declared for '{}'", schema.api),
                    ));
                }
                let descriptors = describe(&schema)?;
                Ok(RegisteredApi {
                    api,
                    schema,
                    descriptors,
                })
            })
            .collect::<SigexResult<Vec<_>>>()?;

        Ok(Self { apis })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredApi> {
        self.apis.iter().find(|a| a.api.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredApi> {
        self.apis.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apis.iter().map(|a| a.api.name())
    }

    /// Instances, for feeding into a new mapping
    #[must_use]
    pub fn instances(&self) -> Vec<Arc<dyn SignalExchangeApi>> {
        self.apis.iter().map(|a| Arc::clone(&a.api)).collect()
    }

    /// APIs that get a `collab edit` subcommand
    pub fn editable(&self) -> impl Iterator<Item = &RegisteredApi> {
        self.apis.iter().filter(|a| !a.api.is_sample())
    }

    /// Synthesize one edit surface per editable API
    ///
    /// # Errors
    /// Returns a schema error if a field collides with a fixed flag
    pub fn surfaces(&self) -> SigexResult<Vec<CommandSurface>> {
        self.editable()
            .map(|a| synthesize(a.api.name(), &a.descriptors))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, TypeTag};

    struct Named(&'static str);

    impl SignalExchangeApi for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn qualified_name(&self) -> &str {
            "tests::Named"
        }
        fn collab_schema(&self) -> CollabSchema {
            CollabSchema::new(self.0).field(FieldSpec::required("x", TypeTag::Int))
        }
    }

    fn named(name: &'static str) -> Arc<dyn SignalExchangeApi> {
        Arc::new(Named(name))
    }

    #[test]
    fn test_duplicate_api_names() {
        let err = ApiMapping::new(vec![named("a"), named("a")]).unwrap_err();
        assert!(matches!(err, SigexError::DuplicateRegistration { kind: "api", .. }));
    }

    #[test]
    fn test_descriptors_cached() {
        let mapping = ApiMapping::new(vec![named("a"), named("b")]).unwrap();
        let a = mapping.get("a").unwrap();
        assert_eq!(a.descriptors.len(), 1);
        assert_eq!(mapping.surfaces().unwrap().len(), 2);
        assert_eq!(mapping.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_instantiate_catches_panic() {
        let api_type = ApiType {
            name: "boom",
            qualified_name: "tests::Boom",
            factory: || panic!("no config file"),
        };
        let err = api_type.instantiate().unwrap_err();
        assert!(matches!(err, SigexError::Instantiation { ref api, ref message }
            if api == "tests::Boom" && message.contains("no config file")));
    }

    #[test]
    fn test_instantiate_name_mismatch() {
        let api_type = ApiType {
            name: "expected",
            qualified_name: "tests::Named",
            factory: || Ok(named("other")),
        };
        assert!(api_type.instantiate().is_err());
    }
}
