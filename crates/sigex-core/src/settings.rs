//! Assembled runtime state: registry, stores and extension management

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{SigexError, SigexResult};
use crate::extension::{validate, ExtensionCatalog, ExtensionManifest};
use crate::registry::{builtin, ApiMapping, ApiType, SignalExchangeApi, SignalTypeMapping};
use crate::storage::{Database, ExtensionStore, SettingsStore, SqliteCollabStore};

/// Everything a `config` command needs, loaded from one database
pub struct Settings<'db> {
    db: &'db Database,
    catalog: ExtensionCatalog,
    signal_types: SignalTypeMapping,
    apis: ApiMapping,
    extensions: Vec<ExtensionManifest>,
}

impl<'db> Settings<'db> {
    /// Assemble the registry from the built-ins plus every persisted extension
    ///
    /// Persisted extensions that no longer resolve or no longer validate are
    /// skipped with a warning.
    ///
    /// # Errors
    /// Returns an error if the database cannot be read or the built-ins are
    /// inconsistent
    pub fn load(db: &'db Database, catalog: ExtensionCatalog) -> SigexResult<Self> {
        let mut content_types = builtin::content_types();
        let mut signal_types = builtin::signal_types();
        let mut apis = builtin::api_types()
            .iter()
            .map(ApiType::instantiate)
            .collect::<SigexResult<Vec<_>>>()?;
        let mut extensions = Vec::new();

        for module in ExtensionStore::new(db.connection()).list()? {
            let manifest = match catalog.load(&module) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(module = %module, error = %e, "Skipping extension");
                    continue;
                }
            };
            match validate(&manifest, &content_types, &signal_types, &apis) {
                Ok(new_apis) => {
                    content_types.extend(manifest.content_types.iter().cloned());
                    signal_types.extend(manifest.signal_types.iter().cloned());
                    apis.extend(new_apis);
                    extensions.push(manifest);
                }
                Err(e) => warn!(module = %module, error = %e, "Skipping extension"),
            }
        }

        let signal_types = SignalTypeMapping::new(content_types, signal_types)?;
        let apis = ApiMapping::new(apis)?;

        debug!(
            content_types = signal_types.content_types().len(),
            signal_types = signal_types.signal_types().len(),
            apis = apis.iter().count(),
            extensions = extensions.len(),
            "Loaded registry"
        );

        Ok(Self {
            db,
            catalog,
            signal_types,
            apis,
            extensions,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &ExtensionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn signal_types(&self) -> &SignalTypeMapping {
        &self.signal_types
    }

    #[must_use]
    pub fn apis(&self) -> &ApiMapping {
        &self.apis
    }

    /// Manifests of the extensions currently loaded
    #[must_use]
    pub fn extensions(&self) -> &[ExtensionManifest] {
        &self.extensions
    }

    #[must_use]
    pub fn collab_store(&self) -> SqliteCollabStore<'db> {
        SqliteCollabStore::new(self.db.connection())
    }

    #[must_use]
    pub fn settings_store(&self) -> SettingsStore<'db> {
        SettingsStore::new(self.db.connection())
    }

    #[must_use]
    pub fn extension_store(&self) -> ExtensionStore<'db> {
        ExtensionStore::new(self.db.connection())
    }

    /// Validate an extension and, only if it passes, persist its reference
    ///
    /// Returns the manifest and the API instances it contributed.
    ///
    /// # Errors
    /// - `ExtensionAlreadyAdded` if the module is already in the list
    /// - `UnknownExtension` if the catalog cannot resolve it
    /// - any validation error from [`validate`]
    pub fn add_extension(
        &self,
        module: &str,
    ) -> SigexResult<(ExtensionManifest, Vec<Arc<dyn SignalExchangeApi>>)> {
        let store = self.extension_store();
        if store.contains(module)? {
            return Err(SigexError::ExtensionAlreadyAdded(module.to_string()));
        }

        let manifest = self.catalog.load(module)?;
        let apis = validate(
            &manifest,
            self.signal_types.content_types(),
            self.signal_types.signal_types(),
            &self.apis.instances(),
        )?;

        if !store.add(module)? {
            return Err(SigexError::ExtensionAlreadyAdded(module.to_string()));
        }
        debug!(module = %module, apis = apis.len(), "Added extension");
        Ok((manifest, apis))
    }

    /// Drop a module reference; nothing is re-validated
    ///
    /// # Errors
    /// Returns `ExtensionNotAdded` if the module is not in the list
    pub fn remove_extension(&self, module: &str) -> SigexResult<()> {
        if !self.extension_store().remove(module)? {
            return Err(SigexError::ExtensionNotAdded(module.to_string()));
        }
        debug!(module = %module, "Removed extension");
        Ok(())
    }
}
