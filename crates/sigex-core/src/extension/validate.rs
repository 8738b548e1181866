//! Dry-run checks for adding an extension to the registry

use std::sync::Arc;
use tracing::debug;

use super::ExtensionManifest;
use crate::error::{SigexError, SigexResult};
use crate::registry::{ApiMapping, ContentType, SignalExchangeApi, SignalType, SignalTypeMapping};
use crate::schema::describe;

/// Check that `manifest` can join the current registry
///
/// Builds the combined content/signal and API registries without touching
/// the live ones. Every candidate API is constructed once; those instances
/// are returned so the caller can report them.
///
/// # Errors
/// - `DuplicateRegistration` when a candidate name is already taken
/// - `IncompatibleSignalType` when a signal type has no known content type
/// - `Instantiation` when a candidate API cannot be constructed or
///   declares a malformed collab schema
pub fn validate(
    manifest: &ExtensionManifest,
    content_types: &[ContentType],
    signal_types: &[SignalType],
    apis: &[Arc<dyn SignalExchangeApi>],
) -> SigexResult<Vec<Arc<dyn SignalExchangeApi>>> {
    debug!(
        module = %manifest.module,
        content_types = manifest.content_types.len(),
        signal_types = manifest.signal_types.len(),
        apis = manifest.apis.len(),
        "Validating extension"
    );

    SignalTypeMapping::new(
        content_types
            .iter()
            .chain(&manifest.content_types)
            .cloned()
            .collect(),
        signal_types
            .iter()
            .chain(&manifest.signal_types)
            .cloned()
            .collect(),
    )?;

    let mut candidates = Vec::with_capacity(manifest.apis.len());
    for api_type in &manifest.apis {
        let api = api_type.instantiate()?;
        describe(&api.collab_schema()).map_err(|e| SigexError::Instantiation {
            api: api_type.qualified_name.to_string(),
            message: e.to_string(),
        })?;
        candidates.push(api);
    }

    ApiMapping::new(apis.iter().chain(&candidates).cloned().collect())?;

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionCatalog, HASHLIST_MODULE, TLSH_MODULE};
    use crate::registry::{builtin, ApiType};

    fn current_apis() -> Vec<Arc<dyn SignalExchangeApi>> {
        builtin::api_types()
            .iter()
            .map(|t| t.instantiate().unwrap())
            .collect()
    }

    #[test]
    fn test_builtin_extensions_validate() {
        let catalog = ExtensionCatalog::builtin();
        for module in [TLSH_MODULE, HASHLIST_MODULE] {
            let manifest = catalog.load(module).unwrap();
            validate(
                &manifest,
                &builtin::content_types(),
                &builtin::signal_types(),
                &current_apis(),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_returns_candidate_instances() {
        let manifest = ExtensionCatalog::builtin().load(HASHLIST_MODULE).unwrap();
        let apis = validate(
            &manifest,
            &builtin::content_types(),
            &builtin::signal_types(),
            &current_apis(),
        )
        .unwrap();
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].name(), "hashlist");
    }

    #[test]
    fn test_rejects_duplicate_signal_type() {
        let manifest = ExtensionManifest::new("dupe").signal_type(SignalType::new(
            "pdq",
            "dupe::Pdq",
            &["photo"],
        ));
        let err = validate(
            &manifest,
            &builtin::content_types(),
            &builtin::signal_types(),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SigexError::DuplicateRegistration { .. }));
    }

    #[test]
    fn test_rejects_api_name_collision() {
        let mut manifest = ExtensionManifest::new("dupe");
        manifest.apis.push(ApiType {
            qualified_name: "dupe::Ncmec",
            ..builtin::api_types()[1]
        });
        let err = validate(
            &manifest,
            &builtin::content_types(),
            &builtin::signal_types(),
            &current_apis(),
        )
        .unwrap_err();
        assert!(matches!(err, SigexError::DuplicateRegistration { kind: "api", .. }));
    }

    #[test]
    fn test_failing_factory_names_api() {
        let manifest = ExtensionManifest::new("broken").api(ApiType {
            name: "broken",
            qualified_name: "broken::BrokenApi",
            factory: || Err("missing credentials file".into()),
        });
        let err = validate(&manifest, &[], &[], &[]).unwrap_err();
        assert!(err.to_string().contains("broken::BrokenApi"));
        assert!(err.to_string().contains("missing credentials file"));
    }
}
