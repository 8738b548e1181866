//! Extension manifests and the catalog that resolves module references

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{SigexError, SigexResult};
use crate::registry::{ApiFactory, ApiType, ContentType, SignalExchangeApi, SignalType};
use crate::schema::{CollabSchema, EnumSpec, FieldSpec, TypeTag};

/// Types and APIs contributed by one extension module
#[derive(Debug, Clone)]
pub struct ExtensionManifest {
    /// The module reference this manifest was loaded from
    pub module: String,
    pub content_types: Vec<ContentType>,
    pub signal_types: Vec<SignalType>,
    pub apis: Vec<ApiType>,
}

impl ExtensionManifest {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            content_types: Vec::new(),
            signal_types: Vec::new(),
            apis: Vec::new(),
        }
    }

    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_types.push(content_type);
        self
    }

    #[must_use]
    pub fn signal_type(mut self, signal_type: SignalType) -> Self {
        self.signal_types.push(signal_type);
        self
    }

    #[must_use]
    pub fn api(mut self, api: ApiType) -> Self {
        self.apis.push(api);
        self
    }
}

/// Builds a manifest on demand
pub type ManifestLoader = fn() -> ExtensionManifest;

/// Compiled-in table of module reference -> manifest
#[derive(Debug, Clone)]
pub struct ExtensionCatalog {
    entries: BTreeMap<String, ManifestLoader>,
}

impl Default for ExtensionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ExtensionCatalog {
    /// A catalog with no modules
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The modules distributed with sigex
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with(TLSH_MODULE, tlsh_manifest)
            .with(HASHLIST_MODULE, hashlist_manifest)
    }

    /// Register a module
    #[must_use]
    pub fn with(mut self, module: impl Into<String>, loader: ManifestLoader) -> Self {
        self.entries.insert(module.into(), loader);
        self
    }

    /// Resolve a module reference to its manifest
    ///
    /// # Errors
    /// Returns `UnknownExtension` if no such module is in the catalog
    pub fn load(&self, module: &str) -> SigexResult<ExtensionManifest> {
        let loader = self
            .entries
            .get(module)
            .ok_or_else(|| SigexError::UnknownExtension(module.to_string()))?;
        Ok(loader())
    }
}

pub const TLSH_MODULE: &str = "sigex.extensions.tlsh";
pub const HASHLIST_MODULE: &str = "sigex.extensions.hashlist";

fn tlsh_manifest() -> ExtensionManifest {
    ExtensionManifest::new(TLSH_MODULE).signal_type(SignalType::new(
        "tlsh",
        "sigex.extensions.tlsh::TlshSignal",
        &["text"],
    ))
}

fn hashlist_manifest() -> ExtensionManifest {
    let factory: ApiFactory = || Ok(Arc::new(HashlistApi));

    ExtensionManifest::new(HASHLIST_MODULE)
        .content_type(ContentType::new(
            "file",
            "sigex.extensions.hashlist::FileContent",
        ))
        .signal_type(SignalType::new(
            "file_sha256",
            "sigex.extensions.hashlist::FileSha256Signal",
            &["file"],
        ))
        .api(ApiType {
            name: "hashlist",
            qualified_name: "sigex.extensions.hashlist::HashlistApi",
            factory,
        })
}

/// Hashes published as a plain list at a URL
struct HashlistApi;

impl SignalExchangeApi for HashlistApi {
    fn name(&self) -> &str {
        "hashlist"
    }

    fn qualified_name(&self) -> &str {
        "sigex.extensions.hashlist::HashlistApi"
    }

    fn collab_schema(&self) -> CollabSchema {
        CollabSchema::new("hashlist")
            .field(
                FieldSpec::required("url", TypeTag::Str)
                    .help("where the hash list is published")
                    .metavar("URL"),
            )
            .field(FieldSpec::with_default(
                "format",
                TypeTag::Enum(EnumSpec::new("HashlistFormat", &["csv", "json"])),
                json!("csv"),
            ))
    }
}
