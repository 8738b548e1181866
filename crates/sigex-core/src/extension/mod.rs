//! Extension modules: manifests, the catalog, and install-time validation

mod manifest;
mod validate;

pub use manifest::{
    ExtensionCatalog, ExtensionManifest, ManifestLoader, HASHLIST_MODULE, TLSH_MODULE,
};
pub use validate::validate;
