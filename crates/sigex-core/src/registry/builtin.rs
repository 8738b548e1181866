//! Types and APIs that ship with sigex

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::api::{ApiFactory, ApiType, SignalExchangeApi};
use super::content::{ContentType, SignalType};
use crate::schema::{CollabSchema, EnumSpec, FieldSpec, TypeTag};

pub const FB_THREATEXCHANGE: &str = "fb_threatexchange";
pub const NCMEC: &str = "ncmec";
pub const LOCAL_FILE: &str = "local_file";
pub const SAMPLE: &str = "sample";

macro_rules! qualified {
    ($ty:literal) => {
        concat!(module_path!(), "::", $ty)
    };
}

/// Built-in content types
#[must_use]
pub fn content_types() -> Vec<ContentType> {
    vec![
        ContentType::new("photo", qualified!("PhotoContent")),
        ContentType::new("video", qualified!("VideoContent")),
        ContentType::new("text", qualified!("TextContent")),
        ContentType::new("url", qualified!("UrlContent")),
    ]
}

/// Built-in signal types
#[must_use]
pub fn signal_types() -> Vec<SignalType> {
    vec![
        SignalType::new("pdq", qualified!("PdqSignal"), &["photo"]),
        SignalType::new("video_md5", qualified!("VideoMd5Signal"), &["video"]),
        SignalType::new("raw_text", qualified!("RawTextSignal"), &["text"]),
        SignalType::new("url", qualified!("UrlSignal"), &["url"]),
    ]
}

/// Registration table of built-in APIs
#[must_use]
pub fn api_types() -> Vec<ApiType> {
    fn entry<T: SignalExchangeApi + Default + 'static>(
        name: &'static str,
        qualified_name: &'static str,
    ) -> ApiType {
        let factory: ApiFactory = || Ok(Arc::new(T::default()));
        ApiType {
            name,
            qualified_name,
            factory,
        }
    }

    vec![
        entry::<FbThreatExchangeApi>(FB_THREATEXCHANGE, qualified!("FbThreatExchangeApi")),
        entry::<NcmecApi>(NCMEC, qualified!("NcmecApi")),
        entry::<LocalFileApi>(LOCAL_FILE, qualified!("LocalFileApi")),
        entry::<SampleApi>(SAMPLE, qualified!("SampleApi")),
    ]
}

/// Facebook ThreatExchange privacy groups
#[derive(Debug, Default)]
pub struct FbThreatExchangeApi;

/// Typed view of a `fb_threatexchange` collab's attributes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FbThreatExchangeCollab {
    pub privacy_group: i64,
    pub app_token_override: Option<String>,
}

impl SignalExchangeApi for FbThreatExchangeApi {
    fn name(&self) -> &str {
        FB_THREATEXCHANGE
    }

    fn qualified_name(&self) -> &str {
        qualified!("FbThreatExchangeApi")
    }

    fn collab_schema(&self) -> CollabSchema {
        CollabSchema::new(FB_THREATEXCHANGE)
            .field(
                FieldSpec::required("privacy_group", TypeTag::Int)
                    .help("the privacy group id to fetch signals from")
                    .metavar("ID"),
            )
            .field(
                FieldSpec::with_default(
                    "app_token_override",
                    TypeTag::optional(TypeTag::Str),
                    json!(null),
                )
                .help("use this app token instead of the configured default")
                .metavar("TOKEN"),
            )
    }
}

/// NCMEC hash sharing
#[derive(Debug, Default)]
pub struct NcmecApi;

impl SignalExchangeApi for NcmecApi {
    fn name(&self) -> &str {
        NCMEC
    }

    fn qualified_name(&self) -> &str {
        qualified!("NcmecApi")
    }

    fn collab_schema(&self) -> CollabSchema {
        CollabSchema::new(NCMEC)
            .field(
                FieldSpec::required(
                    "environment",
                    TypeTag::Enum(EnumSpec::new(
                        "NCMECEnvironment",
                        &["Industry", "Exploitative", "Test"],
                    )),
                )
                .help("which NCMEC hash sharing environment to use"),
            )
            .field(FieldSpec::with_default(
                "only_esp_ids",
                TypeTag::list(TypeTag::Int),
                json!([]),
            ))
    }
}

/// Signals read from a local file
#[derive(Debug, Default)]
pub struct LocalFileApi;

impl SignalExchangeApi for LocalFileApi {
    fn name(&self) -> &str {
        LOCAL_FILE
    }

    fn qualified_name(&self) -> &str {
        qualified!("LocalFileApi")
    }

    fn collab_schema(&self) -> CollabSchema {
        CollabSchema::new(LOCAL_FILE)
            .field(
                FieldSpec::required("filename", TypeTag::Str)
                    .help("path of the file to read signals from")
                    .metavar("PATH"),
            )
            .field(
                FieldSpec::with_default(
                    "signal_type",
                    TypeTag::optional(TypeTag::Str),
                    json!(null),
                )
                .help("interpret every line as this signal type"),
            )
    }
}

/// Fixed sample data, always present and never configurable
#[derive(Debug, Default)]
pub struct SampleApi;

impl SignalExchangeApi for SampleApi {
    fn name(&self) -> &str {
        SAMPLE
    }

    fn qualified_name(&self) -> &str {
        qualified!("SampleApi")
    }

    fn collab_schema(&self) -> CollabSchema {
        CollabSchema::new(SAMPLE)
    }

    fn is_sample(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ApiMapping, SignalTypeMapping};

    #[test]
    fn test_builtins_are_consistent() {
        SignalTypeMapping::new(content_types(), signal_types()).unwrap();

        let apis = api_types()
            .iter()
            .map(ApiType::instantiate)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let mapping = ApiMapping::new(apis).unwrap();

        let editable: Vec<_> = mapping.editable().map(|a| a.api.name()).collect();
        assert_eq!(editable, vec![FB_THREATEXCHANGE, NCMEC, LOCAL_FILE]);
    }

    #[test]
    fn test_ncmec_environment_metavar() {
        let ncmec: Arc<dyn SignalExchangeApi> = Arc::new(NcmecApi);
        let mapping = ApiMapping::new(vec![ncmec]).unwrap();
        let env = &mapping.get(NCMEC).unwrap().descriptors[0];
        assert!(env.is_enum);
        assert_eq!(env.metavar, "[Industry,Exploitative,Test]");
    }
}
