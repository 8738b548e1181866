//! API configuration CLI commands
//!
//! Handles: sigex config api [fb_threatexchange|ncmec]

use clap::{Args, Subcommand};
use serde_json::json;

use sigex_core::command::EditSet;
use sigex_core::registry::builtin::FB_THREATEXCHANGE;
use sigex_core::storage::settings::{FB_THREATEXCHANGE_API_TOKEN, NCMEC_CREDENTIALS};
use sigex_core::{CollabMediator, Settings, SigexError, SigexResult};
use sigex_remote::{
    is_valid_app_token, PrivacyGroup, PrivacyGroupSource, RemoteError, ThreatExchangeClient,
};

/// Overrides the Graph API base url when set
const BASE_URL_ENV: &str = "SIGEX_TE_BASE_URL";

/// Per-API configuration commands
#[derive(Subcommand)]
pub enum ApiCommands {
    /// Configure Facebook ThreatExchange integration
    #[command(name = "fb_threatexchange")]
    FbThreatExchange(ThreatExchangeArgs),
    /// Configure NCMEC hash api integration
    Ncmec {
        /// Set the username and password to access the NCMEC API
        #[arg(long, num_args = 2, value_names = ["USER", "PASSWORD"])]
        credentials: Option<Vec<String>>,
    },
}

/// Arguments for `sigex config api fb_threatexchange`
#[derive(Args)]
#[group(multiple = false)]
pub struct ThreatExchangeArgs {
    /// Query the API to list available collabs
    #[arg(short = 'L', long)]
    pub list_available_collabs: bool,

    /// Import a collaboration by privacy group ID
    #[arg(short = 'I', long, value_name = "ID")]
    pub import_collab: Option<i64>,

    /// Set the default api token (https://developers.facebook.com/tools/accesstoken/)
    #[arg(long, value_name = "TOKEN")]
    pub api_token: Option<String>,
}

/// Execute an API command; with no subcommand, list API names
pub fn execute(
    action: Option<ApiCommands>,
    settings: &Settings<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        None => {
            let mut names: Vec<_> = settings.apis().names().collect();
            names.sort_unstable();
            for name in names {
                println!("{name}");
            }
        }
        Some(ApiCommands::FbThreatExchange(args)) => execute_threatexchange(&args, settings)?,
        Some(ApiCommands::Ncmec { credentials }) => {
            if let Some([user, password]) = credentials.as_deref() {
                settings
                    .settings_store()
                    .set(NCMEC_CREDENTIALS, &(user, password))?;
            }
        }
    }
    Ok(())
}

fn execute_threatexchange(args: &ThreatExchangeArgs, settings: &Settings<'_>) -> SigexResult<()> {
    if args.list_available_collabs {
        let groups = block_on(settings, |client| async move { client.privacy_groups().await })?;
        let mut groups: Vec<_> = groups.into_iter().filter(|g| g.threat_updates_enabled).collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        for group in &groups {
            println!("{}", format_group(group));
        }
    } else if let Some(id) = args.import_collab {
        let group = block_on(settings, |client| async move { client.privacy_group(id).await })?;
        let registered = settings
            .apis()
            .get(FB_THREATEXCHANGE)
            .ok_or_else(|| SigexError::Internal(format!("{FB_THREATEXCHANGE} is not registered")))?;

        let mut fields = EditSet::new();
        fields.set("privacy_group", json!(id));

        let store = settings.collab_store();
        CollabMediator::new(&store).import(&group.name, &registered.schema, fields)?;
    } else if let Some(token) = &args.api_token {
        if !is_valid_app_token(token) {
            return Err(SigexError::InvalidValue {
                field: "api_token".into(),
                message: "expected an app token of the form <app id>|<secret>".into(),
            });
        }
        settings
            .settings_store()
            .set(FB_THREATEXCHANGE_API_TOKEN, token)?;
    }
    Ok(())
}

fn format_group(group: &PrivacyGroup) -> String {
    format!("{} {} - {}", group.id, group.name, group.description).replace('\n', " ")
}

/// Run one remote call against the stored token on a throwaway runtime
fn block_on<T, F, Fut>(settings: &Settings<'_>, call: F) -> SigexResult<T>
where
    F: FnOnce(ThreatExchangeClient) -> Fut,
    Fut: std::future::Future<Output = Result<T, RemoteError>>,
{
    let token: Option<String> = settings.settings_store().get(FB_THREATEXCHANGE_API_TOKEN)?;
    let mut client = ThreatExchangeClient::new(token.unwrap_or_default()).map_err(remote_error)?;
    if let Some(base_url) = std::env::var(BASE_URL_ENV).ok().filter(|url| !url.is_empty()) {
        client = client.with_base_url(base_url);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SigexError::Internal(format!("Failed to start runtime: {e}")))?;
    runtime.block_on(call(client)).map_err(remote_error)
}

fn remote_error(e: RemoteError) -> SigexError {
    match e {
        RemoteError::MissingToken => SigexError::UserInput(e.to_string()),
        other => SigexError::Remote(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_group_flattens_newlines() {
        let group = PrivacyGroup {
            id: 7,
            name: "Group".into(),
            description: "line one\nline two".into(),
            threat_updates_enabled: true,
        };
        assert_eq!(format_group(&group), "7 Group - line one line two");
    }
}
