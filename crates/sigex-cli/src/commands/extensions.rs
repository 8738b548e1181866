//! Extension CLI commands
//!
//! Handles: sigex config extensions list/add/remove

use clap::Subcommand;

use sigex_core::extension::ExtensionManifest;
use sigex_core::Settings;

/// Extension commands
#[derive(Subcommand)]
pub enum ExtensionCommands {
    /// List added extensions, or show what one module contributes
    List {
        /// Module to show
        module: Option<String>,
    },
    /// Validate and add an extension module
    Add {
        /// Module reference, e.g. sigex.extensions.tlsh
        module: String,
    },
    /// Remove an extension module
    Remove {
        /// Module reference
        module: String,
    },
}

/// Execute an extension command
pub fn execute(
    action: ExtensionCommands,
    settings: &Settings<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ExtensionCommands::List { module: Some(module) } => {
            let manifest = settings.catalog().load(&module)?;
            print!("{}", format_manifest(&manifest, 0));
        }
        ExtensionCommands::List { module: None } => {
            for module in settings.extension_store().list()? {
                println!("{module}");
                match settings.catalog().load(&module) {
                    Ok(manifest) => print!("{}", format_manifest(&manifest, 2)),
                    Err(e) => println!("  ({e})"),
                }
            }
        }
        ExtensionCommands::Add { module } => {
            let (manifest, _) = settings.add_extension(&module)?;
            print!("{}", format_manifest(&manifest, 0));
        }
        ExtensionCommands::Remove { module } => settings.remove_extension(&module)?,
    }
    Ok(())
}

/// Render a manifest as indented `Signal:` / `Content:` / `API:` sections
fn format_manifest(manifest: &ExtensionManifest, indent: usize) -> String {
    let space = " ".repeat(indent);
    let mut out = String::new();

    let mut section = |title: &str, entries: Vec<(&str, &str)>| {
        if entries.is_empty() {
            return;
        }
        out.push_str(&format!("{space}{title}:\n"));
        for (name, qualified_name) in entries {
            out.push_str(&format!("{space}  {name} - {qualified_name}\n"));
        }
    };

    section(
        "Signal",
        manifest
            .signal_types
            .iter()
            .map(|s| (s.name.as_str(), s.qualified_name.as_str()))
            .collect(),
    );
    section(
        "Content",
        manifest
            .content_types
            .iter()
            .map(|c| (c.name.as_str(), c.qualified_name.as_str()))
            .collect(),
    );
    section(
        "API",
        manifest
            .apis
            .iter()
            .map(|a| (a.name, a.qualified_name))
            .collect(),
    );

    out
}
