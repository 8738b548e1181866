//! Collaboration CLI commands
//!
//! Handles: sigex config collab list/edit/delete

use clap::{ArgMatches, Command, Subcommand};

use sigex_core::command::{resolve, CommandSurface};
use sigex_core::{CollabMediator, Settings, SigexError, SigexResult};

/// Collaboration commands
#[derive(Subcommand)]
pub enum CollabCommands {
    /// List all collaborations
    List,
    /// Create or edit a collaboration (one subcommand per api)
    Edit,
    /// Delete a collaboration
    Delete {
        /// The collab to delete
        collab_name: String,
    },
}

/// Attach the generated edit surfaces under `config collab edit`
///
/// # Errors
/// Returns a schema error if a surface field would shadow a global flag
pub fn with_edit_surfaces(cli: Command, surfaces: &[CommandSurface]) -> SigexResult<Command> {
    let global: Vec<String> = cli
        .get_arguments()
        .flat_map(|a| std::iter::once(a.get_id().to_string()).chain(a.get_long().map(String::from)))
        .collect();
    for surface in surfaces {
        surface.ensure_no_collision(global.iter().map(String::as_str))?;
    }

    Ok(cli.mut_subcommand("config", |config| {
        config.mut_subcommand("collab", |collab| {
            collab.mut_subcommand("edit", |edit| {
                surfaces.iter().fold(
                    edit.subcommand_required(true)
                        .arg_required_else_help(true)
                        .subcommand_value_name("API"),
                    |edit, surface| edit.subcommand(surface.command.clone()),
                )
            })
        })
    }))
}

/// Execute a collab command
pub fn execute(
    action: CollabCommands,
    settings: &Settings<'_>,
    surfaces: &[CommandSurface],
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = settings.collab_store();
    let mediator = CollabMediator::new(&store);

    match action {
        CollabCommands::List => {
            for collab in mediator.list()? {
                println!("{} {}", collab.api, collab.name);
            }
        }
        CollabCommands::Edit => {
            let (api, api_matches) = edit_matches(matches).ok_or_else(|| {
                SigexError::Internal("edit was parsed without an api subcommand".into())
            })?;
            let registered = settings
                .apis()
                .get(api)
                .ok_or_else(|| SigexError::Internal(format!("no api named {api}")))?;
            let surface = surfaces
                .iter()
                .find(|s| s.api == api)
                .ok_or_else(|| SigexError::Internal(format!("no edit surface for {api}")))?;

            let args = surface.edit_args(api_matches)?;
            let resolved = resolve(api, &surface.descriptors, &args)?;
            mediator.apply(&registered.schema, &resolved)?;
        }
        CollabCommands::Delete { collab_name } => {
            mediator.delete(&collab_name)?;
        }
    }

    Ok(())
}

/// Walk `config collab edit <api>` down to the generated subcommand
fn edit_matches(matches: &ArgMatches) -> Option<(&str, &ArgMatches)> {
    let (_, config) = matches.subcommand()?;
    let (_, collab) = config.subcommand()?;
    let (_, edit) = collab.subcommand()?;
    edit.subcommand()
}
