//! Command synthesis: field descriptors -> clap argument surface

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use serde_json::Value;

use super::edit::EditArgs;
use crate::error::{SigexError, SigexResult};
use crate::schema::{FieldDescriptor, TypeTag};

pub const ARG_COLLAB_NAME: &str = "collab_name";
pub const ARG_CREATE: &str = "create";
pub const ARG_ENABLE: &str = "enable";
pub const ARG_DISABLE: &str = "disable";
pub const ARG_JSON: &str = "is_json";

const GROUP_ON_OFF: &str = "on_off";

/// Ids and long flags owned by the fixed part of every surface
const RESERVED: [&str; 7] = [
    ARG_COLLAB_NAME,
    ARG_CREATE,
    ARG_ENABLE,
    ARG_DISABLE,
    ARG_JSON,
    "json",
    "help",
];

/// Summary of one generated field flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceArg {
    pub id: String,
    pub long: String,
    pub value_name: String,
    /// Must be supplied when creating
    pub required: bool,
    pub possible_values: Vec<String>,
}

/// The CLI editing surface generated for one API
#[derive(Debug, Clone)]
pub struct CommandSurface {
    pub api: String,
    pub command: Command,
    pub descriptors: Vec<FieldDescriptor>,
    pub field_args: Vec<SurfaceArg>,
}

/// Build the `config collab edit <api>` surface for an API
///
/// # Errors
/// Returns a schema error if a field would shadow one of the fixed flags
pub fn synthesize(api: &str, descriptors: &[FieldDescriptor]) -> SigexResult<CommandSurface> {
    let mut command = Command::new(api.to_string())
        .about(format!("Create or edit collaborations for the {api} api"))
        .long_about(format!(
            "Create or edit collaborations for the {api} api\n\n\
             Generated from the collab schema, so not everything may be documented."
        ))
        .arg(
            Arg::new(ARG_COLLAB_NAME)
                .required(true)
                .help("the name of the collab (or a JSON object with --json)"),
        )
        .arg(
            Arg::new(ARG_CREATE)
                .long("create")
                .short('C')
                .action(ArgAction::SetTrue)
                .help("indicate you intend to create a config"),
        )
        .arg(
            Arg::new(ARG_ENABLE)
                .long("enable")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("1")
                .value_parser(value_parser!(u8).range(0..=1))
                .help("enable the config (default on create)"),
        )
        .arg(
            Arg::new(ARG_DISABLE)
                .long("disable")
                .action(ArgAction::SetTrue)
                .help("disable the config"),
        )
        .group(
            ArgGroup::new(GROUP_ON_OFF)
                .args([ARG_ENABLE, ARG_DISABLE])
                .multiple(false),
        )
        .arg(
            Arg::new(ARG_JSON)
                .long("json")
                .short('J')
                .action(ArgAction::SetTrue)
                .help("instead, interpret the argument as JSON and use that to edit the config"),
        );

    let mut field_args = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let long = descriptor.flag();
        if RESERVED.contains(&descriptor.name.as_str()) || RESERVED.contains(&long.as_str()) {
            return Err(SigexError::schema(
                api,
                format!("field '{}' collides with a built-in flag", descriptor.name),
            ));
        }
        command = command.arg(field_arg(descriptor));
        field_args.push(SurfaceArg {
            id: descriptor.name.clone(),
            long,
            value_name: descriptor.metavar.clone(),
            required: descriptor.required(),
            possible_values: descriptor.enum_values.clone(),
        });
    }

    Ok(CommandSurface {
        api: api.to_string(),
        command,
        descriptors: descriptors.to_vec(),
        field_args,
    })
}

fn field_arg(descriptor: &FieldDescriptor) -> Arg {
    let mut help = descriptor.help_text.clone();
    if descriptor.required() {
        help.push_str(" [required on create]");
    }

    let arg = Arg::new(descriptor.name.clone())
        .long(descriptor.flag())
        .value_name(descriptor.metavar.clone())
        .help(help);

    match descriptor.arg_type() {
        TypeTag::List(inner) => with_parser(arg, inner)
            .action(ArgAction::Append)
            .value_delimiter(','),
        scalar => with_parser(arg, scalar).action(ArgAction::Set),
    }
}

fn with_parser(arg: Arg, ty: &TypeTag) -> Arg {
    match ty.unwrapped() {
        TypeTag::Int => arg.value_parser(value_parser!(i64)),
        TypeTag::Float => arg.value_parser(finite_float),
        TypeTag::Bool => arg.value_parser(value_parser!(bool)),
        TypeTag::Enum(spec) => arg.value_parser(PossibleValuesParser::new(spec.members.clone())),
        TypeTag::Str | TypeTag::Optional(_) | TypeTag::List(_) => {
            arg.value_parser(value_parser!(String))
        }
    }
}

/// JSON has no NaN or infinity, so neither may a flag
fn finite_float(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

impl CommandSurface {
    /// Reject field flags that would shadow an argument defined further up
    /// the command tree (ids or long names in `reserved`)
    ///
    /// # Errors
    /// Returns a schema error naming the first colliding field
    pub fn ensure_no_collision<'a>(
        &self,
        reserved: impl IntoIterator<Item = &'a str>,
    ) -> SigexResult<()> {
        let reserved: Vec<&str> = reserved.into_iter().collect();
        match self
            .field_args
            .iter()
            .find(|a| reserved.contains(&a.id.as_str()) || reserved.contains(&a.long.as_str()))
        {
            Some(arg) => Err(SigexError::schema(
                &self.api,
                format!("field '{}' collides with the global --{} flag", arg.id, arg.long),
            )),
            None => Ok(()),
        }
    }

    /// Extract resolver input from matches produced by `self.command`
    ///
    /// # Errors
    /// Returns a user-input error if the positional is missing
    pub fn edit_args(&self, matches: &ArgMatches) -> SigexResult<EditArgs> {
        let collab_name = matches
            .get_one::<String>(ARG_COLLAB_NAME)
            .cloned()
            .ok_or_else(|| SigexError::UserInput("collab_name is required".into()))?;

        let enable = if matches.get_flag(ARG_DISABLE) {
            Some(0)
        } else {
            matches.get_one::<u8>(ARG_ENABLE).copied()
        };

        let fields = self
            .descriptors
            .iter()
            .filter_map(|d| field_value(matches, d).map(|v| (d.name.clone(), v)))
            .collect();

        Ok(EditArgs {
            collab_name,
            create: matches.get_flag(ARG_CREATE),
            enable,
            is_json: matches.get_flag(ARG_JSON),
            fields,
        })
    }
}

/// The parsed value of a field flag, or `None` if the flag was not given
fn field_value(matches: &ArgMatches, descriptor: &FieldDescriptor) -> Option<Value> {
    let id = descriptor.name.as_str();
    match descriptor.arg_type() {
        TypeTag::List(inner) => {
            let values: Vec<Value> = match inner.unwrapped() {
                TypeTag::Int => matches.get_many::<i64>(id)?.map(|v| Value::from(*v)).collect(),
                TypeTag::Float => matches.get_many::<f64>(id)?.map(|v| Value::from(*v)).collect(),
                TypeTag::Bool => matches.get_many::<bool>(id)?.map(|v| Value::Bool(*v)).collect(),
                _ => matches
                    .get_many::<String>(id)?
                    .map(|v| Value::String(v.clone()))
                    .collect(),
            };
            Some(Value::Array(values))
        }
        TypeTag::Int => matches.get_one::<i64>(id).map(|v| Value::from(*v)),
        TypeTag::Float => matches.get_one::<f64>(id).map(|v| Value::from(*v)),
        TypeTag::Bool => matches.get_one::<bool>(id).map(|v| Value::Bool(*v)),
        _ => matches
            .get_one::<String>(id)
            .map(|v| Value::String(v.clone())),
    }
}
