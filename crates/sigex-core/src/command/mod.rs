//! Generated collab editing commands
//!
//! `synth` turns field descriptors into a clap surface once per API;
//! `edit` resolves a parsed invocation into the edit set handed to the
//! mediator.

mod edit;
mod synth;

pub use edit::{resolve, EditArgs, EditSet, ResolvedEdit};
pub use synth::{
    synthesize, CommandSurface, SurfaceArg, ARG_COLLAB_NAME, ARG_CREATE, ARG_DISABLE, ARG_ENABLE,
    ARG_JSON,
};
