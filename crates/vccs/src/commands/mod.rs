//! Command dispatch: bridges CLI args -> session / offline engine -> output.

pub mod config_cmd;
pub mod dial;
pub mod directory;
pub mod positions;
pub mod run;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a facility- or backend-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, global).await,
        Command::Directory(args) => directory::handle(args, global).await,
        Command::Dial(args) => dial::handle(args, global).await,
        Command::Positions => positions::handle(global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
