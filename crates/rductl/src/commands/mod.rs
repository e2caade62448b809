//! Command handlers, one module per subcommand.

pub mod config_cmd;
pub mod export;
pub mod import;
pub mod reset;
pub mod show;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;
use crate::output::Ui;

/// Run a command that talks to the provisioning server.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let ui = Ui::new(global, &cfg.defaults);
    match cmd {
        Command::Export(args) => export::handle(args, global, cfg, ui).await,
        Command::Import(args) => import::handle(args, global, cfg, ui).await,
        Command::Reset(args) => reset::handle(&args, global, cfg, ui).await,
        Command::Show(args) => show::handle(&args, global, cfg, ui).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the server dispatcher".into(),
        )),
    }
}
