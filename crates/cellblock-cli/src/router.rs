//! Command routing logic for CLI

use anyhow::Result;

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> Result<()> {
    let config_file = cli.config_file.as_path();
    match cli.command {
        Commands::Run {
            file,
            stdin,
            user,
            pretty,
        } => commands::run::run(config_file, &file, &stdin, &user, pretty).await,
        Commands::Check { file } => commands::run::check(config_file, &file),
        Commands::ServeJson => commands::serve::serve_json(config_file).await,
        Commands::Examples => commands::examples::show(),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(config_file),
            ConfigAction::Validate => commands::config::validate(config_file),
        },
    }
}
