//! Config command - View and initialize configuration

use anyhow::{Context, Result};
use clap::Subcommand;
use codelore_config::ConfigLoader;

use super::{load_config, print_info, resolve_workspace};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show(ShowArgs),

    /// Write a default local config (.codelore/config.toml)
    Init,
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global),
        ConfigCommand::Init => execute_init(global),
    }
}

fn execute_show(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(&global)?;
    let config = load_config(&global, &workspace)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to render configuration")?
        );
    }

    Ok(())
}

fn execute_init(global: GlobalOptions) -> Result<()> {
    let workspace = resolve_workspace(&global)?;
    let loader = ConfigLoader::new();

    let existed = loader.local_config_path(&workspace).exists();
    let path = loader
        .init_local(&workspace)
        .context("Failed to initialize local config")?;

    if existed {
        print_info(
            &format!("Config already exists at {}", path.display()),
            global.quiet,
        );
    } else {
        print_info(&format!("Created {}", path.display()), global.quiet);
    }

    Ok(())
}
