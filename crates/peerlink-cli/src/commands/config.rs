//! Show the configuration.

use anyhow::Result;

use peerlink_core::config::Config;

use super::{ConfigAction, ConfigArgs};

/// Run the config command.
pub fn run(args: &ConfigArgs) -> Result<()> {
    match args.action {
        None | Some(ConfigAction::Show) => {
            let config = super::load_config();
            print!("{}", config.to_toml_string()?);
        }
        Some(ConfigAction::Path) => match Config::default_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("No platform config directory available."),
        },
    }
    Ok(())
}
