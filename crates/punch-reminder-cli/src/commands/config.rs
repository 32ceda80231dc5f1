use clap::Subcommand;
use punch_reminder_core::{Config, FileConfigSource};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "office_lat", "threshold_meters")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(source: &FileConfigSource, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(source.path())?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(source.path())?;
            config.set(&key, &value)?;
            config.save_to(source.path())?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load_from(source.path())?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            Config::default().save_to(source.path())?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", source.path().display());
        }
    }
    Ok(())
}
