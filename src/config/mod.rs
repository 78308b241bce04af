pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::RaffleConfig;
    use crate::utils::error::Result;
    use crate::utils::validation::Validate;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "raffle")]
    #[command(about = "Draw unique numbers from 1..=N, one suspenseful reveal at a time")]
    pub struct CliConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Pool size offered at the prompt
        #[arg(long)]
        pub pool_size: Option<u32>,

        /// Directory holding the saved session
        #[arg(long)]
        pub storage_dir: Option<String>,

        /// Number of decoys shown before each result
        #[arg(long)]
        pub ticks: Option<u32>,

        /// Log output format: compact or json
        #[arg(long)]
        pub log_format: Option<String>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// Loads the config file (or defaults), applies flag overrides and validates.
        pub fn resolve(&self) -> Result<RaffleConfig> {
            let mut config = match &self.config {
                Some(path) => RaffleConfig::from_file(path)?,
                None => RaffleConfig::default(),
            };

            if let Some(size) = self.pool_size {
                config.pool.default_size = size;
            }
            if let Some(dir) = &self.storage_dir {
                config.storage.dir = dir.clone();
            }
            if let Some(ticks) = self.ticks {
                config.reveal.ticks = ticks;
            }
            if let Some(format) = &self.log_format {
                config.logging.format = format.clone();
            }

            config.validate()?;
            Ok(config)
        }
    }

}
