use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rex",
    about = "Round exporter — ingest validated blocks into a storage engine",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List available exporters
    Plugins,
    /// Print an exporter's sample configuration
    SampleConfig(SampleConfigArgs),
    /// Parse and validate a configuration file
    CheckConfig(CheckConfigArgs),
    /// Feed synthetic rounds through an exporter
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct SampleConfigArgs {
    #[arg(long, default_value = rex_exporter::PLUGIN_NAME)]
    pub exporter: String,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    pub config: PathBuf,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Exporter configuration file (TOML)
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(long, default_value = rex_exporter::PLUGIN_NAME)]
    pub exporter: String,
    /// Number of rounds to deliver
    #[arg(short = 'n', long, default_value = "100")]
    pub rounds: u64,
    /// Network name used for the synthetic genesis
    #[arg(long, default_value = "devnet")]
    pub network: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_replay() {
        let cli = Cli::try_parse_from(["rex", "replay", "-c", "rex.toml", "-n", "5"]).unwrap();
        match cli.command {
            Command::Replay(args) => {
                assert_eq!(args.rounds, 5);
                assert_eq!(args.exporter, rex_exporter::PLUGIN_NAME);
                assert_eq!(args.config, PathBuf::from("rex.toml"));
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn parses_json_format() {
        let cli = Cli::try_parse_from(["rex", "plugins", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
