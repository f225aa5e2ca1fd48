use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use rex_exporter::{
    Exporter, ExporterConfig, ExporterRegistry, IndexerExporter, PluginConfig, StaticInitProvider,
    PLUGIN_NAME,
};
use rex_store::InMemoryStorageEngine;
use rex_types::Round;
use tracing::warn;

use crate::cli::*;
use crate::synth::{self, SyntheticChain};

/// Composition root: the exporters this host knows about and the storage
/// backend they write to. This host ships without a SQL driver, so the
/// exporter writes to a process-local engine.
fn registry() -> anyhow::Result<ExporterRegistry> {
    let backend = Arc::new(InMemoryStorageEngine::new());
    let mut registry = ExporterRegistry::new();
    registry.register(PLUGIN_NAME, move || {
        Box::new(IndexerExporter::new(backend.clone())) as Box<dyn Exporter>
    })?;
    Ok(registry)
}

/// Dispatch a parsed command line.
pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let registry = registry()?;
    match cli.command {
        Command::Plugins => cmd_plugins(&registry, &cli.format),
        Command::SampleConfig(args) => cmd_sample_config(&registry, args),
        Command::CheckConfig(args) => cmd_check_config(args, &cli.format),
        Command::Replay(args) => cmd_replay(&registry, args, &cli.format).await,
    }
}

fn cmd_plugins(registry: &ExporterRegistry, format: &OutputFormat) -> anyhow::Result<()> {
    let metadata = registry.metadata();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metadata)?),
        OutputFormat::Text => {
            for meta in metadata {
                let deprecated = if meta.deprecated { " (deprecated)" } else { "" };
                println!("{}{}  {}", meta.name.bold(), deprecated.yellow(), meta.description);
            }
        }
    }
    Ok(())
}

fn cmd_sample_config(registry: &ExporterRegistry, args: SampleConfigArgs) -> anyhow::Result<()> {
    let exporter = registry.build(&args.exporter)?;
    print!("{}", exporter.metadata().sample_config);
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config: ExporterConfig = PluginConfig::from_file(&args.config)?.unmarshal()?;
    config.validate()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            println!("{} {} is valid", "✓".green().bold(), args.config.display());
            println!("  test mode: {}", config.test);
            println!("  max connections: {}", config.max_conn);
            if config.pruning_enabled() {
                println!("  retention: last {} rounds", config.delete_task.rounds.to_string().cyan());
            } else {
                println!("  retention: {}", "disabled".dimmed());
            }
        }
    }
    Ok(())
}

async fn cmd_replay(
    registry: &ExporterRegistry,
    args: ReplayArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let config = PluginConfig::from_file(&args.config)?;
    let genesis = synth::genesis(&args.network);
    let provider = StaticInitProvider::new(genesis.clone(), 0);

    let mut exporter = registry.build(&args.exporter)?;
    if let Err(e) = exporter.init(&provider, config).await {
        exporter.close().await?;
        return Err(e).context("exporter failed to initialize");
    }

    let mut chain = SyntheticChain::new(&genesis);
    let interrupt = Interrupt::on_ctrl_c();
    let result = deliver(exporter.as_mut(), &mut chain, args.rounds, &interrupt).await;

    let active_config = exporter.config();
    exporter.close().await?;
    let delivered = result?;

    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "exporter": args.exporter,
                "network": args.network,
                "rounds_delivered": delivered,
                "next_round": delivered,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Exported {} rounds to {}",
                "✓".green().bold(),
                delivered.to_string().bold(),
                args.exporter.yellow()
            );
            println!("  next round: {}", delivered.to_string().cyan());
            println!("{}", "Active configuration:".dimmed());
            print!("{active_config}");
        }
    }
    Ok(())
}

/// Set once Ctrl-C arrives. Only checked between rounds, so a block write in
/// flight always runs to completion.
#[derive(Clone, Default)]
struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    fn on_ctrl_c() -> Self {
        let interrupt = Self::default();
        let flag = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.trigger();
            }
        });
        interrupt
    }

    fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Feed rounds `0..rounds` to `exporter`, stopping early on interrupt.
/// Returns the number of rounds delivered.
async fn deliver(
    exporter: &mut dyn Exporter,
    chain: &mut SyntheticChain,
    rounds: Round,
    interrupt: &Interrupt,
) -> anyhow::Result<u64> {
    let mut delivered = 0u64;
    for round in 0..rounds {
        if interrupt.is_set() {
            warn!(round, "interrupted");
            break;
        }
        exporter
            .receive(chain.next_unit(round))
            .await
            .with_context(|| format!("exporting round {round}"))?;
        delivered += 1;
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_mode_exporter(genesis: &rex_types::GenesisDescriptor) -> Box<dyn Exporter> {
        let mut exporter = registry().unwrap().build(PLUGIN_NAME).unwrap();
        let provider = StaticInitProvider::new(genesis.clone(), 0);
        exporter
            .init(&provider, PluginConfig::from_toml("test = true"))
            .await
            .unwrap();
        exporter
    }

    #[tokio::test]
    async fn delivers_every_round_without_interrupt() {
        let genesis = synth::genesis("devnet");
        let mut exporter = test_mode_exporter(&genesis).await;
        let mut chain = SyntheticChain::new(&genesis);

        let delivered = deliver(exporter.as_mut(), &mut chain, 5, &Interrupt::default())
            .await
            .unwrap();
        assert_eq!(delivered, 5);
        exporter.close().await.unwrap();
    }

    #[tokio::test]
    async fn interrupt_stops_between_rounds() {
        let genesis = synth::genesis("devnet");
        let mut exporter = test_mode_exporter(&genesis).await;
        let mut chain = SyntheticChain::new(&genesis);
        let interrupt = Interrupt::default();

        let delivered = deliver(exporter.as_mut(), &mut chain, 3, &interrupt).await.unwrap();
        assert_eq!(delivered, 3);

        interrupt.trigger();
        let delivered = deliver(exporter.as_mut(), &mut chain, 10, &interrupt).await.unwrap();
        assert_eq!(delivered, 0);

        // Round 3 is still the next one the exporter accepts.
        exporter.receive(chain.next_unit(3)).await.unwrap();
        exporter.close().await.unwrap();
    }
}
