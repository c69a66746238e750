use clap::Parser;
use sports_edge::cli::{Cli, Commands};
use sports_edge::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        Config::default()
    };

    // Initialize telemetry
    let _telemetry = sports_edge::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Analyze(args) => {
            tracing::info!("Starting analysis");
            args.execute(&config).await?;
        }
        Commands::Odds(args) => args.execute(&config).await?,
        Commands::Settle(args) => {
            tracing::info!("Settling predictions");
            args.execute(&config).await?;
        }
        Commands::Repair(args) => {
            tracing::info!("Starting integrity repair");
            args.execute(&config).await?;
        }
        Commands::Report(args) => args.execute(&config).await?,
        Commands::Export(args) => args.execute(&config).await?,
        Commands::Config => {
            println!("Current configuration:");
            println!("  Model version: {}", config.model.version);
            println!(
                "  Edge thresholds: small={} medium={} high={}",
                config.edge.small, config.edge.medium, config.edge.high
            );
            println!(
                "  Blend: form={} injury={} rest={} travel={} h2h={} cap={}",
                config.blend.form_weight,
                config.blend.injury_weight,
                config.blend.rest_weight,
                config.blend.travel_weight,
                config.blend.h2h_weight,
                config.blend.max_adjustment
            );
            println!(
                "  Ledger: {} (closing window {} min)",
                config.ledger.path.display(),
                config.ledger.closing_window_minutes
            );
            println!(
                "  Repair: sum in [{}, {}], edge tolerance {}",
                config.repair.sum_min, config.repair.sum_max, config.repair.edge_tolerance
            );
            println!("  Team aliases: {}", config.teams.aliases.len());
        }
    }

    Ok(())
}
