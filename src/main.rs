use arcana_reader::utils::{logger, validation::Validate};
use arcana_reader::{start_server, AppConfig, CliConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting arcana reading service");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load {}: {}", cli.config, e);
            eprintln!("❌ Failed to load {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    if let Some(port) = cli.port {
        config.server.port = Some(port);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    if config.is_local_mode() {
        tracing::info!("📦 Local mode: deck file {}", config.deck.path());
    }

    start_server(config).await?;
    Ok(())
}
