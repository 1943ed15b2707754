use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "arcana")]
#[command(about = "Tarot reading generation service")]
pub struct CliConfig {
    #[arg(long, default_value = "arcana.toml", help = "Path to the TOML configuration file")]
    pub config: String,

    #[arg(long, help = "Override server.port from the configuration file")]
    pub port: Option<u16>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}
