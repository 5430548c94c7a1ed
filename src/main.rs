use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use puerta_sdam::config::Config;
use puerta_sdam::{HelloReply, SdamResult, ServerDescription, ServerDescriptionOptions};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "puerta-sdam")]
#[command(about = "Classify MongoDB servers from their hello/ismaster handshake replies")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Puerta Team")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a server from a JSON handshake reply
    Classify {
        /// Server address the reply came from (host:port)
        #[arg(short, long)]
        address: String,
        /// Path to the JSON reply, or "-" for stdin
        #[arg(short, long)]
        reply: PathBuf,
        /// Measured round-trip time in milliseconds
        #[arg(long)]
        rtt_ms: Option<u64>,
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Generate an example configuration file
    Config {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            address,
            reply,
            rtt_ms,
            config,
        } => classify(address, reply, rtt_ms, config)?,
        Commands::Config { output } => generate_config(output)?,
        Commands::Validate { config } => validate_config(config)?,
        Commands::Version => show_version(),
    }

    Ok(())
}

fn classify(
    address: String,
    reply_path: PathBuf,
    rtt_ms: Option<u64>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::default(),
    };
    init_logging(&config)?;

    if address.trim().is_empty() {
        bail!("Server address cannot be empty");
    }

    let reply = read_reply(&reply_path)
        .with_context(|| format!("Failed to read handshake reply from {:?}", reply_path))?;

    let mut options = ServerDescriptionOptions::new();
    if let Some(ms) = rtt_ms {
        options = options.with_round_trip_time(Duration::from_millis(ms));
    }

    let description = ServerDescription::new(address, Some(&reply), options);
    info!(
        "Server {} classified as {}",
        description.address(),
        description.server_type()
    );

    let compatibility = match description.check_compatibility(&config.wire_version_range()) {
        Ok(()) => json!({"compatible": true}),
        Err(e) => json!({"compatible": false, "reason": e.to_string()}),
    };

    let output = json!({
        "description": description,
        "isWritable": description.is_writable(),
        "isReadable": description.is_readable(),
        "allHosts": description.all_hosts(),
        "compatibility": compatibility
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn read_reply(path: &Path) -> SdamResult<HelloReply> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return HelloReply::from_json_str(&buffer);
    }

    HelloReply::from_json_file(path)
}

fn generate_config(output: PathBuf) -> anyhow::Result<()> {
    println!("Generating configuration file: {:?}", output);

    Config::create_example_config(&output).context("Failed to generate config")?;

    println!("Configuration file generated successfully!");
    println!("Use it with:");
    println!("  puerta-sdam classify --config {:?} --address HOST:PORT --reply reply.json", output);

    Ok(())
}

fn validate_config(config_path: PathBuf) -> anyhow::Result<()> {
    println!("Validating configuration file: {:?}", config_path);

    match Config::load_from_file(&config_path) {
        Ok(config) => {
            println!("✓ Configuration file is valid");
            println!("  Log level: {}", config.logging.level);
            println!("  Log format: {}", config.logging.format);
            println!(
                "  Supported wire versions: {}..={}",
                config.compatibility.min_wire_version, config.compatibility.max_wire_version
            );
        }
        Err(e) => {
            eprintln!("✗ Configuration file validation failed:");
            eprintln!("  {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

fn show_version() {
    println!("puerta-sdam v{}", env!("CARGO_PKG_VERSION"));
    println!("Server role classification for MongoDB replica sets and sharded clusters");
    println!();
    println!("Target: {}", std::env::consts::ARCH);
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized at level: {}", config.logging.level);
    Ok(())
}
