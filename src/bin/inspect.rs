//! Serde Inspector CLI
//!
//! Decodes and builds wire envelopes and shows which schema ID policy a
//! configuration selects.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use registry_serde::{wire, ConfigMap, IdPolicy, SerdeConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "serde-inspect")]
#[command(about = "Inspect schema-registry wire envelopes and serde configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the envelope header of a hex-encoded message
    Header {
        /// Message bytes as hex
        hex: String,
    },

    /// Wrap a hex-encoded body in an envelope
    Encode {
        /// Schema ID to embed
        #[arg(short, long)]
        id: u32,
        /// Body bytes as hex
        #[arg(default_value = "")]
        hex: String,
    },

    /// Show the effective configuration and the ID policy it selects
    Policy {
        /// Extra config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Dotted option, e.g. auto.register.schemas=false (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Header { hex } => {
            let bytes = hex::decode(hex.trim()).context("message is not valid hex")?;
            let envelope = wire::parse(&bytes)?;
            println!("magic:     0x{:02x}", wire::MAGIC_BYTE);
            println!("schema id: {}", envelope.schema_id);
            println!("payload:   {} bytes", envelope.payload.len());
            if !envelope.payload.is_empty() {
                let preview = &envelope.payload[..envelope.payload.len().min(32)];
                println!("           {}", hex::encode(preview));
            }
            Ok(())
        }

        Commands::Encode { id, hex } => {
            let body = hex::decode(hex.trim()).context("body is not valid hex")?;
            println!("{}", hex::encode(wire::write_bytes(id, &body)?));
            Ok(())
        }

        Commands::Policy { config, set } => {
            let effective = if set.is_empty() {
                SerdeConfig::load_from(config.as_deref())?
            } else {
                if config.is_some() {
                    bail!("--config and --set cannot be combined");
                }
                let mut options = ConfigMap::new();
                for entry in &set {
                    let (key, value) = entry
                        .split_once('=')
                        .with_context(|| format!("expected KEY=VALUE, got '{}'", entry))?;
                    options.set(key.trim(), value.trim());
                }
                SerdeConfig::from_config_map(&options)?
            };

            println!("{}", toml::to_string_pretty(&effective)?);
            let policy = IdPolicy::select(&effective);
            println!("policy: {}", policy);
            println!("registers schemas: {}", policy.mutates_registry());
            Ok(())
        }
    }
}
