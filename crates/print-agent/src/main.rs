use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::{Insertions, PrinterService};
use domain::PrinterId;
use infrastructure::PrinterSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory (optional)
    #[arg(long)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the printers that would be opened
    List,

    /// Print a test page on every printer
    Identify {
        /// Print the full character set instead of the name banner
        #[arg(long)]
        chars: bool,
    },

    /// Print text on one printer
    Print {
        /// Printer id (configured id or position in the list)
        #[arg(long)]
        printer: PrinterId,

        /// Text to print; `{::escper}key{:/}` marks a raw insertion
        text: String,

        /// Raw bytes for a markup key, as key=hex (e.g. cut=1d5600)
        #[arg(long = "insert", value_name = "KEY=HEX")]
        insertions: Vec<String>,
    },
}

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,print_agent=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Check if we are in development environment (run from project root)
    let dev_config = "crates/print-agent/config";
    let config_dir = args.config_dir.unwrap_or_else(|| {
        if std::path::Path::new(dev_config).exists() {
            dev_config.to_string()
        } else {
            "config".to_string()
        }
    });

    info!("📂 Config directory: {}", config_dir);
    let settings = PrinterSettings::load(&config_dir)
        .with_context(|| format!("Failed to load printer configuration from {}", config_dir))?;

    let service = PrinterService::from_settings(&settings).await?;

    match args.command {
        Command::List => {
            for (index, definition) in service.definitions().iter().enumerate() {
                println!(
                    "{:>4}  {:<20} {:<40} {:>6}bps  cp{:<3} x{}",
                    definition.effective_id(index),
                    definition.name,
                    definition.path,
                    definition.baud_rate,
                    definition.codepage,
                    definition.copies
                );
            }
        }
        Command::Identify { chars } => {
            let report = service.identify(chars).await;
            for (id, e) in &report.failed {
                warn!(printer_id = %id, error = %e, "Printer did not close cleanly");
            }
            info!(closed = report.closed.len(), "🖨️ Test prints done");
        }
        Command::Print {
            printer,
            text,
            insertions,
        } => {
            let insertions = parse_insertions(&insertions)?;
            service.open().await;
            let printed = service.print(printer, &text, &insertions).await;
            service.close().await;

            match printed? {
                Some(outcome) => {
                    info!(bytes = outcome.bytes_written, "✅ Print job sent");
                    if !outcome.mismatches.is_empty() {
                        warn!(
                            short_copies = outcome.mismatches.len(),
                            "Some copies were not written completely"
                        );
                    }
                }
                None => warn!("No printers open, nothing printed"),
            }
        }
    }

    Ok(())
}

fn parse_insertions(raw: &[String]) -> Result<Insertions> {
    let mut insertions = Insertions::new();
    for entry in raw {
        let (key, hex) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Insertion '{}' must look like key=hex", entry))?;
        insertions.insert(key.to_string(), parse_hex(hex)?);
    }
    Ok(insertions)
}

fn parse_hex(hex: &str) -> Result<Vec<u8>> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.is_ascii() {
        bail!("Non-hex characters in '{}'", hex);
    }
    if digits.len() % 2 != 0 {
        bail!("Odd number of hex digits in '{}'", hex);
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| anyhow!("Invalid hex '{}': {}", &digits[i..i + 2], e))
        })
        .collect()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("❌ Print agent failed: {:?}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("1d5600").unwrap(), vec![0x1D, 0x56, 0x00]);
        assert_eq!(parse_hex("1B 70 00").unwrap(), vec![0x1B, 0x70, 0x00]);
        assert!(parse_hex("1d5").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("1é1").is_err());
        assert!(parse_hex("é").is_err());
    }

    #[test]
    fn test_parse_insertions() {
        let raw = vec!["cut=1d5600".to_string(), "drawer=1b700019fa".to_string()];
        let insertions = parse_insertions(&raw).unwrap();
        assert_eq!(insertions["cut"], vec![0x1D, 0x56, 0x00]);
        assert_eq!(insertions["drawer"], vec![0x1B, 0x70, 0x00, 0x19, 0xFA]);

        assert!(parse_insertions(&["nokey".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_print_command() {
        let args = Args::try_parse_from([
            "print-agent",
            "print",
            "--printer",
            "2",
            "Hello",
            "--insert",
            "cut=1d5600",
        ])
        .unwrap();

        match args.command {
            Command::Print {
                printer,
                text,
                insertions,
            } => {
                assert_eq!(printer, PrinterId::new(2));
                assert_eq!(text, "Hello");
                assert_eq!(insertions, vec!["cut=1d5600".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
