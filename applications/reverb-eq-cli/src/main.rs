/// Reverb EQ - impulse response equalizer
use clap::{Parser, Subcommand};
use reverb_eq_cli::{
    commands::{self, BandGain, ResponsePoint},
    CliConfig,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reverb-eq")]
#[command(about = "Gain-corrected shelving/peaking EQ for reverb impulse responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Equalize one channel of an impulse response WAV file
    Apply {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,
        /// Output WAV file (mono, 32-bit float)
        #[arg(short, long)]
        output: PathBuf,
        /// Reference channel to equalize
        #[arg(long, default_value_t = 0)]
        channel: u16,
        /// Configuration file path
        #[arg(short, long, env = "REVERB_EQ_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the corrected cascade response
    Response {
        /// Sample rate in Hz (overrides the config)
        #[arg(short, long)]
        sample_rate: Option<u32>,
        /// Number of log-spaced points
        #[arg(short, long, default_value_t = 32)]
        points: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Configuration file path
        #[arg(short, long, env = "REVERB_EQ_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print target and corrected gain per band
    Gains {
        /// Sample rate in Hz (overrides the config)
        #[arg(short, long)]
        sample_rate: Option<u32>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Configuration file path
        #[arg(short, long, env = "REVERB_EQ_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reverb_eq=info,reverb_eq_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            input,
            output,
            channel,
            config,
        } => {
            let config = CliConfig::load(config.as_deref())?;
            let report = commands::apply(&input, &output, channel, &config)?;
            println!(
                "{} frames at {} Hz (channel {}) -> {}",
                report.frames,
                report.sample_rate,
                report.channel,
                output.display()
            );
            print_gains(&report.bands);
        }
        Commands::Response {
            sample_rate,
            points,
            json,
            config,
        } => {
            let config = CliConfig::load(config.as_deref())?.with_sample_rate(sample_rate)?;
            let curve = commands::response(&config, points)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&curve)?);
            } else {
                print_response(&curve);
            }
        }
        Commands::Gains {
            sample_rate,
            json,
            config,
        } => {
            let config = CliConfig::load(config.as_deref())?.with_sample_rate(sample_rate)?;
            let gains = commands::gains(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&gains)?);
            } else {
                print_gains(&gains);
            }
        }
    }

    Ok(())
}

fn print_response(curve: &[ResponsePoint]) {
    println!("{:>12}  {:>10}", "freq (Hz)", "dB");
    for point in curve {
        println!("{:>12.1}  {:>10.4}", point.frequency, point.db);
    }
}

fn print_gains(gains: &[BandGain]) {
    println!(
        "{:>4}  {:<10}  {:>10}  {:>6}  {:>10}  {:>10}",
        "band", "kind", "freq (Hz)", "Q", "target", "corrected"
    );
    for band in gains {
        let corrected = if band.enabled {
            format!("{:.6}", band.corrected)
        } else {
            "bypassed".to_string()
        };
        println!(
            "{:>4}  {:<10}  {:>10.1}  {:>6.2}  {:>10.6}  {:>10}",
            band.band,
            band.kind.name(),
            band.frequency,
            band.q,
            band.target,
            corrected
        );
    }
}
