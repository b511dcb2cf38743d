//! xbrljson CLI - XBRL instance to XBRL-JSON converter

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use xbrljson::{EmitConfig, EmitMode, Emitter, InstanceBuilder, XbrlFile};

/// XBRL instance to XBRL-JSON (OIM) converter
#[derive(ClapParser)]
#[command(name = "xbrljson")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an XBRL instance to XBRL-JSON
    Convert {
        /// Input file
        input: PathBuf,

        /// Document section to emit
        #[arg(short, long, value_enum, default_value_t = Mode::Report)]
        mode: Mode,

        /// Single-line output
        #[arg(long)]
        compact: bool,

        /// Resolve facts on one thread
        #[arg(long)]
        sequential: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what an XBRL instance contains
    Inspect {
        /// Input file
        input: PathBuf,
    },

    /// Benchmark full report emission
    Bench {
        /// Input file
        input: PathBuf,

        /// Number of iterations
        #[arg(short, long, default_value = "100")]
        iterations: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Report,
    Preload,
    Prefixes,
    Dts,
    Facts,
}

impl From<Mode> for EmitMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Report => EmitMode::Report,
            Mode::Preload => EmitMode::Preload,
            Mode::Prefixes => EmitMode::Prefixes,
            Mode::Dts => EmitMode::Dts,
            Mode::Facts => EmitMode::Facts,
        }
    }
}

fn load(input: &Path) -> Result<xbrljson::Instance> {
    let file =
        XbrlFile::open(input).with_context(|| format!("Failed to read {}", input.display()))?;
    InstanceBuilder::new()
        .build(&file)
        .with_context(|| format!("Failed to parse {}", input.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            mode,
            compact,
            sequential,
            output,
        } => {
            let mut instance = load(&input)?;
            let emitter = Emitter::with_config(EmitConfig {
                pretty: !compact,
                parallel: !sequential,
            });
            let json = emitter
                .emit(&mut instance, mode.into())
                .with_context(|| format!("Failed to convert {}", input.display()))?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "{} {} -> {}",
                        "✓".green().bold(),
                        input.display(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }

        Commands::Inspect { input } => {
            let instance = load(&input)?;

            println!("{} {}", "✓".green().bold(), input.display());
            println!("  Prefixes:  {}", instance.prefixes.len());
            println!("  DTS:       {}", instance.dts.len());
            println!("  Facts:     {}", instance.facts.len());
            println!("  Contexts:  {}", instance.contexts().len());
            println!("  Units:     {}", instance.units.len());
            println!("  Footnotes: {}", instance.footnotes.len());
        }

        Commands::Bench { input, iterations } => {
            let instance = load(&input)?;
            let emitter = Emitter::new();
            let iterations = iterations.max(1);

            // Warmup
            for _ in 0..3 {
                emitter.report(&mut instance.clone())?;
            }

            let mut times = Vec::with_capacity(iterations);
            let mut bytes = 0;

            for _ in 0..iterations {
                let mut copy = instance.clone();
                let start = Instant::now();
                bytes = emitter.report(&mut copy)?.len();
                times.push(start.elapsed());
            }

            times.sort();
            let min = times[0];
            let max = times[times.len() - 1];
            let median = times[times.len() / 2];
            let mean = times.iter().sum::<std::time::Duration>() / times.len() as u32;

            println!("Benchmark Results for {}", input.display());
            println!("  Iterations: {}", iterations);
            println!("  Facts: {}", instance.facts.len());
            println!("  Output: {} bytes", bytes);
            println!("  Min:    {:.3}ms", min.as_secs_f64() * 1000.0);
            println!("  Median: {:.3}ms", median.as_secs_f64() * 1000.0);
            println!("  Mean:   {:.3}ms", mean.as_secs_f64() * 1000.0);
            println!("  Max:    {:.3}ms", max.as_secs_f64() * 1000.0);
            println!(
                "  Throughput: {:.0} facts/sec",
                instance.facts.len() as f64 / mean.as_secs_f64()
            );
        }
    }

    Ok(())
}
