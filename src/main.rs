// Command-line entry point for goscope.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use goscope::application::AnalyzeUsecase;
use goscope::infrastructure::config::{resolve_config, ConfigOverrides};
use goscope::infrastructure::{concurrency, exporter_for, logging, JsonProgramLoader, OutputFormat};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Worker threads for the parallel index build (default: half the cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a call graph from a program representation
    Analyze {
        /// Program representation JSON file
        #[arg(short, long)]
        program: PathBuf,

        /// Call graph algorithm (cha, rta)
        #[arg(long)]
        algo: Option<String>,

        /// Position verbosity (detailed, minimal)
        #[arg(long)]
        emit_positions: Option<String>,

        /// Comma-separated package path substrings to keep
        #[arg(long)]
        only_pkg: Option<String>,

        /// Extra RTA entry point, by stable identity (repeatable)
        #[arg(long = "entry")]
        entry: Vec<String>,

        /// TOML config file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (json, dot)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file path, `-` for stdout
        #[arg(short, long, default_value = "-")]
        out: String,
    },

    /// Serve the line-delimited JSON API
    Serve {
        #[arg(long, default_value_t = 7878)]
        port: u16,
    },
}

fn main() -> ExitCode {
    logging::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    concurrency::init_thread_pool(cli.threads)?;

    match cli.command {
        Command::Analyze {
            program,
            algo,
            emit_positions,
            only_pkg,
            entry,
            config,
            format,
            out,
        } => {
            let overrides = ConfigOverrides {
                algorithm: algo,
                emit_positions,
                only_pkg,
                entry_points: entry,
            };
            let config = resolve_config(config.as_deref(), &overrides)?;
            let format: OutputFormat = format.parse()?;

            let loader = JsonProgramLoader::new(program);
            let usecase = AnalyzeUsecase {
                source: &loader,
                exporter: exporter_for(format),
            };
            let graph = usecase.run(&config, &out)?;
            if out != "-" {
                println!(
                    "Analysis completed! {} nodes, {} edges ({}) written to {}",
                    graph.nodes.len(),
                    graph.edges.len(),
                    graph.algorithm,
                    out
                );
            }
            Ok(())
        }
        Command::Serve { port } => goscope::api::server::start_server(port),
    }
}
