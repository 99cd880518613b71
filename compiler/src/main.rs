use clap::Parser;
use std::path::PathBuf;

use irnames::script::{self, NameScript, ResolvedStep};
use irnames::{NameRepository, TableDialect};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Table,
    Labels,
    Json,
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "irnames",
    version,
    about = "Inspect a dialect's name table and resolve derived-name labels"
)]
struct Cli {
    /// Dialect definition (JSON)
    dialect: PathBuf,

    /// Name script to replay before label generation
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Additional reserved word (repeatable)
    #[arg(short = 'r', long = "reserved")]
    reserved: Vec<String>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Table)]
    emit: EmitStage,

    /// Log repository construction and label generation
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("irnames=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // ── Load dialect ──
    let dialect = match TableDialect::load(&cli.dialect) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("irnames: error: {}", e);
            std::process::exit(2);
        }
    };
    tracing::info!(
        dialect = dialect.name(),
        path = %cli.dialect.display(),
        "dialect loaded"
    );

    let mut repo = NameRepository::new(&dialect);

    match cli.emit {
        EmitStage::Table => print!("{}", repo),
        EmitStage::BuildInfo => {
            let info = serde_json::json!({
                "dialect": dialect.name(),
                "fingerprint": dialect.fingerprint(),
                "types": repo.type_count(),
                "builtins": repo.boundaries().builtins.len(),
                "target": repo.target().map(|t| t.version.as_str()),
                "compiler_version": env!("CARGO_PKG_VERSION"),
            });
            println!("{:#}", info);
        }
        EmitStage::Labels | EmitStage::Json => {
            let Some(path) = &cli.script else {
                eprintln!("irnames: error: --emit labels/json requires --script");
                std::process::exit(2);
            };
            let resolved = match NameScript::load(path)
                .and_then(|s| script::finalize(&mut repo, &s, &cli.reserved))
            {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("irnames: error: {}", e);
                    std::process::exit(1);
                }
            };
            if matches!(cli.emit, EmitStage::Json) {
                match serde_json::to_string_pretty(&resolved) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("irnames: error: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print_labels(&resolved);
            }
        }
    }
}

fn print_labels(resolved: &[ResolvedStep]) {
    for r in resolved {
        println!(
            "{:>4}  #{:<6} {:<24} {}",
            r.step,
            r.name,
            r.operation,
            r.label.as_deref().unwrap_or("-")
        );
    }
}
