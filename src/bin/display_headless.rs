//! Headless Display Area Runner
//!
//! Replays kernel messages (or saved output records) through an output area
//! and prints the resulting HTML, record log or display snapshot.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use display_area::app::Config;
use display_area::core::KernelMessage;
use display_area::{AppendOutcome, Handled, OutputArea};

#[derive(Parser, Debug)]
#[command(name = "display-headless")]
#[command(version)]
#[command(about = "Render kernel output messages without a front-end", long_about = None)]
struct Args {
    /// Input file (JSON array); reads stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file; writes stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Input is a saved record log rather than kernel messages
    #[arg(long)]
    records: bool,

    /// Print the record log as JSON
    #[arg(short, long, conflicts_with = "snapshot")]
    json: bool,

    /// Print a display snapshot as JSON
    #[arg(short, long)]
    snapshot: bool,

    /// Path to a JSON config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Evaluate script outputs
    #[arg(long)]
    allow_scripts: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    if args.allow_scripts {
        return Err("--allow-scripts needs a script engine, none is built in".to_string());
    }

    let config = match &args.config {
        Some(path) => Config::load(path)
            .map_err(|e| format!("loading config '{}': {}", path.display(), e))?,
        None => Config::load_or_default(),
    };
    let config = Config {
        allow_scripts: false,
        ..config
    };

    let input = read_input(args.input.as_ref())?;
    let mut area = OutputArea::builder(display_area::core::DisplayTree::new())
        .config(config)
        .build();

    let pending = if args.records {
        area.from_json_str(&input)
            .map_err(|e| format!("parsing records: {}", e))?
    } else {
        let messages: Vec<KernelMessage> =
            serde_json::from_str(&input).map_err(|e| format!("parsing messages: {}", e))?;
        let mut pending = Vec::new();
        for msg in &messages {
            if let Handled::Output(AppendOutcome::Pending(render)) = area.handle(msg) {
                pending.push(render);
            }
        }
        pending
    };
    // Deferred renders complete in reservation order
    for render in pending {
        area.complete(render);
    }

    let rendered = if args.json {
        area.to_json_string()
            .map_err(|e| format!("serializing records: {}", e))?
    } else if args.snapshot {
        area.snapshot()
            .to_json()
            .map_err(|e| format!("serializing snapshot: {}", e))?
    } else {
        area.to_html()
    };
    write_output(args.output.as_ref(), &rendered)
}

fn read_input(path: Option<&PathBuf>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("reading file '{}': {}", path.display(), e)),
        None => {
            let mut data = String::new();
            io::stdin()
                .read_to_string(&mut data)
                .map_err(|e| format!("reading stdin: {}", e))?;
            Ok(data)
        }
    }
}

fn write_output(path: Option<&PathBuf>, rendered: &str) -> Result<(), String> {
    match path {
        Some(path) => std::fs::write(path, rendered)
            .map_err(|e| format!("writing file '{}': {}", path.display(), e)),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", rendered).map_err(|e| format!("writing stdout: {}", e))
        }
    }
}
