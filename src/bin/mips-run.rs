use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mips_rs::{DiagnosticService, Engine, Machine};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a MIPS assembly program on the mips-rs interpreter"
)]
struct Opts {
    #[arg(value_name = "ASMFILE")]
    input: PathBuf,

    /// Enable debug tracing of parsing and every executed instruction.
    #[arg(short, long)]
    debug: bool,

    /// Write the parsed instruction stream and variable table as JSON.
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let opts = Opts::parse();

    let filter = if opts.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut parser = mips_rs::Parser::new();
    let instructions = match parser.parse_file(&opts.input) {
        Ok(instructions) => instructions,
        Err(e) => {
            parser
                .diagnostics
                .add_error(format!("Failed to process file: {e}"));
            parser.diagnostics.report();
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(path) = &opts.dump {
        let dump = serde_json::json!({
            "instructions": instructions,
            "variables": parser.variables(),
        });
        let rendered = serde_json::to_string_pretty(&dump)?;
        std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write dump to {}", path.display()))?;
    }

    let (variables, diagnostics) = parser.into_parts();

    // Parse errors suppress evaluation entirely.
    if diagnostics.has_errors() {
        diagnostics.report();
        return Ok(ExitCode::FAILURE);
    }

    let worker = std::thread::spawn(move || {
        let mut machine = Machine::new(diagnostics);
        machine.initialize_variables(&variables);
        let engine = Engine::new();
        let code = engine.evaluate(&mut machine, &instructions);
        (code, machine)
    });

    match worker.join() {
        Ok((code, machine)) => {
            if machine.diagnostics.has_errors() || !machine.diagnostics.warnings().is_empty() {
                machine.diagnostics.report();
            }
            Ok(ExitCode::from(code.rem_euclid(256) as u8))
        }
        Err(_) => {
            let mut diagnostics = DiagnosticService::new();
            diagnostics.add_error("Evaluation worker terminated abnormally.");
            diagnostics.report();
            Ok(ExitCode::FAILURE)
        }
    }
}
