#![allow(dead_code)]

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use mips_rs::handlers;
use mips_rs::{DiagnosticService, Engine, Machine, Operand, Parser};

/// Write sink that keeps a readable copy of everything printed.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Run {
    pub exit_code: i32,
    pub output: String,
    pub errors: Vec<String>,
}

pub fn run_program(source: &str) -> Run {
    run_program_with_input(source, "")
}

/// Parses and evaluates a full program, capturing printed output.
pub fn run_program_with_input(source: &str, input: &str) -> Run {
    let mut parser = Parser::new();
    let lines: Vec<&str> = source.lines().collect();
    let instructions = parser.parse(&lines);
    let (variables, diagnostics) = parser.into_parts();
    assert!(
        !diagnostics.has_errors(),
        "unexpected parse errors: {:?}",
        diagnostics.errors()
    );

    let output = CapturedOutput::default();
    let mut machine = Machine::with_io(
        diagnostics,
        Box::new(Cursor::new(input.as_bytes().to_vec())),
        Box::new(output.clone()),
    );
    machine.initialize_variables(&variables);

    let exit_code = Engine::new().evaluate(&mut machine, &instructions);
    Run {
        exit_code,
        output: output.text(),
        errors: machine.diagnostics.errors().to_vec(),
    }
}

/// Bare machine with no input and discarded output, for handler-level tests.
pub fn test_machine() -> Machine {
    Machine::with_io(
        DiagnosticService::new(),
        Box::new(io::empty()),
        Box::new(io::sink()),
    )
}

pub fn machine_with_io(input: &str, output: CapturedOutput) -> Machine {
    Machine::with_io(
        DiagnosticService::new(),
        Box::new(Cursor::new(input.as_bytes().to_vec())),
        Box::new(output),
    )
}

/// Executes a single instruction through the dispatch table.
pub fn exec(machine: &mut Machine, mnemonic: &str, operands: &[&str]) {
    let handler = handlers::lookup(mnemonic).expect("unknown mnemonic");
    let ops: Vec<Operand> = operands.iter().map(|o| Operand::new(*o)).collect();
    (handler.execute)(&ops, machine);
}
