use std::collections::HashMap;

use tracing::debug;

use crate::handlers::{self, Handler};
use crate::instruction::Instruction;
use crate::machine::Machine;

/// Drives the fetch/dispatch loop over an instruction stream.
///
/// A label pre-pass resolves every label marker to its slot index, then the
/// loop executes slots in order. Shutdown is checked before and after each
/// dispatch so an exit raised inside a handler halts within one instruction.
/// The finalizer runs exactly once on every exit path.
pub struct Engine {
    dispatch: HashMap<&'static str, &'static Handler>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let dispatch = handlers::TABLE.iter().map(|h| (h.name, h)).collect();
        Self { dispatch }
    }

    /// Runs the program to completion and returns its exit code.
    pub fn evaluate(&self, machine: &mut Machine, instructions: &[Instruction]) -> i32 {
        self.resolve_labels(machine, instructions);
        self.run(machine, instructions)
    }

    fn resolve_labels(&self, machine: &mut Machine, instructions: &[Instruction]) {
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(label) = instruction.label() {
                machine.define_label(label, index);
            }
        }
    }

    fn run(&self, machine: &mut Machine, instructions: &[Instruction]) -> i32 {
        machine.set_program_counter(0);

        while machine.program_counter() < instructions.len() as i64 {
            if machine.shutdown_requested() {
                debug!("shutdown observed before dispatch");
                break;
            }

            let pc = machine.program_counter();
            if pc < 0 {
                machine
                    .diagnostics
                    .add_error(format!("Program counter out of range: {pc}"));
                break;
            }

            let instruction = &instructions[pc as usize];
            if !instruction.is_label() {
                self.step(machine, instruction);
            }

            if machine.shutdown_requested() {
                debug!("shutdown observed after dispatch");
                break;
            }

            machine.advance();
        }

        machine.finish()
    }

    fn step(&self, machine: &mut Machine, instruction: &Instruction) {
        debug!(mnemonic = %instruction.mnemonic, pc = machine.program_counter(), "dispatch");
        match self.dispatch.get(instruction.mnemonic.as_str()) {
            Some(handler) => (handler.execute)(&instruction.operands, machine),
            None => machine
                .diagnostics
                .add_error(format!("Unknown instruction: {}", instruction.mnemonic)),
        }
    }
}
