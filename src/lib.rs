//! A MIPS32-subset assembly interpreter.
//!
//! Programs are plain `.asm` text with one `.data` and one `.text` section.
//! [`Parser`] turns source lines into an instruction stream plus an ordered
//! variable table, [`Machine`] holds the register banks and main memory, and
//! [`Engine`] runs the stream to completion, returning the program's exit
//! code. Errors and warnings accumulate in a [`DiagnosticService`] instead of
//! aborting, so a run surfaces as many problems as possible at once.

pub mod diagnostics;
pub mod engine;
pub mod handlers;
pub mod instruction;
pub mod machine;
pub mod parser;
pub mod variable;

pub use diagnostics::DiagnosticService;
pub use engine::Engine;
pub use instruction::{Instruction, Operand};
pub use machine::{Machine, HEAP_BASE, MAIN_MEMORY_SIZE};
pub use parser::{Parser, ProgramStructureError};
pub use variable::{DataType, Variable};
