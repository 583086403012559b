//! Trap instructions.
//!
//! A firing trap currently reports a diagnostic and lets execution continue;
//! it does not halt the program.

use super::{check_arity, source_int_registers};
use crate::instruction::Operand;
use crate::machine::Machine;

fn check_register_immediate(name: &str, operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity(name, operands, 2, machine) {
        return false;
    }
    if !machine.has_int_register(operands[0].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    if operands[1].value().parse::<i32>().is_err() {
        machine.diagnostics.add_error("Invalid immediate value.");
        return false;
    }
    true
}

pub(super) fn check_teqi(operands: &[Operand], machine: &mut Machine) -> bool {
    check_register_immediate("teqi", operands, machine)
}

pub(super) fn exec_teqi(operands: &[Operand], machine: &mut Machine) {
    if !check_teqi(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[0].value());
    let Ok(immediate) = operands[1].value().parse::<i32>() else {
        return;
    };
    if value == immediate {
        machine
            .diagnostics
            .add_error("Trap exception: value equals immediate.");
    }
}

pub(super) fn check_tne(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("tne", operands, 2, machine) && source_int_registers(operands, machine)
}

pub(super) fn exec_tne(operands: &[Operand], machine: &mut Machine) {
    if !check_tne(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[0].value());
    let value2 = machine.register_value(operands[1].value());
    if value1 != value2 {
        machine
            .diagnostics
            .add_error("Trap exception: values are not equal.");
    }
}

pub(super) fn check_tnei(operands: &[Operand], machine: &mut Machine) -> bool {
    check_register_immediate("tnei", operands, machine)
}

pub(super) fn exec_tnei(operands: &[Operand], machine: &mut Machine) {
    if !check_tnei(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[0].value());
    let Ok(immediate) = operands[1].value().parse::<i32>() else {
        return;
    };
    if value != immediate {
        machine
            .diagnostics
            .add_error("Trap exception: value is not equal to immediate.");
    }
}

pub(super) fn check_tgeiu(operands: &[Operand], machine: &mut Machine) -> bool {
    check_register_immediate("tgeiu", operands, machine)
}

/// Unsigned comparison; both sides are widened before comparing.
pub(super) fn exec_tgeiu(operands: &[Operand], machine: &mut Machine) {
    if !check_tgeiu(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[0].value()) as u32 as u64;
    let Ok(immediate) = operands[1].value().parse::<i32>() else {
        return;
    };
    let immediate = immediate as u32 as u64;
    if value >= immediate {
        machine.diagnostics.add_error(
            "Trap exception: unsigned value is greater than or equal to immediate.",
        );
    }
}
