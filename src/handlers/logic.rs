//! Bitwise logic and shifts.

use super::{
    check_arity, first_int_destination, first_int_destination_free, source_int_registers,
    unsigned_immediate,
};
use crate::instruction::Operand;
use crate::machine::Machine;

pub(super) fn check_and(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("and", operands, 3, machine) && source_int_registers(&operands[1..], machine)
}

pub(super) fn exec_and(operands: &[Operand], machine: &mut Machine) {
    if !check_and(operands, machine) || !first_int_destination_free(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let value2 = machine.register_value(operands[2].value());
    machine.set_register_value(operands[0].value(), value1 & value2);
}

pub(super) fn check_andi(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("andi", operands, 3, machine) {
        return false;
    }
    if !machine.has_int_register(operands[1].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    unsigned_immediate(&operands[2], machine).is_some()
}

pub(super) fn exec_andi(operands: &[Operand], machine: &mut Machine) {
    if !check_andi(operands, machine) || !first_int_destination_free(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[1].value());
    let Some(immediate) = unsigned_immediate(&operands[2], machine) else {
        return;
    };
    machine.set_register_value(operands[0].value(), value & immediate);
}

pub(super) fn check_or(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("or", operands, 3, machine) {
        return false;
    }
    // A source operand that parses as a number is a constant, not a register.
    if operands[1].value().parse::<i32>().is_ok() {
        machine
            .diagnostics
            .add_error("First operand must be a register.");
        return false;
    }
    if operands[2].value().parse::<i32>().is_ok() {
        machine
            .diagnostics
            .add_error("Second operand must be a register.");
        return false;
    }
    source_int_registers(&operands[1..], machine)
}

pub(super) fn exec_or(operands: &[Operand], machine: &mut Machine) {
    if !check_or(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let value2 = machine.register_value(operands[2].value());
    machine.set_register_value(operands[0].value(), value1 | value2);
}

pub(super) fn check_ori(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("ori", operands, 3, machine) {
        return false;
    }
    if !machine.has_int_register(operands[1].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    unsigned_immediate(&operands[2], machine).is_some()
}

pub(super) fn exec_ori(operands: &[Operand], machine: &mut Machine) {
    if !check_ori(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[1].value());
    let Some(immediate) = unsigned_immediate(&operands[2], machine) else {
        return;
    };
    machine.set_register_value(operands[0].value(), value | immediate);
}

pub(super) fn check_nor(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("nor", operands, 3, machine) {
        return false;
    }
    if operands[1].value().parse::<i32>().is_ok() || operands[2].value().parse::<i32>().is_ok() {
        machine
            .diagnostics
            .add_error("Cannot write to a constant value.");
        return false;
    }
    source_int_registers(&operands[1..], machine)
}

pub(super) fn exec_nor(operands: &[Operand], machine: &mut Machine) {
    if !check_nor(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let value2 = machine.register_value(operands[2].value());
    machine.set_register_value(operands[0].value(), !(value1 | value2));
}

pub(super) fn check_xori(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("xori", operands, 3, machine) {
        return false;
    }
    if !machine.has_int_register(operands[1].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    if operands[2].value().parse::<i32>().is_err() {
        machine.diagnostics.add_error("Invalid immediate value.");
        return false;
    }
    true
}

pub(super) fn exec_xori(operands: &[Operand], machine: &mut Machine) {
    if !check_xori(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[1].value());
    let Ok(immediate) = operands[2].value().parse::<i32>() else {
        return;
    };
    machine.set_register_value(operands[0].value(), value ^ immediate);
}

pub(super) fn check_sra(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("sra", operands, 3, machine) {
        return false;
    }
    if !machine.has_int_register(operands[1].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    match operands[2].value().parse::<i32>() {
        Ok(shift) if (0..=31).contains(&shift) => true,
        Ok(_) => {
            machine
                .diagnostics
                .add_error("Shift amount must be between 0 and 31.");
            false
        }
        Err(_) => {
            machine.diagnostics.add_error("Invalid shift amount.");
            false
        }
    }
}

/// Arithmetic right shift, sign bit replicated.
pub(super) fn exec_sra(operands: &[Operand], machine: &mut Machine) {
    if !check_sra(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[1].value());
    let Ok(shift) = operands[2].value().parse::<i32>() else {
        return;
    };
    machine.set_register_value(operands[0].value(), value >> shift);
}
