//! Integer arithmetic and unsigned comparison.

use super::{
    check_arity, first_int_destination, first_int_destination_free, int_register_exists,
    parse_immediate, source_int_registers,
};
use crate::instruction::Operand;
use crate::machine::{reg, Machine};

pub(super) fn check_add(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("add", operands, 3, machine) {
        return false;
    }
    let value1 = machine.register_value(operands[1].value());
    let value2 = machine.register_value(operands[2].value());
    if value1.checked_add(value2).is_none() {
        machine
            .diagnostics
            .add_error("add instruction arithmetic overflow detected.");
        return false;
    }
    true
}

pub(super) fn exec_add(operands: &[Operand], machine: &mut Machine) {
    if !check_add(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let value2 = machine.register_value(operands[2].value());
    machine.set_register_value(operands[0].value(), value1.wrapping_add(value2));
}

pub(super) fn check_addi(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("addi", operands, 3, machine) {
        return false;
    }
    let Some(immediate) = parse_immediate("addi", &operands[2], machine) else {
        return false;
    };
    let value1 = machine.register_value(operands[1].value());
    if value1.checked_add(immediate).is_none() {
        machine
            .diagnostics
            .add_error("addi instruction arithmetic overflow detected.");
        return false;
    }
    true
}

pub(super) fn exec_addi(operands: &[Operand], machine: &mut Machine) {
    if !check_addi(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let Some(immediate) = parse_immediate("addi", &operands[2], machine) else {
        return;
    };
    machine.set_register_value(operands[0].value(), value1.wrapping_add(immediate));
}

pub(super) fn check_addiu(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("addiu", operands, 3, machine) {
        return false;
    }
    parse_immediate("addiu", &operands[2], machine).is_some()
}

/// Unsigned add: no overflow pre-check, wraps silently.
pub(super) fn exec_addiu(operands: &[Operand], machine: &mut Machine) {
    if !check_addiu(operands, machine) || !first_int_destination_free(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let Some(immediate) = parse_immediate("addiu", &operands[2], machine) else {
        return;
    };
    machine.set_register_value(operands[0].value(), value1.wrapping_add(immediate));
}

pub(super) fn check_sub(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("sub", operands, 3, machine) && source_int_registers(&operands[1..], machine)
}

pub(super) fn exec_sub(operands: &[Operand], machine: &mut Machine) {
    if !check_sub(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value());
    let value2 = machine.register_value(operands[2].value());
    if value1.checked_sub(value2).is_none() {
        machine
            .diagnostics
            .add_error("Arithmetic overflow in subtraction.");
        return;
    }
    machine.set_register_value(operands[0].value(), value1.wrapping_sub(value2));
}

pub(super) fn check_mult(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("mult", operands, 2, machine)
        && int_register_exists(operands[0].value(), machine)
        && int_register_exists(operands[1].value(), machine)
}

/// Signed 64-bit product split across `$hi`/`$lo`.
pub(super) fn exec_mult(operands: &[Operand], machine: &mut Machine) {
    if !check_mult(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[0].value()) as i64;
    let value2 = machine.register_value(operands[1].value()) as i64;
    let result = value1 * value2;
    machine.set_register_value(reg::LO, result as i32);
    machine.set_register_value(reg::HI, (result >> 32) as i32);
}

pub(super) fn check_multu(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("multu", operands, 2, machine) && source_int_registers(operands, machine)
}

pub(super) fn exec_multu(operands: &[Operand], machine: &mut Machine) {
    if !check_multu(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[0].value()) as u32 as u64;
    let value2 = machine.register_value(operands[1].value()) as u32 as u64;
    let result = value1 * value2;
    machine.set_register_value(reg::LO, result as u32 as i32);
    machine.set_register_value(reg::HI, (result >> 32) as i32);
}

pub(super) fn check_divu(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("divu", operands, 2, machine) || !source_int_registers(operands, machine) {
        return false;
    }
    if machine.register_value(operands[1].value()) as u32 == 0 {
        machine.diagnostics.add_error("Division by zero detected.");
        return false;
    }
    true
}

/// Unsigned quotient to `$lo`, remainder to `$hi`.
pub(super) fn exec_divu(operands: &[Operand], machine: &mut Machine) {
    if !check_divu(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[0].value()) as u32;
    let value2 = machine.register_value(operands[1].value()) as u32;
    if value2 == 0 {
        machine
            .diagnostics
            .add_error("Division by zero in divu instruction.");
        return;
    }
    machine.set_register_value(reg::LO, (value1 / value2) as i32);
    machine.set_register_value(reg::HI, (value1 % value2) as i32);
}

pub(super) fn check_sltu(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("sltu", operands, 3, machine) && source_int_registers(&operands[1..], machine)
}

/// Unsigned compare, operands widened before the comparison.
pub(super) fn exec_sltu(operands: &[Operand], machine: &mut Machine) {
    if !check_sltu(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[1].value()) as u32 as u64;
    let value2 = machine.register_value(operands[2].value()) as u32 as u64;
    machine.set_register_value(operands[0].value(), (value1 < value2) as i32);
}

pub(super) fn check_sltiu(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("sltiu", operands, 3, machine) {
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

pub(super) fn exec_sltiu(operands: &[Operand], machine: &mut Machine) {
    if !check_sltiu(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[1].value()) as u32 as u64;
    let Ok(immediate) = operands[2].value().parse::<i32>() else {
        return;
    };
    let immediate = immediate as u32 as u64;
    machine.set_register_value(operands[0].value(), (value < immediate) as i32);
}
