//! Loads, stores and register moves.

use super::{
    check_arity, first_int_destination, int_register_exists, source_int_registers,
    unsigned_immediate,
};
use crate::instruction::Operand;
use crate::machine::{reg, Machine};

pub(super) fn check_lw(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("lw", operands, 2, machine) {
        return false;
    }
    if !machine.has_int_register(operands[0].value()) {
        machine.diagnostics.add_error(format!(
            "Destination register not found: {}",
            operands[0].value()
        ));
        return false;
    }
    if !machine.has_variable(operands[1].value()) {
        machine.diagnostics.add_error(format!(
            "Source label not found: {}",
            operands[1].value()
        ));
        return false;
    }
    true
}

pub(super) fn exec_lw(operands: &[Operand], machine: &mut Machine) {
    if !check_lw(operands, machine) {
        return;
    }
    let Some(address) = machine.variable_address(operands[1].value()) else {
        return;
    };
    let value = machine.load_word(address);
    machine.set_register_value(operands[0].value(), value);
}

pub(super) fn check_la(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("la", operands, 2, machine) {
        return false;
    }
    if !machine.has_int_register(operands[0].value()) {
        machine.diagnostics.add_error(format!(
            "Destination register not found: {}",
            operands[0].value()
        ));
        return false;
    }
    true
}

/// Resolves a variable's layout address into the destination register.
pub(super) fn exec_la(operands: &[Operand], machine: &mut Machine) {
    if !check_la(operands, machine) {
        return;
    }
    let Some(address) = machine.variable_address(operands[1].value()) else {
        return;
    };
    machine.load_address(operands[0].value(), address);
}

pub(super) fn check_li(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("li", operands, 2, machine) {
        return false;
    }
    if operands[1].value().parse::<i32>().is_err() {
        machine
            .diagnostics
            .add_error("Invalid value for li instruction.");
        return false;
    }
    if !machine.has_int_register(operands[0].value()) {
        machine.diagnostics.add_error(format!(
            "Destination register not found: {}",
            operands[0].value()
        ));
        return false;
    }
    true
}

pub(super) fn exec_li(operands: &[Operand], machine: &mut Machine) {
    if !check_li(operands, machine) {
        return;
    }
    let Ok(value) = operands[1].value().parse::<i32>() else {
        return;
    };
    machine.set_register_value(operands[0].value(), value);
}

pub(super) fn check_lui(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("lui", operands, 2, machine) && unsigned_immediate(&operands[1], machine).is_some()
}

pub(super) fn exec_lui(operands: &[Operand], machine: &mut Machine) {
    if !check_lui(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let Some(immediate) = unsigned_immediate(&operands[1], machine) else {
        return;
    };
    machine.set_register_value(operands[0].value(), immediate.wrapping_shl(16));
}

pub(super) fn check_sb(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("sb", operands, 2, machine) && source_int_registers(operands, machine)
}

/// `sb $value, $address`: low byte of the first register goes to the address
/// held in the second.
pub(super) fn exec_sb(operands: &[Operand], machine: &mut Machine) {
    if !check_sb(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[0].value());
    let address = machine.register_value(operands[1].value());
    machine.store_byte(address, value as u8);
}

pub(super) fn check_sdc1(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("sdc1", operands, 2, machine) {
        return false;
    }
    if !machine.has_fp_register(operands[0].value())
        || !machine.has_int_register(operands[1].value())
    {
        machine
            .diagnostics
            .add_error("Invalid register combination.");
        return false;
    }
    true
}

pub(super) fn exec_sdc1(operands: &[Operand], machine: &mut Machine) {
    if !check_sdc1(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[0].value());
    let address = machine.register_value(operands[1].value());
    machine.store_double_word(address, value.to_bits());
}

pub(super) fn check_move(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("move", operands, 2, machine)
        && int_register_exists(operands[0].value(), machine)
        && int_register_exists(operands[1].value(), machine)
}

pub(super) fn exec_move(operands: &[Operand], machine: &mut Machine) {
    if !check_move(operands, machine) {
        return;
    }
    let value = machine.register_value(operands[1].value());
    machine.set_register_value(operands[0].value(), value);
}

pub(super) fn check_mfhi(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("mfhi", operands, 1, machine) && int_register_exists(operands[0].value(), machine)
}

pub(super) fn exec_mfhi(operands: &[Operand], machine: &mut Machine) {
    if !check_mfhi(operands, machine) {
        return;
    }
    let value = machine.register_value(reg::HI);
    machine.set_register_value(operands[0].value(), value);
}

pub(super) fn check_mflo(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("mflo", operands, 1, machine) && int_register_exists(operands[0].value(), machine)
}

pub(super) fn exec_mflo(operands: &[Operand], machine: &mut Machine) {
    if !check_mflo(operands, machine) {
        return;
    }
    let value = machine.register_value(reg::LO);
    machine.set_register_value(operands[0].value(), value);
}

pub(super) fn check_movz(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("movz", operands, 3, machine) && source_int_registers(&operands[1..], machine)
}

/// Moves only when the condition register reads zero.
pub(super) fn exec_movz(operands: &[Operand], machine: &mut Machine) {
    if !check_movz(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let condition = machine.register_value(operands[2].value());
    if condition == 0 {
        let value = machine.register_value(operands[1].value());
        machine.set_register_value(operands[0].value(), value);
    }
}
