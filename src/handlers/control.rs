//! Branches, jumps and execution control.
//!
//! Branch handlers set `pc = target - 1` so the loop increment lands on the
//! target slot; jump handlers set `pc = target` directly. Link instructions
//! record `pc + 1` in `$ra` before transferring.

use super::check_arity;
use crate::instruction::Operand;
use crate::machine::{reg, Machine};

pub(super) fn check_beq(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("beq", operands, 3, machine) {
        return false;
    }
    if !machine.has_int_register(operands[0].value())
        || !machine.has_int_register(operands[1].value())
    {
        machine
            .diagnostics
            .add_error("beq instruction registers not found.");
        return false;
    }
    true
}

pub(super) fn exec_beq(operands: &[Operand], machine: &mut Machine) {
    if !check_beq(operands, machine) {
        return;
    }
    let value1 = machine.register_value(operands[0].value());
    let value2 = machine.register_value(operands[1].value());
    if value1 == value2 {
        machine.branch_to_label(operands[2].value());
    }
}

fn check_single_register_branch(
    name: &str,
    operands: &[Operand],
    machine: &mut Machine,
) -> bool {
    if !check_arity(name, operands, 2, machine) {
        return false;
    }
    if !machine.has_int_register(operands[0].value()) {
        machine
            .diagnostics
            .add_error(format!("{name} instruction register not found."));
        return false;
    }
    true
}

pub(super) fn check_bgez(operands: &[Operand], machine: &mut Machine) -> bool {
    check_single_register_branch("bgez", operands, machine)
}

pub(super) fn exec_bgez(operands: &[Operand], machine: &mut Machine) {
    if !check_bgez(operands, machine) {
        return;
    }
    if machine.register_value(operands[0].value()) >= 0 {
        machine.branch_to_label(operands[1].value());
    }
}

pub(super) fn check_blez(operands: &[Operand], machine: &mut Machine) -> bool {
    check_single_register_branch("blez", operands, machine)
}

pub(super) fn exec_blez(operands: &[Operand], machine: &mut Machine) {
    if !check_blez(operands, machine) {
        return;
    }
    if machine.register_value(operands[0].value()) <= 0 {
        machine.branch_to_label(operands[1].value());
    }
}

pub(super) fn check_bltzal(operands: &[Operand], machine: &mut Machine) -> bool {
    check_single_register_branch("bltzal", operands, machine)
}

/// Branch-and-link: `$ra` is written only when the branch is taken.
pub(super) fn exec_bltzal(operands: &[Operand], machine: &mut Machine) {
    if !check_bltzal(operands, machine) {
        return;
    }
    if machine.register_value(operands[0].value()) < 0 {
        let link = machine.program_counter() + 1;
        machine.set_register_value(reg::RA, link as i32);
        machine.branch_to_label(operands[1].value());
    }
}

pub(super) fn check_j(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("j", operands, 1, machine)
}

pub(super) fn exec_j(operands: &[Operand], machine: &mut Machine) {
    if !check_j(operands, machine) {
        return;
    }
    machine.jump_to_label(operands[0].value());
}

pub(super) fn check_jal(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("jal", operands, 1, machine)
}

pub(super) fn exec_jal(operands: &[Operand], machine: &mut Machine) {
    if !check_jal(operands, machine) {
        return;
    }
    let link = machine.program_counter() + 1;
    machine.set_register_value(reg::RA, link as i32);
    machine.jump_to_label(operands[0].value());
}

pub(super) fn check_jalr(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("jalr", operands, 1, machine) {
        return false;
    }
    if !machine.has_int_register(operands[0].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    true
}

pub(super) fn exec_jalr(operands: &[Operand], machine: &mut Machine) {
    if !check_jalr(operands, machine) {
        return;
    }
    let link = machine.program_counter() + 1;
    machine.set_register_value(reg::RA, link as i32);
    machine.jump_to_register(operands[0].value());
}

pub(super) fn check_eret(operands: &[Operand], machine: &mut Machine) -> bool {
    if !operands.is_empty() {
        machine
            .diagnostics
            .add_error("eret instruction must have no operands.");
        return false;
    }
    true
}

/// Exception return: restores `pc` from the EPC CP0 register.
pub(super) fn exec_eret(operands: &[Operand], machine: &mut Machine) {
    if !check_eret(operands, machine) {
        return;
    }
    let return_address = machine.cp0_register_value(reg::EPC);
    machine.set_program_counter(return_address as i64);
}

pub(super) fn check_break(operands: &[Operand], machine: &mut Machine) -> bool {
    if operands.len() > 1 {
        machine
            .diagnostics
            .add_error("break instruction must have zero or one operand.");
        return false;
    }
    true
}

/// Records the break exception in CP0 (cause 9, EPC = current pc). With an
/// operand, also shuts the program down using the operand as exit code.
pub(super) fn exec_break(operands: &[Operand], machine: &mut Machine) {
    if !check_break(operands, machine) {
        return;
    }
    machine.set_cp0_register_value(reg::CAUSE, 9);
    machine.set_cp0_register_value(reg::EPC, machine.program_counter() as i32);
    if let Some(operand) = operands.first() {
        match operand.value().parse::<i32>() {
            Ok(exit_code) => {
                machine.request_shutdown(exit_code);
                machine.finish();
            }
            Err(_) => {
                machine
                    .diagnostics
                    .add_error("break instruction error code must be an integer.");
            }
        }
    }
}

pub(super) fn check_nop(operands: &[Operand], machine: &mut Machine) -> bool {
    if !operands.is_empty() {
        machine
            .diagnostics
            .add_error("nop instruction must have no operands.");
        return false;
    }
    true
}

pub(super) fn exec_nop(operands: &[Operand], machine: &mut Machine) {
    check_nop(operands, machine);
}
