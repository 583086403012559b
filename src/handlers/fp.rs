//! Floating-point arithmetic, conversions and the FP condition flag.
//!
//! Double-precision forms operate on the full 64-bit register value; the
//! `.s` forms narrow to `f32` before computing and widen the result back on
//! the store, so single-precision rounding is observable.

use super::{
    check_arity, first_fp_destination, first_fp_destination_free, first_int_destination,
    fp_register_exists, source_fp_registers,
};
use crate::instruction::Operand;
use crate::machine::Machine;

fn finite_sources(name: &str, values: &[f64], machine: &mut Machine) -> bool {
    if values.iter().any(|v| !v.is_finite()) {
        machine
            .diagnostics
            .add_error(format!("{name} instruction arithmetic overflow detected."));
        return false;
    }
    true
}

pub(super) fn check_add_d(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("add.d", operands, 3, machine) {
        return false;
    }
    let value1 = machine.fp_register_value(operands[1].value());
    let value2 = machine.fp_register_value(operands[2].value());
    finite_sources("add.d", &[value1, value2], machine)
}

pub(super) fn exec_add_d(operands: &[Operand], machine: &mut Machine) {
    if !check_add_d(operands, machine) || !first_fp_destination_free(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[1].value());
    let value2 = machine.fp_register_value(operands[2].value());
    machine.set_fp_register_value(operands[0].value(), value1 + value2);
}

pub(super) fn check_add_s(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("add.s", operands, 3, machine) {
        return false;
    }
    let value1 = machine.fp_register_value(operands[1].value()) as f32;
    let value2 = machine.fp_register_value(operands[2].value()) as f32;
    finite_sources("add.s", &[value1 as f64, value2 as f64], machine)
}

pub(super) fn exec_add_s(operands: &[Operand], machine: &mut Machine) {
    if !check_add_s(operands, machine) || !first_fp_destination_free(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[1].value()) as f32;
    let value2 = machine.fp_register_value(operands[2].value()) as f32;
    machine.set_fp_register_value(operands[0].value(), (value1 + value2) as f64);
}

pub(super) fn check_mul_d(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("mul.d", operands, 3, machine) && source_fp_registers(&operands[1..], machine)
}

pub(super) fn exec_mul_d(operands: &[Operand], machine: &mut Machine) {
    if !check_mul_d(operands, machine) || !first_fp_destination(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[1].value());
    let value2 = machine.fp_register_value(operands[2].value());
    machine.set_fp_register_value(operands[0].value(), value1 * value2);
}

pub(super) fn check_div_d(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("div.d", operands, 3, machine) {
        return false;
    }
    if !machine.has_fp_register(operands[0].value()) {
        machine
            .diagnostics
            .add_error("Destination register not found.");
        return false;
    }
    if !source_fp_registers(&operands[1..], machine) {
        return false;
    }
    if machine.fp_register_value(operands[2].value()) == 0.0 {
        machine.diagnostics.add_error("Division by zero detected.");
        return false;
    }
    true
}

pub(super) fn exec_div_d(operands: &[Operand], machine: &mut Machine) {
    if !check_div_d(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[1].value());
    let value2 = machine.fp_register_value(operands[2].value());
    if value2 == 0.0 {
        machine
            .diagnostics
            .add_error("Division by zero in div.d instruction.");
        return;
    }
    machine.set_fp_register_value(operands[0].value(), value1 / value2);
}

pub(super) fn check_div_s(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("div.s", operands, 3, machine) {
        return false;
    }
    if !machine.has_fp_register(operands[0].value()) {
        machine
            .diagnostics
            .add_error("Destination register not found.");
        return false;
    }
    source_fp_registers(&operands[1..], machine)
}

pub(super) fn exec_div_s(operands: &[Operand], machine: &mut Machine) {
    if !check_div_s(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[1].value()) as f32;
    let value2 = machine.fp_register_value(operands[2].value()) as f32;
    if value2 == 0.0 {
        machine
            .diagnostics
            .add_error("Division by zero in div.s instruction.");
        return;
    }
    machine.set_fp_register_value(operands[0].value(), (value1 / value2) as f64);
}

pub(super) fn check_abs_d(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("abs.d", operands, 2, machine) {
        return false;
    }
    if !fp_register_exists(operands[1].value(), machine) {
        return false;
    }
    let value = machine.fp_register_value(operands[1].value());
    finite_sources("abs.d", &[value], machine)
}

pub(super) fn exec_abs_d(operands: &[Operand], machine: &mut Machine) {
    if !check_abs_d(operands, machine) || !first_fp_destination_free(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value());
    machine.set_fp_register_value(operands[0].value(), value.abs());
}

pub(super) fn check_abs_s(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("abs.s", operands, 2, machine) {
        return false;
    }
    if !fp_register_exists(operands[1].value(), machine) {
        return false;
    }
    let value = machine.fp_register_value(operands[1].value()) as f32;
    finite_sources("abs.s", &[value as f64], machine)
}

pub(super) fn exec_abs_s(operands: &[Operand], machine: &mut Machine) {
    if !check_abs_s(operands, machine) || !first_fp_destination_free(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value()) as f32;
    machine.set_fp_register_value(operands[0].value(), value.abs() as f64);
}

pub(super) fn check_sqrt_s(operands: &[Operand], machine: &mut Machine) -> bool {
    check_arity("sqrt.s", operands, 2, machine) && fp_register_exists(operands[1].value(), machine)
}

pub(super) fn exec_sqrt_s(operands: &[Operand], machine: &mut Machine) {
    if !check_sqrt_s(operands, machine) || !first_fp_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value()) as f32;
    if value < 0.0 {
        machine
            .diagnostics
            .add_error("Cannot compute square root of negative number.");
        return;
    }
    machine.set_fp_register_value(operands[0].value(), value.sqrt() as f64);
}

fn check_fp_to_int(
    name: &str,
    operands: &[Operand],
    reject_non_finite: bool,
    machine: &mut Machine,
) -> bool {
    if !check_arity(name, operands, 2, machine) {
        return false;
    }
    if !fp_register_exists(operands[1].value(), machine) {
        return false;
    }
    if reject_non_finite {
        let value = machine.fp_register_value(operands[1].value());
        if !value.is_finite() {
            machine
                .diagnostics
                .add_error("Invalid floating point value.");
            return false;
        }
    }
    true
}

pub(super) fn check_floor_w_d(operands: &[Operand], machine: &mut Machine) -> bool {
    check_fp_to_int("floor.w.d", operands, true, machine)
}

pub(super) fn exec_floor_w_d(operands: &[Operand], machine: &mut Machine) {
    if !check_floor_w_d(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value());
    machine.set_register_value(operands[0].value(), value.floor() as i32);
}

pub(super) fn check_floor_w_s(operands: &[Operand], machine: &mut Machine) -> bool {
    check_fp_to_int("floor.w.s", operands, true, machine)
}

pub(super) fn exec_floor_w_s(operands: &[Operand], machine: &mut Machine) {
    if !check_floor_w_s(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value()) as f32;
    machine.set_register_value(operands[0].value(), value.floor() as i32);
}

pub(super) fn check_ceil_w_s(operands: &[Operand], machine: &mut Machine) -> bool {
    check_fp_to_int("ceil.w.s", operands, true, machine)
}

pub(super) fn exec_ceil_w_s(operands: &[Operand], machine: &mut Machine) {
    if !check_ceil_w_s(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value()) as f32;
    machine.set_register_value(operands[0].value(), value.ceil() as i32);
}

pub(super) fn check_round_ws(operands: &[Operand], machine: &mut Machine) -> bool {
    check_fp_to_int("round.ws", operands, false, machine)
}

pub(super) fn exec_round_ws(operands: &[Operand], machine: &mut Machine) {
    if !check_round_ws(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value()) as f32;
    machine.set_register_value(operands[0].value(), value.round() as i32);
}

pub(super) fn check_trunc_wd(operands: &[Operand], machine: &mut Machine) -> bool {
    check_fp_to_int("trunc.wd", operands, false, machine)
}

/// Truncation toward zero; NaN converts to 0 and out-of-range saturates.
pub(super) fn exec_trunc_wd(operands: &[Operand], machine: &mut Machine) {
    if !check_trunc_wd(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value());
    machine.set_register_value(operands[0].value(), value as i32);
}

pub(super) fn check_cvt_w_d(operands: &[Operand], machine: &mut Machine) -> bool {
    check_fp_to_int("cvt.w.d", operands, true, machine)
}

pub(super) fn exec_cvt_w_d(operands: &[Operand], machine: &mut Machine) {
    if !check_cvt_w_d(operands, machine) || !first_int_destination(operands, machine) {
        return;
    }
    let value = machine.fp_register_value(operands[1].value());
    machine.set_register_value(operands[0].value(), value as i32);
}

pub(super) fn check_c_eq_d(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("c.eq.d", operands, 2, machine) {
        return false;
    }
    let ok = machine.has_fp_register(operands[0].value())
        && machine.has_fp_register(operands[1].value());
    if !ok {
        machine
            .diagnostics
            .add_error("c.eq.d instruction registers not found.");
    }
    ok
}

pub(super) fn exec_c_eq_d(operands: &[Operand], machine: &mut Machine) {
    if !check_c_eq_d(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[0].value());
    let value2 = machine.fp_register_value(operands[1].value());
    machine.set_fp_condition_flag(value1 == value2);
}

pub(super) fn check_c_eq_s(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("c.eq.s", operands, 2, machine) {
        return false;
    }
    let ok = machine.has_fp_register(operands[0].value())
        && machine.has_fp_register(operands[1].value());
    if !ok {
        machine
            .diagnostics
            .add_error("c.eq.s instruction registers not found.");
    }
    ok
}

pub(super) fn exec_c_eq_s(operands: &[Operand], machine: &mut Machine) {
    if !check_c_eq_s(operands, machine) {
        return;
    }
    let value1 = machine.fp_register_value(operands[0].value()) as f32;
    let value2 = machine.fp_register_value(operands[1].value()) as f32;
    machine.set_fp_condition_flag(value1 == value2);
}

pub(super) fn check_movf_d(operands: &[Operand], machine: &mut Machine) -> bool {
    if !check_arity("movf.d", operands, 2, machine) {
        return false;
    }
    if !machine.has_fp_register(operands[1].value()) {
        machine.diagnostics.add_error("Source Register not found.");
        return false;
    }
    true
}

/// Moves only when the FP condition flag is clear.
pub(super) fn exec_movf_d(operands: &[Operand], machine: &mut Machine) {
    if !check_movf_d(operands, machine) || !first_fp_destination(operands, machine) {
        return;
    }
    if !machine.fp_condition_flag() {
        let value = machine.fp_register_value(operands[1].value());
        machine.set_fp_register_value(operands[0].value(), value);
    }
}
