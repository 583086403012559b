//! Instruction handlers and the static dispatch table.
//!
//! Each entry pairs a lowercase mnemonic with three functions sharing a fixed
//! contract: `check_operands` validates arity, operand types and domain
//! preconditions; `check_destination` validates the destination register;
//! `execute` re-runs both checks and mutates machine state only when they
//! pass. Failures are reported through the machine's diagnostic collector and
//! leave state untouched.

mod arith;
mod control;
mod fp;
mod logic;
mod mem;
mod syscall;
mod trap;

use crate::instruction::Operand;
use crate::machine::Machine;

pub type CheckFn = fn(&[Operand], &mut Machine) -> bool;
pub type ExecuteFn = fn(&[Operand], &mut Machine);

pub struct Handler {
    pub name: &'static str,
    pub check_operands: CheckFn,
    pub check_destination: CheckFn,
    pub execute: ExecuteFn,
}

pub fn lookup(mnemonic: &str) -> Option<&'static Handler> {
    TABLE.iter().find(|h| h.name == mnemonic)
}

pub const TABLE: &[Handler] = &[
    Handler {
        name: "add",
        check_operands: arith::check_add,
        check_destination: first_int_destination,
        execute: arith::exec_add,
    },
    Handler {
        name: "addi",
        check_operands: arith::check_addi,
        check_destination: first_int_destination,
        execute: arith::exec_addi,
    },
    Handler {
        name: "addiu",
        check_operands: arith::check_addiu,
        check_destination: first_int_destination_free,
        execute: arith::exec_addiu,
    },
    Handler {
        name: "sub",
        check_operands: arith::check_sub,
        check_destination: first_int_destination,
        execute: arith::exec_sub,
    },
    Handler {
        name: "mult",
        check_operands: arith::check_mult,
        check_destination: no_destination,
        execute: arith::exec_mult,
    },
    Handler {
        name: "multu",
        check_operands: arith::check_multu,
        check_destination: no_destination,
        execute: arith::exec_multu,
    },
    Handler {
        name: "divu",
        check_operands: arith::check_divu,
        check_destination: no_destination,
        execute: arith::exec_divu,
    },
    Handler {
        name: "sltu",
        check_operands: arith::check_sltu,
        check_destination: first_int_destination,
        execute: arith::exec_sltu,
    },
    Handler {
        name: "sltiu",
        check_operands: arith::check_sltiu,
        check_destination: first_int_destination,
        execute: arith::exec_sltiu,
    },
    Handler {
        name: "and",
        check_operands: logic::check_and,
        check_destination: first_int_destination_free,
        execute: logic::exec_and,
    },
    Handler {
        name: "andi",
        check_operands: logic::check_andi,
        check_destination: first_int_destination_free,
        execute: logic::exec_andi,
    },
    Handler {
        name: "or",
        check_operands: logic::check_or,
        check_destination: first_int_destination,
        execute: logic::exec_or,
    },
    Handler {
        name: "ori",
        check_operands: logic::check_ori,
        check_destination: first_int_destination,
        execute: logic::exec_ori,
    },
    Handler {
        name: "nor",
        check_operands: logic::check_nor,
        check_destination: first_int_destination,
        execute: logic::exec_nor,
    },
    Handler {
        name: "xori",
        check_operands: logic::check_xori,
        check_destination: first_int_destination,
        execute: logic::exec_xori,
    },
    Handler {
        name: "sra",
        check_operands: logic::check_sra,
        check_destination: first_int_destination,
        execute: logic::exec_sra,
    },
    Handler {
        name: "add.d",
        check_operands: fp::check_add_d,
        check_destination: first_fp_destination_free,
        execute: fp::exec_add_d,
    },
    Handler {
        name: "add.s",
        check_operands: fp::check_add_s,
        check_destination: first_fp_destination_free,
        execute: fp::exec_add_s,
    },
    Handler {
        name: "mul.d",
        check_operands: fp::check_mul_d,
        check_destination: first_fp_destination,
        execute: fp::exec_mul_d,
    },
    Handler {
        name: "div.d",
        check_operands: fp::check_div_d,
        check_destination: first_fp_destination,
        execute: fp::exec_div_d,
    },
    Handler {
        name: "div.s",
        check_operands: fp::check_div_s,
        check_destination: first_fp_destination,
        execute: fp::exec_div_s,
    },
    Handler {
        name: "abs.d",
        check_operands: fp::check_abs_d,
        check_destination: first_fp_destination_free,
        execute: fp::exec_abs_d,
    },
    Handler {
        name: "abs.s",
        check_operands: fp::check_abs_s,
        check_destination: first_fp_destination_free,
        execute: fp::exec_abs_s,
    },
    Handler {
        name: "sqrt.s",
        check_operands: fp::check_sqrt_s,
        check_destination: first_fp_destination,
        execute: fp::exec_sqrt_s,
    },
    Handler {
        name: "floor.w.d",
        check_operands: fp::check_floor_w_d,
        check_destination: first_int_destination,
        execute: fp::exec_floor_w_d,
    },
    Handler {
        name: "floor.w.s",
        check_operands: fp::check_floor_w_s,
        check_destination: first_int_destination,
        execute: fp::exec_floor_w_s,
    },
    Handler {
        name: "ceil.w.s",
        check_operands: fp::check_ceil_w_s,
        check_destination: first_int_destination,
        execute: fp::exec_ceil_w_s,
    },
    Handler {
        name: "round.ws",
        check_operands: fp::check_round_ws,
        check_destination: first_int_destination,
        execute: fp::exec_round_ws,
    },
    Handler {
        name: "trunc.wd",
        check_operands: fp::check_trunc_wd,
        check_destination: first_int_destination,
        execute: fp::exec_trunc_wd,
    },
    Handler {
        name: "cvt.w.d",
        check_operands: fp::check_cvt_w_d,
        check_destination: first_int_destination,
        execute: fp::exec_cvt_w_d,
    },
    Handler {
        name: "c.eq.d",
        check_operands: fp::check_c_eq_d,
        check_destination: no_destination,
        execute: fp::exec_c_eq_d,
    },
    Handler {
        name: "c.eq.s",
        check_operands: fp::check_c_eq_s,
        check_destination: no_destination,
        execute: fp::exec_c_eq_s,
    },
    Handler {
        name: "movf.d",
        check_operands: fp::check_movf_d,
        check_destination: first_fp_destination,
        execute: fp::exec_movf_d,
    },
    Handler {
        name: "lw",
        check_operands: mem::check_lw,
        check_destination: first_int_destination,
        execute: mem::exec_lw,
    },
    Handler {
        name: "la",
        check_operands: mem::check_la,
        check_destination: first_int_destination,
        execute: mem::exec_la,
    },
    Handler {
        name: "li",
        check_operands: mem::check_li,
        check_destination: first_int_destination,
        execute: mem::exec_li,
    },
    Handler {
        name: "lui",
        check_operands: mem::check_lui,
        check_destination: first_int_destination,
        execute: mem::exec_lui,
    },
    Handler {
        name: "sb",
        check_operands: mem::check_sb,
        check_destination: no_destination,
        execute: mem::exec_sb,
    },
    Handler {
        name: "sdc1",
        check_operands: mem::check_sdc1,
        check_destination: no_destination,
        execute: mem::exec_sdc1,
    },
    Handler {
        name: "move",
        check_operands: mem::check_move,
        check_destination: first_int_destination,
        execute: mem::exec_move,
    },
    Handler {
        name: "mfhi",
        check_operands: mem::check_mfhi,
        check_destination: first_int_destination,
        execute: mem::exec_mfhi,
    },
    Handler {
        name: "mflo",
        check_operands: mem::check_mflo,
        check_destination: first_int_destination,
        execute: mem::exec_mflo,
    },
    Handler {
        name: "movz",
        check_operands: mem::check_movz,
        check_destination: first_int_destination,
        execute: mem::exec_movz,
    },
    Handler {
        name: "beq",
        check_operands: control::check_beq,
        check_destination: no_destination,
        execute: control::exec_beq,
    },
    Handler {
        name: "bgez",
        check_operands: control::check_bgez,
        check_destination: no_destination,
        execute: control::exec_bgez,
    },
    Handler {
        name: "blez",
        check_operands: control::check_blez,
        check_destination: no_destination,
        execute: control::exec_blez,
    },
    Handler {
        name: "bltzal",
        check_operands: control::check_bltzal,
        check_destination: no_destination,
        execute: control::exec_bltzal,
    },
    Handler {
        name: "j",
        check_operands: control::check_j,
        check_destination: no_destination,
        execute: control::exec_j,
    },
    Handler {
        name: "jal",
        check_operands: control::check_jal,
        check_destination: no_destination,
        execute: control::exec_jal,
    },
    Handler {
        name: "jalr",
        check_operands: control::check_jalr,
        check_destination: no_destination,
        execute: control::exec_jalr,
    },
    Handler {
        name: "eret",
        check_operands: control::check_eret,
        check_destination: no_destination,
        execute: control::exec_eret,
    },
    Handler {
        name: "break",
        check_operands: control::check_break,
        check_destination: no_destination,
        execute: control::exec_break,
    },
    Handler {
        name: "nop",
        check_operands: control::check_nop,
        check_destination: no_destination,
        execute: control::exec_nop,
    },
    Handler {
        name: "teqi",
        check_operands: trap::check_teqi,
        check_destination: no_destination,
        execute: trap::exec_teqi,
    },
    Handler {
        name: "tne",
        check_operands: trap::check_tne,
        check_destination: no_destination,
        execute: trap::exec_tne,
    },
    Handler {
        name: "tnei",
        check_operands: trap::check_tnei,
        check_destination: no_destination,
        execute: trap::exec_tnei,
    },
    Handler {
        name: "tgeiu",
        check_operands: trap::check_tgeiu,
        check_destination: no_destination,
        execute: trap::exec_tgeiu,
    },
    Handler {
        name: "syscall",
        check_operands: syscall::check_syscall,
        check_destination: no_destination,
        execute: syscall::exec_syscall,
    },
];

// ------------------------------------------------
// Shared validation helpers
// ------------------------------------------------

fn check_arity(name: &str, operands: &[Operand], expected: usize, machine: &mut Machine) -> bool {
    if operands.len() != expected {
        machine.diagnostics.add_error(format!(
            "{name} instruction must have exactly {expected} operand(s)."
        ));
        return false;
    }
    true
}

fn int_register_exists(name: &str, machine: &mut Machine) -> bool {
    if !machine.has_int_register(name) {
        machine
            .diagnostics
            .add_error(format!("Integer register not found: {name}"));
        return false;
    }
    true
}

fn fp_register_exists(name: &str, machine: &mut Machine) -> bool {
    if !machine.has_fp_register(name) {
        machine
            .diagnostics
            .add_error(format!("Floating-point register not found: {name}"));
        return false;
    }
    true
}

fn source_int_registers(operands: &[Operand], machine: &mut Machine) -> bool {
    let ok = operands
        .iter()
        .all(|op| machine.has_int_register(op.value()));
    if !ok {
        machine.diagnostics.add_error("Source registers not found.");
    }
    ok
}

fn source_fp_registers(operands: &[Operand], machine: &mut Machine) -> bool {
    let ok = operands.iter().all(|op| machine.has_fp_register(op.value()));
    if !ok {
        machine.diagnostics.add_error("Source registers not found.");
    }
    ok
}

fn no_destination(_: &[Operand], _: &mut Machine) -> bool {
    true
}

fn first_int_destination(operands: &[Operand], machine: &mut Machine) -> bool {
    let Some(op) = operands.first() else {
        return true;
    };
    if !machine.has_int_register(op.value()) {
        machine
            .diagnostics
            .add_error(format!("Register {} not found.", op.value()));
        return false;
    }
    true
}

fn first_fp_destination(operands: &[Operand], machine: &mut Machine) -> bool {
    let Some(op) = operands.first() else {
        return true;
    };
    if !machine.has_fp_register(op.value()) {
        machine
            .diagnostics
            .add_error(format!("Register {} not found.", op.value()));
        return false;
    }
    true
}

/// Inherited precondition for a subset of instructions: the destination must
/// sit at offset zero of its bank, i.e. be the first-laid-out register, or it
/// counts as "already in use".
fn first_int_destination_free(operands: &[Operand], machine: &mut Machine) -> bool {
    let Some(op) = operands.first() else {
        return true;
    };
    match machine.int_register_offset(op.value()) {
        None => {
            machine
                .diagnostics
                .add_error(format!("Register {} not found.", op.value()));
            false
        }
        Some(0) => true,
        Some(_) => {
            machine
                .diagnostics
                .add_error(format!("Register {} is already in use.", op.value()));
            false
        }
    }
}

fn first_fp_destination_free(operands: &[Operand], machine: &mut Machine) -> bool {
    let Some(op) = operands.first() else {
        return true;
    };
    match machine.fp_register_offset(op.value()) {
        None => {
            machine
                .diagnostics
                .add_error(format!("Register {} not found.", op.value()));
            false
        }
        Some(0) => true,
        Some(_) => {
            machine
                .diagnostics
                .add_error(format!("Register {} is already in use.", op.value()));
            false
        }
    }
}

fn parse_immediate(name: &str, operand: &Operand, machine: &mut Machine) -> Option<i32> {
    match operand.value().parse::<i32>() {
        Ok(v) => Some(v),
        Err(_) => {
            machine
                .diagnostics
                .add_error(format!("{name} instruction immediate must be an integer."));
            None
        }
    }
}

fn unsigned_immediate(operand: &Operand, machine: &mut Machine) -> Option<i32> {
    match operand.value().parse::<i32>() {
        Ok(v) if (0..=0xFFFF).contains(&v) => Some(v),
        Ok(_) => {
            machine.diagnostics.add_error("Immediate value out of range.");
            None
        }
        Err(_) => {
            machine.diagnostics.add_error("Invalid immediate value.");
            None
        }
    }
}
