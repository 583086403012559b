//! The `syscall` sub-dispatch on the value held in `$v0`.

use super::Machine;
use crate::instruction::Operand;
use crate::machine::reg;

const MAX_SBRK_SIZE: i32 = 16 * 1024 * 1024;
const MAX_STRING_LENGTH: usize = 65536;

pub(super) fn check_syscall(operands: &[Operand], machine: &mut Machine) -> bool {
    if !operands.is_empty() {
        machine
            .diagnostics
            .add_error("syscall instruction must have no operands.");
        return false;
    }
    true
}

pub(super) fn exec_syscall(operands: &[Operand], machine: &mut Machine) {
    if !check_syscall(operands, machine) {
        return;
    }
    let value = machine.register_value(reg::V0);
    match value {
        -1 => machine
            .diagnostics
            .add_error("No valid value stored in $v0 register for syscall instruction."),
        1 => print_integer(machine),
        2 => print_float(machine),
        3 => print_double(machine),
        4 => print_string(machine),
        5 => read_integer(machine),
        6 => read_float(machine),
        7 => read_double(machine),
        8 => read_string(machine),
        9 => sbrk(machine),
        // Exit: raises the shutdown signal and lets the loop's checkpoint
        // halt and finalize with code 0.
        10 => machine.request_shutdown(0),
        11 => print_character(machine),
        12 => read_character(machine),
        17 => exit_with_code(machine),
        other => machine
            .diagnostics
            .add_error(format!("Unsupported syscall value: {other}")),
    }
}

fn print_integer(machine: &mut Machine) {
    let value = machine.register_value(reg::A0);
    machine.print_line(&value.to_string());
}

fn print_float(machine: &mut Machine) {
    let value = machine.fp_register_value(reg::F12) as f32;
    machine.print_line(&value.to_string());
}

fn print_double(machine: &mut Machine) {
    let value = machine.fp_register_value(reg::F12);
    machine.print_line(&value.to_string());
}

/// Prints the NUL-terminated string at the address in `$a0`, expanding
/// escape sequences.
fn print_string(machine: &mut Machine) {
    let address = machine.register_value(reg::A0);
    if address < 0 {
        machine
            .diagnostics
            .add_error(format!("Invalid memory address for string: {address}"));
        return;
    }
    let mut bytes = Vec::new();
    let mut current = address;
    loop {
        let b = machine.load_byte(current);
        if b == 0 {
            break;
        }
        bytes.push(b);
        if bytes.len() > MAX_STRING_LENGTH {
            machine
                .diagnostics
                .add_error("String too long (>64KB) or not null-terminated");
            return;
        }
        current += 1;
    }
    let raw = String::from_utf8_lossy(&bytes);
    machine.print_line(&parse_escape_sequences(&raw));
}

fn print_character(machine: &mut Machine) {
    let value = machine.register_value(reg::A0);
    let character = (value & 0xFF) as u8 as char;
    machine.print_line(&character.to_string());
}

fn read_integer(machine: &mut Machine) {
    match machine.read_input_line() {
        Err(e) => {
            machine
                .diagnostics
                .add_error(format!("I/O error while reading integer: {e}"));
            machine.set_register_value(reg::V0, 0);
        }
        Ok(None) => {
            machine
                .diagnostics
                .add_error("End of input reached while reading integer");
        }
        Ok(Some(line)) => {
            let line = line.trim();
            if line.is_empty() {
                machine.set_register_value(reg::V0, 0);
                return;
            }
            let first = line.split_whitespace().next().unwrap_or(line);
            match first.parse::<i32>() {
                Ok(value) => machine.set_register_value(reg::V0, value),
                Err(_) => {
                    machine
                        .diagnostics
                        .add_error(format!("Invalid integer format in input: {first}"));
                    machine.set_register_value(reg::V0, 0);
                }
            }
        }
    }
}

fn read_float(machine: &mut Machine) {
    match machine.read_input_line() {
        Err(e) => {
            machine
                .diagnostics
                .add_error(format!("I/O error while reading float: {e}"));
            machine.set_fp_register_value(reg::F0, 0.0);
        }
        Ok(None) => {
            machine
                .diagnostics
                .add_error("End of input reached while reading float");
        }
        Ok(Some(line)) => {
            let line = line.trim();
            if line.is_empty() {
                machine.set_fp_register_value(reg::F0, 0.0);
                return;
            }
            let first = line.split_whitespace().next().unwrap_or(line);
            match first.parse::<f32>() {
                Ok(value) => machine.set_fp_register_value(reg::F0, value as f64),
                Err(_) => {
                    machine
                        .diagnostics
                        .add_error(format!("Invalid float format in input: {first}"));
                    machine.set_fp_register_value(reg::F0, 0.0);
                }
            }
        }
    }
}

fn read_double(machine: &mut Machine) {
    match machine.read_input_line() {
        Err(e) => {
            machine
                .diagnostics
                .add_error(format!("I/O error while reading double: {e}"));
            machine.set_fp_register_value(reg::F0, 0.0);
        }
        Ok(None) => {
            machine
                .diagnostics
                .add_error("End of input reached while reading double");
        }
        Ok(Some(line)) => {
            let line = line.trim();
            if line.is_empty() {
                machine.set_fp_register_value(reg::F0, 0.0);
                return;
            }
            let first = line.split_whitespace().next().unwrap_or(line);
            match first.parse::<f64>() {
                Ok(value) => machine.set_fp_register_value(reg::F0, value),
                Err(_) => {
                    machine
                        .diagnostics
                        .add_error(format!("Invalid double format in input: {first}"));
                    machine.set_fp_register_value(reg::F0, 0.0);
                }
            }
        }
    }
}

/// Reads a line into the buffer at `$a0`, truncated to `$a1 - 1` bytes plus
/// the NUL terminator.
fn read_string(machine: &mut Machine) {
    let buffer_address = machine.register_value(reg::A0);
    let max_length = machine.register_value(reg::A1);
    if buffer_address < 0 {
        machine.diagnostics.add_error(format!(
            "Invalid buffer address for read_string: {buffer_address}"
        ));
        return;
    }
    if max_length <= 0 {
        machine.diagnostics.add_error(format!(
            "Invalid buffer length for read_string: {max_length}"
        ));
        return;
    }
    match machine.read_input_line() {
        Err(e) => {
            machine
                .diagnostics
                .add_error(format!("I/O error while reading string: {e}"));
            machine.store_byte(buffer_address, 0);
        }
        Ok(None) => {
            machine.store_byte(buffer_address, 0);
        }
        Ok(Some(line)) => {
            let bytes = line.as_bytes();
            let length = bytes.len().min(max_length as usize - 1);
            for (i, &b) in bytes[..length].iter().enumerate() {
                machine.store_byte(buffer_address + i as i32, b);
            }
            machine.store_byte(buffer_address + length as i32, 0);
        }
    }
}

fn read_character(machine: &mut Machine) {
    match machine.read_input_char() {
        Err(e) => {
            machine
                .diagnostics
                .add_error(format!("I/O error while reading character: {e}"));
            machine.set_register_value(reg::V0, 0);
        }
        Ok(None) => machine.set_register_value(reg::V0, 0),
        Ok(Some(b)) => machine.set_register_value(reg::V0, b as i32),
    }
}

/// sbrk: bump-allocates `$a0` bytes on the heap, returning the base address
/// in `$v0` or -1 on a rejected request.
fn sbrk(machine: &mut Machine) {
    let bytes = machine.register_value(reg::A0);
    if bytes < 0 {
        machine
            .diagnostics
            .add_error(format!("Invalid allocation size for sbrk: {bytes}"));
        machine.set_register_value(reg::V0, -1);
        return;
    }
    if bytes > MAX_SBRK_SIZE {
        machine.diagnostics.add_error(format!(
            "Allocation size too large for sbrk: {bytes} (max: {MAX_SBRK_SIZE})"
        ));
        machine.set_register_value(reg::V0, -1);
        return;
    }
    let address = machine.allocate(bytes);
    machine.set_register_value(reg::V0, address);
}

/// exit2: shuts down immediately with the code in `$a0`.
fn exit_with_code(machine: &mut Machine) {
    let exit_code = machine.register_value(reg::A0);
    machine.request_shutdown(exit_code);
    machine.finish();
}

fn parse_escape_sequences(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut escape = false;
    for c in input.chars() {
        if escape {
            match c {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                'b' => result.push('\u{0008}'),
                'f' => result.push('\u{000C}'),
                '\\' => result.push('\\'),
                '"' => result.push('"'),
                '\'' => result.push('\''),
                '0' => result.push('\0'),
                other => {
                    result.push('\\');
                    result.push(other);
                }
            }
            escape = false;
        } else if c == '\\' {
            escape = true;
        } else {
            result.push(c);
        }
    }
    if escape {
        result.push('\\');
    }
    result
}
