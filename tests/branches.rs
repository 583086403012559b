mod common;

use common::{exec, run_program, test_machine};
use pretty_assertions::assert_eq;

#[test]
fn beq_on_equal_registers_skips_to_the_label() {
    let run = run_program(
        r#"
.data
.text
main: li $t0, 5
beq $t0, $t0, done
li $a0, 99
li $v0, 1
syscall
done: li $a0, 7
li $v0, 1
syscall
li $v0, 10
syscall
"#,
    );
    assert_eq!(run.output, "7\n");
    assert_eq!(run.exit_code, 0);
    assert!(run.errors.is_empty());
}

#[test]
fn branch_stops_one_slot_short_while_jump_lands_on_target() {
    let mut m = test_machine();
    m.define_label("done", 5);

    m.branch_to_label("done");
    assert_eq!(m.program_counter(), 4);

    m.jump_to_label("done");
    assert_eq!(m.program_counter(), 5);
}

#[test]
fn branch_to_missing_label_is_a_diagnostic() {
    let mut m = test_machine();
    m.branch_to_label("nowhere");
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Label not found: nowhere")));
}

#[test]
fn bgez_and_blez_test_against_zero() {
    let mut m = test_machine();
    m.define_label("target", 9);

    m.set_register_value("$t0", -1);
    exec(&mut m, "bgez", &["$t0", "target"]);
    assert_eq!(m.program_counter(), 0);

    m.set_register_value("$t0", 0);
    exec(&mut m, "bgez", &["$t0", "target"]);
    assert_eq!(m.program_counter(), 8);

    m.set_program_counter(0);
    exec(&mut m, "blez", &["$t0", "target"]);
    assert_eq!(m.program_counter(), 8);

    m.set_program_counter(0);
    m.set_register_value("$t0", 1);
    exec(&mut m, "blez", &["$t0", "target"]);
    assert_eq!(m.program_counter(), 0);
}

#[test]
fn bltzal_links_only_when_taken() {
    let mut m = test_machine();
    m.define_label("target", 10);
    m.set_program_counter(3);

    m.set_register_value("$t0", 1);
    exec(&mut m, "bltzal", &["$t0", "target"]);
    assert_eq!(m.register_value("$ra"), 0);
    assert_eq!(m.program_counter(), 3);

    m.set_register_value("$t0", -1);
    exec(&mut m, "bltzal", &["$t0", "target"]);
    assert_eq!(m.register_value("$ra"), 4);
    assert_eq!(m.program_counter(), 9);
}

#[test]
fn jal_records_the_return_slot() {
    let mut m = test_machine();
    m.define_label("sub", 7);
    m.set_program_counter(2);
    exec(&mut m, "jal", &["sub"]);
    assert_eq!(m.register_value("$ra"), 3);
    assert_eq!(m.program_counter(), 7);
}

#[test]
fn jalr_jumps_through_a_register() {
    let mut m = test_machine();
    m.set_register_value("$t0", 6);
    m.set_program_counter(1);
    exec(&mut m, "jalr", &["$t0"]);
    assert_eq!(m.register_value("$ra"), 2);
    assert_eq!(m.program_counter(), 6);
}

#[test]
fn eret_restores_pc_from_epc() {
    let mut m = test_machine();
    m.set_cp0_register_value("$epc", 12);
    exec(&mut m, "eret", &[]);
    assert_eq!(m.program_counter(), 12);
}

#[test]
fn break_without_operand_records_the_exception_and_continues() {
    let mut m = test_machine();
    m.set_program_counter(4);
    exec(&mut m, "break", &[]);
    assert_eq!(m.cp0_register_value("$cause"), 9);
    assert_eq!(m.cp0_register_value("$epc"), 4);
    assert!(!m.is_finished());
}

#[test]
fn break_with_operand_exits_with_its_code() {
    let run = run_program(
        r#"
.data
.text
break 3
li $a0, 1
li $v0, 1
syscall
"#,
    );
    assert_eq!(run.exit_code, 3);
    assert_eq!(run.output, "");
}

#[test]
fn break_rejects_non_integer_error_code() {
    let mut m = test_machine();
    exec(&mut m, "break", &["abc"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("error code must be an integer")));
    assert!(!m.is_finished());
}

#[test]
fn jal_and_jalr_make_a_round_trip() {
    let run = run_program(
        r#"
.data
.text
main: jal sub
nop
li $a0, 2
li $v0, 1
syscall
li $v0, 10
syscall
sub: move $t5, $ra
li $a0, 1
li $v0, 1
syscall
jalr $t5
"#,
    );
    assert_eq!(run.output, "1\n2\n");
    assert_eq!(run.exit_code, 0);
}

#[test]
fn unknown_mnemonic_is_reported_and_execution_continues() {
    let run = run_program(
        r#"
.data
.text
frobnicate $t0
li $a0, 4
li $v0, 1
syscall
li $v0, 10
syscall
"#,
    );
    assert_eq!(run.output, "4\n");
    assert!(run
        .errors
        .iter()
        .any(|e| e.contains("Unknown instruction: frobnicate")));
}

#[test]
fn negative_program_counter_halts_with_a_diagnostic() {
    let run = run_program(
        r#"
.data
.text
li $t0, -40
jalr $t0
nop
"#,
    );
    assert_eq!(run.exit_code, 0);
    assert!(run
        .errors
        .iter()
        .any(|e| e.contains("Program counter out of range")));
}
