mod common;

use common::{exec, machine_with_io, run_program, run_program_with_input, test_machine, CapturedOutput};
use mips_rs::HEAP_BASE;
use pretty_assertions::assert_eq;

#[test]
fn hello_program_prints_and_exits() {
    let run = run_program(
        r#"
.data
msg: .asciiz "hi"
.text
la $a0, msg
li $v0, 4
syscall
li $v0, 10
syscall
li $a0, 99
li $v0, 1
syscall
"#,
    );
    assert_eq!(run.output, "hi\n");
    assert_eq!(run.exit_code, 0);
    assert!(run.errors.is_empty());
}

#[test]
fn string_escapes_are_expanded_when_printed() {
    let run = run_program(
        r#"
.data
msg: .asciiz "a\tb"
.text
la $a0, msg
li $v0, 4
syscall
li $v0, 10
syscall
"#,
    );
    assert_eq!(run.output, "a\tb\n");
}

#[test]
fn print_character_uses_the_low_byte() {
    let run = run_program(
        r#"
.data
.text
li $a0, 65
li $v0, 11
syscall
li $v0, 10
syscall
"#,
    );
    assert_eq!(run.output, "A\n");
}

#[test]
fn print_double_reads_f12() {
    let output = CapturedOutput::default();
    let mut m = machine_with_io("", output.clone());
    m.set_fp_register_value("$f12", 3.5);
    m.set_register_value("$v0", 3);
    exec(&mut m, "syscall", &[]);
    assert_eq!(output.text(), "3.5\n");
}

#[test]
fn read_integer_echo() {
    let run = run_program_with_input(
        r#"
.data
.text
li $v0, 5
syscall
move $a0, $v0
li $v0, 1
syscall
li $v0, 10
syscall
"#,
        "42\n",
    );
    assert_eq!(run.output, "42\n");
    assert!(run.errors.is_empty());
}

#[test]
fn read_integer_takes_the_first_token() {
    let run = run_program_with_input(
        r#"
.data
.text
li $v0, 5
syscall
move $a0, $v0
li $v0, 1
syscall
li $v0, 10
syscall
"#,
        "  7 extra tokens\n",
    );
    assert_eq!(run.output, "7\n");
}

#[test]
fn read_integer_at_end_of_input_is_a_diagnostic() {
    let run = run_program_with_input(
        r#"
.data
.text
li $v0, 5
syscall
li $v0, 10
syscall
"#,
        "",
    );
    assert!(run
        .errors
        .iter()
        .any(|e| e.contains("End of input reached while reading integer")));
}

#[test]
fn read_integer_rejects_bad_format_and_stores_zero() {
    let run = run_program_with_input(
        r#"
.data
.text
li $v0, 5
syscall
move $a0, $v0
li $v0, 1
syscall
li $v0, 10
syscall
"#,
        "abc\n",
    );
    assert_eq!(run.output, "0\n");
    assert!(run
        .errors
        .iter()
        .any(|e| e.contains("Invalid integer format in input: abc")));
}

#[test]
fn read_string_truncates_to_the_buffer() {
    let run = run_program_with_input(
        r#"
.data
buf: .space 8
.text
la $a0, buf
li $a1, 8
li $v0, 8
syscall
la $a0, buf
li $v0, 4
syscall
li $v0, 10
syscall
"#,
        "hello world\n",
    );
    assert_eq!(run.output, "hello w\n");
}

#[test]
fn read_character_returns_one_byte() {
    let mut m = machine_with_io("xy", CapturedOutput::default());
    m.set_register_value("$v0", 12);
    exec(&mut m, "syscall", &[]);
    assert_eq!(m.register_value("$v0"), i32::from(b'x'));
}

#[test]
fn read_character_at_end_of_input_stores_zero() {
    let mut m = test_machine();
    m.set_register_value("$v0", 12);
    exec(&mut m, "syscall", &[]);
    assert_eq!(m.register_value("$v0"), 0);
    assert!(!m.diagnostics.has_errors());
}

#[test]
fn sbrk_bumps_the_heap_pointer_word_aligned() {
    let mut m = test_machine();
    m.set_register_value("$v0", 9);
    m.set_register_value("$a0", 5);
    exec(&mut m, "syscall", &[]);
    assert_eq!(m.register_value("$v0"), HEAP_BASE);

    m.set_register_value("$v0", 9);
    m.set_register_value("$a0", 4);
    exec(&mut m, "syscall", &[]);
    // 5 bytes rounds up to the next word boundary.
    assert_eq!(m.register_value("$v0"), HEAP_BASE + 8);
}

#[test]
fn sbrk_rejects_negative_and_oversized_requests() {
    let mut m = test_machine();
    m.set_register_value("$v0", 9);
    m.set_register_value("$a0", -1);
    exec(&mut m, "syscall", &[]);
    assert_eq!(m.register_value("$v0"), -1);

    m.set_register_value("$v0", 9);
    m.set_register_value("$a0", 17 * 1024 * 1024);
    exec(&mut m, "syscall", &[]);
    assert_eq!(m.register_value("$v0"), -1);
    assert_eq!(m.diagnostics.errors().len(), 2);
}

#[test]
fn syscall_sentinel_and_unsupported_values() {
    let mut m = test_machine();
    m.set_register_value("$v0", -1);
    exec(&mut m, "syscall", &[]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("No valid value stored in $v0")));

    m.set_register_value("$v0", 99);
    exec(&mut m, "syscall", &[]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Unsupported syscall value: 99")));
}

#[test]
fn syscall_takes_no_operands() {
    let mut m = test_machine();
    exec(&mut m, "syscall", &["$t0"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("syscall instruction must have no operands")));
}

#[test]
fn exit2_propagates_the_code_immediately() {
    let run = run_program(
        r#"
.data
.text
li $a0, 42
li $v0, 17
syscall
li $a0, 1
li $v0, 1
syscall
"#,
    );
    assert_eq!(run.exit_code, 42);
    assert_eq!(run.output, "");
}

#[test]
fn first_shutdown_request_wins() {
    let mut m = test_machine();
    m.request_shutdown(3);
    m.request_shutdown(7);
    assert_eq!(m.finish(), 3);
    assert!(m.is_finished());
    // Finalizing again is harmless and keeps the code.
    assert_eq!(m.finish(), 3);
}
