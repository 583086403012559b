mod common;

use common::{exec, run_program, test_machine};
use pretty_assertions::assert_eq;

#[test]
fn teqi_fires_only_on_equality() {
    let mut m = test_machine();
    m.set_register_value("$t0", 5);
    exec(&mut m, "teqi", &["$t0", "4"]);
    assert!(!m.diagnostics.has_errors());

    exec(&mut m, "teqi", &["$t0", "5"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("value equals immediate")));
}

#[test]
fn tne_fires_on_differing_registers() {
    let mut m = test_machine();
    m.set_register_value("$t0", 1);
    m.set_register_value("$t1", 1);
    exec(&mut m, "tne", &["$t0", "$t1"]);
    assert!(!m.diagnostics.has_errors());

    m.set_register_value("$t1", 2);
    exec(&mut m, "tne", &["$t0", "$t1"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("values are not equal")));
}

#[test]
fn tnei_fires_on_mismatch() {
    let mut m = test_machine();
    m.set_register_value("$t0", 3);
    exec(&mut m, "tnei", &["$t0", "9"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("value is not equal to immediate")));
}

#[test]
fn tgeiu_compares_unsigned() {
    let mut m = test_machine();
    // -1 widens to 0xFFFFFFFF, which dominates any immediate.
    m.set_register_value("$t0", -1);
    exec(&mut m, "tgeiu", &["$t0", "100"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("greater than or equal to immediate")));

    let mut m = test_machine();
    m.set_register_value("$t0", 1);
    exec(&mut m, "tgeiu", &["$t0", "-1"]);
    assert!(!m.diagnostics.has_errors());
}

#[test]
fn trap_rejects_non_integer_immediate() {
    let mut m = test_machine();
    exec(&mut m, "teqi", &["$t0", "$t1"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Invalid immediate value")));
}

#[test]
fn firing_trap_does_not_halt_the_program() {
    let run = run_program(
        r#"
.data
.text
li $t0, 7
teqi $t0, 7
li $a0, 1
li $v0, 1
syscall
li $v0, 10
syscall
"#,
    );
    assert_eq!(run.output, "1\n");
    assert!(run
        .errors
        .iter()
        .any(|e| e.contains("Trap exception")));
    assert_eq!(run.exit_code, 0);
}
