mod common;

use common::{exec, test_machine};
use pretty_assertions::assert_eq;

#[test]
fn add_sums_registers() {
    let mut m = test_machine();
    m.set_register_value("$t1", 2);
    m.set_register_value("$t2", 40);
    exec(&mut m, "add", &["$t0", "$t1", "$t2"]);
    assert_eq!(m.register_value("$t0"), 42);
    assert!(!m.diagnostics.has_errors());
}

#[test]
fn add_overflow_is_rejected_and_destination_untouched() {
    let mut m = test_machine();
    m.set_register_value("$t1", i32::MAX);
    m.set_register_value("$t2", 1);
    exec(&mut m, "add", &["$t0", "$t1", "$t2"]);
    assert_eq!(m.register_value("$t0"), 0);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("arithmetic overflow")));
}

#[test]
fn addi_checks_overflow_against_immediate() {
    let mut m = test_machine();
    m.set_register_value("$t1", i32::MIN);
    exec(&mut m, "addi", &["$t0", "$t1", "-1"]);
    assert_eq!(m.register_value("$t0"), 0);
    assert!(m.diagnostics.has_errors());
}

#[test]
fn addi_requires_integer_immediate() {
    let mut m = test_machine();
    exec(&mut m, "addi", &["$t0", "$t1", "$t2"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("immediate must be an integer")));
}

#[test]
fn addiu_wraps_silently() {
    let mut m = test_machine();
    m.set_register_value("$a1", i32::MAX);
    // $a0 sits at offset 0 and is the only destination addiu accepts.
    exec(&mut m, "addiu", &["$a0", "$a1", "1"]);
    assert_eq!(m.register_value("$a0"), i32::MIN);
    assert!(!m.diagnostics.has_errors());
}

#[test]
fn addiu_rejects_destination_already_in_use() {
    let mut m = test_machine();
    exec(&mut m, "addiu", &["$t0", "$a1", "1"]);
    assert_eq!(m.register_value("$t0"), 0);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("already in use")));
}

#[test]
fn sub_reports_overflow_in_execute() {
    let mut m = test_machine();
    m.set_register_value("$t1", i32::MIN);
    m.set_register_value("$t2", 1);
    exec(&mut m, "sub", &["$t0", "$t1", "$t2"]);
    assert_eq!(m.register_value("$t0"), 0);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("overflow in subtraction")));
}

#[test]
fn mult_splits_product_across_hi_lo() {
    let mut m = test_machine();
    m.set_register_value("$t0", 0x10000);
    m.set_register_value("$t1", 0x10000);
    exec(&mut m, "mult", &["$t0", "$t1"]);
    assert_eq!(m.register_value("$lo"), 0);
    assert_eq!(m.register_value("$hi"), 1);
}

#[test]
fn mult_negative_product_sign_extends_into_hi() {
    let mut m = test_machine();
    m.set_register_value("$t0", -1);
    m.set_register_value("$t1", 2);
    exec(&mut m, "mult", &["$t0", "$t1"]);
    assert_eq!(m.register_value("$lo"), -2);
    assert_eq!(m.register_value("$hi"), -1);
}

#[test]
fn multu_treats_operands_as_unsigned() {
    let mut m = test_machine();
    m.set_register_value("$t0", -1);
    m.set_register_value("$t1", 2);
    exec(&mut m, "multu", &["$t0", "$t1"]);
    // 0xFFFFFFFF * 2 = 0x1_FFFF_FFFE
    assert_eq!(m.register_value("$lo"), -2);
    assert_eq!(m.register_value("$hi"), 1);
}

#[test]
fn divu_writes_quotient_and_remainder() {
    let mut m = test_machine();
    m.set_register_value("$t0", 17);
    m.set_register_value("$t1", 5);
    exec(&mut m, "divu", &["$t0", "$t1"]);
    assert_eq!(m.register_value("$lo"), 3);
    assert_eq!(m.register_value("$hi"), 2);
}

#[test]
fn divu_by_zero_is_a_diagnostic_and_skips_the_write() {
    let mut m = test_machine();
    m.set_register_value("$t0", 17);
    exec(&mut m, "divu", &["$t0", "$t1"]);
    assert_eq!(m.register_value("$lo"), 0);
    assert_eq!(m.register_value("$hi"), 0);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Division by zero")));
}

#[test]
fn sltu_compares_unsigned() {
    let mut m = test_machine();
    m.set_register_value("$t1", -1);
    m.set_register_value("$t2", 1);
    // 0xFFFFFFFF is large unsigned, so -1 < 1 does not hold.
    exec(&mut m, "sltu", &["$t0", "$t1", "$t2"]);
    assert_eq!(m.register_value("$t0"), 0);
    exec(&mut m, "sltu", &["$t0", "$t2", "$t1"]);
    assert_eq!(m.register_value("$t0"), 1);
}

#[test]
fn sltiu_widens_the_immediate_unsigned() {
    let mut m = test_machine();
    m.set_register_value("$t1", 5);
    exec(&mut m, "sltiu", &["$t0", "$t1", "-1"]);
    assert_eq!(m.register_value("$t0"), 1);
}

#[test]
fn unknown_mnemonic_arity_mismatch_is_reported() {
    let mut m = test_machine();
    exec(&mut m, "add", &["$t0", "$t1"]);
    assert!(m
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("must have exactly 3 operand(s)")));
}
