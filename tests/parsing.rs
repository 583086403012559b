use mips_rs::{DataType, Parser, ProgramStructureError};
use pretty_assertions::assert_eq;

fn parse(lines: &[&str]) -> Parser {
    let mut parser = Parser::new();
    parser.parse(lines);
    parser
}

#[test]
fn requires_both_sections() {
    let parser = parse(&[".data", "x: .word 1"]);
    assert!(parser.diagnostics.has_errors());
    assert!(parser.diagnostics.errors()[0].contains("both .data and .text"));
}

#[test]
fn duplicate_data_section_is_fatal() {
    let mut parser = Parser::new();
    let instructions = parser.parse(&[".data", ".data", ".text", "nop"]);
    assert!(instructions.is_empty());
    assert!(parser.diagnostics.errors()[0].contains("Duplicate .data"));
}

#[test]
fn variables_keep_declaration_order() {
    let parser = parse(&[
        ".data",
        "first: .word 42",
        "second: .byte 7",
        "msg: .asciiz \"hi\"",
        ".text",
        "nop",
    ]);
    assert!(!parser.diagnostics.has_errors());
    let names: Vec<&str> = parser.variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "msg"]);
    assert_eq!(parser.variables()[2].ty, DataType::Asciiz);
}

#[test]
fn rejects_invalid_data_values() {
    let parser = parse(&[
        ".data",
        "a: .word 1.5",
        "b: .byte 300",
        "c: .half abc",
        ".text",
        "nop",
    ]);
    assert_eq!(parser.diagnostics.errors().len(), 3);
    assert_eq!(parser.variables().len(), 0);
}

#[test]
fn space_size_must_fit_the_layout_range() {
    let parser = parse(&[".data", "pad: .space 3000000000", ".text", "nop"]);
    assert!(parser
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Invalid value for .space: 3000000000")));
    assert_eq!(parser.variables().len(), 0);

    let parser = parse(&[".data", "pad: .space -4", ".text", "nop"]);
    assert!(parser.diagnostics.has_errors());
    assert_eq!(parser.variables().len(), 0);
}

#[test]
fn tracks_which_variables_are_referenced() {
    let parser = parse(&[
        ".data",
        "msg: .asciiz \"hi\"",
        "pad: .space 4",
        ".text",
        "la $a0, msg",
        "done: nop",
    ]);
    assert!(!parser.diagnostics.has_errors());
    assert!(parser.used_variables().contains("msg"));
    assert!(!parser.used_variables().contains("pad"));
}

#[test]
fn duplicate_variable_is_reported_but_parsing_continues() {
    let parser = parse(&[
        ".data",
        "x: .word 1",
        "x: .word 2",
        "y: .word 3",
        ".text",
        "nop",
    ]);
    assert!(parser
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Duplicate variable declaration: x")));
    assert_eq!(parser.variables().len(), 2);
}

#[test]
fn label_markers_occupy_stream_slots() {
    let mut parser = Parser::new();
    let instructions = parser.parse(&[
        ".data",
        "x: .word 1",
        ".text",
        "start:",
        "nop",
        "done: nop",
    ]);
    assert!(!parser.diagnostics.has_errors());
    let mnemonics: Vec<&str> = instructions.iter().map(|i| i.mnemonic.as_str()).collect();
    assert_eq!(mnemonics, vec!["start:", "nop", "done:", "nop"]);
    assert!(instructions[0].is_label());
    assert_eq!(instructions[2].label(), Some("done"));
}

#[test]
fn duplicate_label_is_a_diagnostic() {
    let parser = parse(&[".data", "x: .word 1", ".text", "a: nop", "a: nop"]);
    assert!(parser
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Duplicate label defined: a")));
}

#[test]
fn undefined_label_is_reported_after_scan() {
    let parser = parse(&[".data", "x: .word 1", ".text", "j missing"]);
    assert!(parser
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Undefined label: missing")));
}

#[test]
fn memory_operand_keeps_parenthesized_form() {
    let mut parser = Parser::new();
    let instructions = parser.parse(&[".data", "x: .word 1", ".text", "lw $t0, 4($sp)"]);
    let lw = instructions.iter().find(|i| i.mnemonic == "lw").unwrap();
    assert_eq!(lw.operands.len(), 2);
    assert_eq!(lw.operands[1].value(), "4($sp)");
}

#[test]
fn strips_comments_outside_strings() {
    let mut parser = Parser::new();
    let instructions = parser.parse(&[
        ".data",
        "msg: .asciiz \"a # not a comment\" # real comment",
        ".text",
        "nop # trailing",
        "# whole line",
    ]);
    assert!(!parser.diagnostics.has_errors());
    assert_eq!(parser.variables()[0].value, "\"a # not a comment\"");
    assert_eq!(instructions.len(), 1);
    assert!(instructions[0].operands.is_empty());
}

#[test]
fn invalid_register_token_is_reported() {
    let parser = parse(&[".data", "x: .word 1", ".text", "move $t0, $bogus"]);
    assert!(parser
        .diagnostics
        .errors()
        .iter()
        .any(|e| e.contains("Invalid register: $bogus")));
}

#[test]
fn cp0_register_spelling_is_accepted() {
    let parser = parse(&[".data", "x: .word 1", ".text", "move $t0, $t1", "nop"]);
    assert!(!parser.diagnostics.has_errors());
    let parser = parse(&[".data", "x: .word 1", ".text", "teqi $t0, 4"]);
    assert!(!parser.diagnostics.has_errors());
}

#[test]
fn parse_file_rejects_wrong_extension() {
    let dir = std::env::temp_dir();
    let path = dir.join("program.txt");
    std::fs::write(&path, ".data\nx: .word 1\n.text\nnop\n").unwrap();
    let mut parser = Parser::new();
    let err = parser.parse_file(&path).unwrap_err();
    assert!(matches!(err, ProgramStructureError::WrongExtension));
}

#[test]
fn parse_file_rejects_empty_source() {
    let dir = std::env::temp_dir();
    let path = dir.join("empty_program.asm");
    std::fs::write(&path, "   \n\n").unwrap();
    let mut parser = Parser::new();
    let err = parser.parse_file(&path).unwrap_err();
    assert!(matches!(err, ProgramStructureError::EmptyFile));
}
