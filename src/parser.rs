use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::diagnostics::DiagnosticService;
use crate::instruction::{Instruction, Operand};
use crate::variable::{DataType, Variable};

static REGISTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([tsvak]\d+|zero|ra|sp|fp|gp|hi|lo|f\d+|cp0_\d+)$").unwrap()
});
static CP0_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^cp0_\d+$").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());
static STRING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^".*"$"#).unwrap());

/// Fatal problems with the source file itself. Anything past this point is
/// accumulated in the [`DiagnosticService`] instead.
#[derive(thiserror::Error, Debug)]
pub enum ProgramStructureError {
    #[error("File must have .asm extension.")]
    WrongExtension,
    #[error("File is empty or unreadable.")]
    EmptyFile,
    #[error("Failed to read source file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Data,
    Text,
}

/// Turns source lines into an instruction stream plus an ordered variable
/// table, accumulating diagnostics as it goes. Duplicate symbols and invalid
/// registers are diagnostics, not aborts, so later errors still surface.
#[derive(Debug, Default)]
pub struct Parser {
    pub diagnostics: DiagnosticService,
    variables: Vec<Variable>,
    defined_labels: HashSet<String>,
    used_labels: HashSet<String>,
    defined_variables: HashSet<String>,
    used_variables: HashSet<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables in declaration order; layout depends on this ordering.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn used_variables(&self) -> &HashSet<String> {
        &self.used_variables
    }

    pub fn into_parts(self) -> (Vec<Variable>, DiagnosticService) {
        (self.variables, self.diagnostics)
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<Vec<Instruction>, ProgramStructureError> {
        if path.extension().and_then(|e| e.to_str()) != Some("asm") {
            return Err(ProgramStructureError::WrongExtension);
        }

        let source = std::fs::read_to_string(path)?;
        if source.trim().is_empty() {
            return Err(ProgramStructureError::EmptyFile);
        }

        let lines: Vec<&str> = source.lines().collect();
        Ok(self.parse(&lines))
    }

    pub fn parse(&mut self, lines: &[&str]) -> Vec<Instruction> {
        let mut instructions = Vec::new();

        if !self.validate_sections(lines) {
            return instructions;
        }

        self.process_lines(lines, &mut instructions);
        self.validate_labels();

        instructions
    }

    /// Exactly one `.data` and one `.text`, both present. Duplicates or a
    /// missing section abort before any output is produced.
    fn validate_sections(&mut self, lines: &[&str]) -> bool {
        let mut has_data = false;
        let mut has_text = false;

        for line in lines {
            match line.trim() {
                ".data" => {
                    if has_data {
                        self.diagnostics.add_error("Duplicate .data section found.");
                        return false;
                    }
                    has_data = true;
                }
                ".text" => {
                    if has_text {
                        self.diagnostics.add_error("Duplicate .text section found.");
                        return false;
                    }
                    has_text = true;
                }
                _ => {}
            }
        }

        if !(has_data && has_text) {
            self.diagnostics
                .add_error("Program must contain both .data and .text sections.");
            return false;
        }

        true
    }

    fn process_lines(&mut self, lines: &[&str], instructions: &mut Vec<Instruction>) {
        let mut section = None;

        for raw in lines {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = strip_inline_comment(line);
            match line.as_str() {
                "" => continue,
                ".data" => {
                    section = Some(Section::Data);
                    continue;
                }
                ".text" => {
                    section = Some(Section::Text);
                    continue;
                }
                _ => {}
            }

            match section {
                Some(Section::Text) => self.process_instruction(&line, instructions),
                _ => self.process_data_declaration(&line),
            }
        }
    }

    /// `.data` line: `name[:] type value...`
    fn process_data_declaration(&mut self, line: &str) {
        let mut parts = line.splitn(3, char::is_whitespace);
        let (Some(raw_name), Some(ty_keyword)) = (parts.next(), parts.next()) else {
            return;
        };
        let name = raw_name.strip_suffix(':').unwrap_or(raw_name);
        let value = parts.next().map(str::trim).unwrap_or("");

        let Some(ty) = DataType::from_directive(ty_keyword) else {
            self.diagnostics.add_error(format!(
                "Invalid data type: {ty_keyword} for variable: {name}"
            ));
            return;
        };

        if self.defined_variables.contains(name) {
            self.diagnostics
                .add_error(format!("Duplicate variable declaration: {name}"));
            return;
        }

        if !self.validate_data_value(ty, value) {
            return;
        }

        self.variables.push(Variable::new(name, ty, value));
        self.defined_variables.insert(name.to_string());
        debug!(name, directive = ty.directive(), "declared variable");
    }

    fn validate_data_value(&mut self, ty: DataType, value: &str) -> bool {
        let ok = match ty {
            DataType::Word => {
                WORD_RE.is_match(value) && parse_signed::<i32>(value).is_some()
            }
            DataType::Byte => WORD_RE.is_match(value) && parse_signed::<i8>(value).is_some(),
            DataType::Half => WORD_RE.is_match(value) && parse_signed::<i16>(value).is_some(),
            DataType::Float | DataType::Double => FLOAT_RE.is_match(value),
            DataType::Ascii | DataType::Asciiz => STRING_RE.is_match(value),
            // Same i32 range the layout pass parses with.
            DataType::Space => matches!(parse_signed::<i32>(value), Some(v) if v >= 0),
        };
        if !ok {
            self.diagnostics
                .add_error(format!("Invalid value for {}: {value}", ty.directive()));
        }
        ok
    }

    fn process_instruction(&mut self, line: &str, instructions: &mut Vec<Instruction>) {
        let mut rest = line;

        if let Some((label_part, tail)) = line.split_once(':') {
            let label = label_part.trim();
            if !label.is_empty() {
                if !self.defined_labels.insert(label.to_string()) {
                    self.diagnostics
                        .add_error(format!("Duplicate label defined: {label}"));
                }
                // The marker keeps its slot so labels resolve to indices.
                instructions.push(Instruction::new(format!("{label}:"), Vec::new()));
            }
            rest = tail.trim();
            if rest.is_empty() {
                return;
            }
        }

        let tokens = tokenize_instruction(rest);
        let Some((mnemonic, operand_tokens)) = tokens.split_first() else {
            return;
        };

        let mut operands = Vec::with_capacity(operand_tokens.len());
        for token in operand_tokens {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            self.track_operand_usage(token);
            operands.push(Operand::new(token));
        }

        instructions.push(Instruction::new(mnemonic.clone(), operands));
    }

    /// Classifies a token as register, memory offset, immediate or a plain
    /// label/variable reference, feeding the used-symbol sets.
    fn track_operand_usage(&mut self, operand: &str) {
        if let (Some(open), Some(close)) = (operand.find('('), operand.find(')')) {
            if open < close {
                let register = &operand[open + 1..close];
                if register.starts_with('$') {
                    self.validate_register(register);
                }

                if open > 0 {
                    let offset = &operand[..open];
                    if offset.parse::<i32>().is_err() {
                        self.record_symbol_use(offset);
                    }
                }
                return;
            }
        }

        if operand.starts_with('$') {
            self.validate_register(operand);
        } else if CP0_RE.is_match(operand) {
            // CP0 registers use the bare cp0_N spelling.
        } else if operand.parse::<i32>().is_err() {
            self.record_symbol_use(operand);
        }
    }

    fn record_symbol_use(&mut self, symbol: &str) {
        if self.defined_variables.contains(symbol) {
            self.used_variables.insert(symbol.to_string());
        } else {
            self.used_labels.insert(symbol.to_string());
        }
    }

    fn validate_register(&mut self, register: &str) {
        if !REGISTER_RE.is_match(register) {
            self.diagnostics
                .add_error(format!("Invalid register: {register}"));
        }
    }

    fn validate_labels(&mut self) {
        let mut undefined: Vec<&String> = self
            .used_labels
            .iter()
            .filter(|label| !self.defined_labels.contains(*label))
            .collect();
        undefined.sort();
        for label in undefined {
            self.diagnostics.add_error(format!("Undefined label: {label}"));
        }
    }
}

/// Strips a trailing `#` comment, ignoring `#` inside double-quoted strings.
fn strip_inline_comment(line: &str) -> String {
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return line[..i].trim().to_string(),
            _ => {}
        }
    }

    line.to_string()
}

/// Splits a `.text` line into mnemonic + operand tokens. Commas and
/// whitespace delimit, except inside parentheses, so `lw $t0, 4($sp)`
/// yields `["lw", "$t0", "4($sp)"]`.
fn tokenize_instruction(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_parens = false;

    for c in line.chars() {
        match c {
            '(' => {
                in_parens = true;
                current.push(c);
            }
            ')' => {
                in_parens = false;
                current.push(c);
            }
            ',' if !in_parens => flush(&mut current, &mut parts),
            c if c.is_whitespace() && !in_parens => flush(&mut current, &mut parts),
            _ => current.push(c),
        }
    }
    flush(&mut current, &mut parts);

    parts
}

fn flush(current: &mut String, parts: &mut Vec<String>) {
    if !current.is_empty() {
        parts.push(current.trim().to_string());
        current.clear();
    }
}

/// Range-checked signed literal parse, shared by `.word`/`.half`/`.byte`.
pub fn parse_signed<T: num_traits::PrimInt>(value: &str) -> Option<T> {
    T::from_str_radix(value, 10).ok()
}
