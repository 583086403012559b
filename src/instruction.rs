use serde::{Deserialize, Serialize};

/// A single raw operand token, e.g. `$t0`, `123`, `msg` or `4($sp)`.
/// Carries no parsed type; handlers re-interpret it on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand(String);

impl Operand {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

/// One slot of the instruction stream: a mnemonic plus its operand list.
///
/// A mnemonic ending in `:` is a label marker. It occupies a slot so the
/// pre-pass can resolve labels to indices, but executing it is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(mnemonic: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            operands,
        }
    }

    pub fn is_label(&self) -> bool {
        self.mnemonic.ends_with(':')
    }

    /// Label name without the trailing colon, or `None` for real instructions.
    pub fn label(&self) -> Option<&str> {
        self.mnemonic.strip_suffix(':')
    }
}
