use serde::{Deserialize, Serialize};

/// The eight `.data` directive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Word,
    Byte,
    Half,
    Float,
    Double,
    Ascii,
    Asciiz,
    Space,
}

impl DataType {
    pub fn from_directive(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            ".word" => Some(Self::Word),
            ".byte" => Some(Self::Byte),
            ".half" => Some(Self::Half),
            ".float" => Some(Self::Float),
            ".double" => Some(Self::Double),
            ".ascii" => Some(Self::Ascii),
            ".asciiz" => Some(Self::Asciiz),
            ".space" => Some(Self::Space),
            _ => None,
        }
    }

    pub fn directive(self) -> &'static str {
        match self {
            Self::Word => ".word",
            Self::Byte => ".byte",
            Self::Half => ".half",
            Self::Float => ".float",
            Self::Double => ".double",
            Self::Ascii => ".ascii",
            Self::Asciiz => ".asciiz",
            Self::Space => ".space",
        }
    }
}

/// One `.data` declaration. Immutable once created; consumed exactly once at
/// program start to compute the byte layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: DataType,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: DataType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            value: value.into(),
        }
    }

    pub fn is(&self, ty: DataType) -> bool {
        self.ty == ty
    }
}
