//! Intermediate model types: the bridge between extraction, type conversion
//! and C# emission.
//!
//! Raw records (`RawDeclaration`, `StructDef`, `Signature`, `ConstantDef`,
//! `Feature`) carry native C spellings exactly as scraped. Converted records
//! (`ConvertedType`, `ConvertedStruct`, `ConvertedSignature`) carry target
//! spellings and can be rendered without further lookups.

use crate::convert::IntKind;

/// A `(type, name)` pair as scraped from a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    pub native_type: String,
    /// Absent for return types.
    pub name: Option<String>,
}

impl RawDeclaration {
    pub fn new(native_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            native_type: native_type.into(),
            name: Some(name.into()),
        }
    }
}

/// A C struct with its full field layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    /// The struct tag (`typedef struct <name> { ... }`).
    pub name: String,
    /// The typedef name the rest of the header uses. Equal to `name` for
    /// plain `struct Name { ... };` definitions.
    pub typedef_alias: String,
    /// Fields in declaration order.
    pub fields: Vec<RawDeclaration>,
}

/// A function prototype, XML command or callback typedef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub return_type: String,
    /// Parameters in declaration order. Every entry has a name.
    pub params: Vec<RawDeclaration>,
}

/// A `#define` or registry `<enum>` constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDef {
    pub name: String,
    pub value: ConstantValue,
}

/// Value of a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Integer(i128),
    Float(f64),
    /// Anything that is not a plain number (`(A | B)`, `OTHER_CONSTANT`).
    /// Carried through verbatim, never evaluated.
    Expression(String),
}

/// Target type used for constants whose value is not a plain integer.
pub const FALLBACK_CONSTANT_KIND: IntKind = IntKind::UInt;

impl ConstantValue {
    /// Target type keyword for this value.
    pub fn type_keyword(&self) -> &'static str {
        match self {
            ConstantValue::Integer(v) => IntKind::for_value(*v).keyword(),
            ConstantValue::Float(_) => "double",
            ConstantValue::Expression(_) => FALLBACK_CONSTANT_KIND.keyword(),
        }
    }

    /// Literal text for the right-hand side of the constant declaration.
    /// Non-negative integers are written in hex with upper-case digits
    /// (`0x30001`). Negative ones stay decimal (`-1`); `-0x80000000` is not
    /// a valid `int` literal in C#.
    pub fn literal(&self) -> String {
        match self {
            ConstantValue::Integer(v) if *v < 0 => v.to_string(),
            ConstantValue::Integer(v) => format!("{v:#X}"),
            ConstantValue::Float(v) => format!("{v:?}"),
            ConstantValue::Expression(e) => e.clone(),
        }
    }
}

/// A registry feature or extension: a named bundle of constants and commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    /// `api` attribute for features, `supported` attribute for extensions
    /// (`gl|glcore|gles2`).
    pub api: Option<String>,
    pub is_extension: bool,
    pub enums: Vec<String>,
    pub commands: Vec<String>,
}

/// Result of converting one native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedType {
    /// Target type spelling including pointer suffixes.
    pub rendered: String,
    /// Sanitized identifier, when a name was supplied.
    pub name: Option<String>,
    /// Length of a fixed-size array field (`name[N]`). Reported even when the
    /// array was decayed to a pointer.
    pub fixed_array_len: Option<usize>,
}

/// Marker prefix for types the converter could not map.
pub const UNKNOWN_MARKER: &str = "__UNKNOWN_";

impl ConvertedType {
    pub fn is_unknown(&self) -> bool {
        self.rendered.contains(UNKNOWN_MARKER)
    }
}

/// A struct whose fields went through the converter.
#[derive(Debug, Clone)]
pub struct ConvertedStruct {
    pub name: String,
    pub fields: Vec<ConvertedType>,
}

impl ConvertedStruct {
    pub fn has_unknown(&self) -> bool {
        self.fields.iter().any(ConvertedType::is_unknown)
    }
}

/// A function or callback signature whose types went through the converter.
#[derive(Debug, Clone)]
pub struct ConvertedSignature {
    pub name: String,
    pub return_type: ConvertedType,
    pub params: Vec<ConvertedType>,
}

impl ConvertedSignature {
    pub fn has_unknown(&self) -> bool {
        self.return_type.is_unknown() || self.params.iter().any(ConvertedType::is_unknown)
    }
}

/// One static class in the output: a header file or a registry feature.
#[derive(Debug, Default)]
pub struct ClassBindings {
    pub name: String,
    pub constants: Vec<ConstantDef>,
    pub functions: Vec<ConvertedSignature>,
}

/// Everything that goes into one output file.
#[derive(Debug, Default)]
pub struct Module {
    pub namespace: String,
    /// Comment lines written before anything else (license text).
    pub header_comment: Vec<String>,
    pub structs: Vec<ConvertedStruct>,
    pub callbacks: Vec<ConvertedSignature>,
    pub classes: Vec<ClassBindings>,
}
