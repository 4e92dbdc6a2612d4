//! Native scalar aliases → target primitives.
//!
//! Each API family spells its scalars differently (`GLuint`, `ALCsizei`,
//! `uint32_t`). The tables here are data: a preset is picked by name from the
//! config and then extended or overridden by `[types.aliases]`.

use std::collections::HashMap;

use serde::Deserialize;

/// A C# primitive the converter can map a native scalar to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Void,
    /// One-byte native boolean. Written as `byte`: a C# `bool` in an
    /// unmanaged signature is marshaled as a 4-byte Win32 `BOOL`.
    Bool,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    /// Pointer-sized signed integer.
    NInt,
    /// Pointer-sized unsigned integer.
    NUInt,
    Float,
    Double,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "byte",
            Primitive::SByte => "sbyte",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::UShort => "ushort",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Long => "long",
            Primitive::ULong => "ulong",
            Primitive::NInt => "nint",
            Primitive::NUInt => "nuint",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

/// Built-in alias table presets, selectable with `[types] preset = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Standard C scalars and `<stdint.h>` only.
    #[default]
    C,
    Glfw,
    OpenAl,
    OpenGl,
}

use Primitive::*;

const C_SCALARS: &[(&str, Primitive)] = &[
    ("void", Void),
    ("char", Byte),
    ("signed char", SByte),
    ("unsigned char", Byte),
    ("short", Short),
    ("unsigned short", UShort),
    ("int", Int),
    ("unsigned int", UInt),
    ("long", NInt),
    ("unsigned long", NUInt),
    ("long long", Long),
    ("unsigned long long", ULong),
    ("float", Float),
    ("double", Double),
    ("size_t", NUInt),
    ("int8_t", SByte),
    ("int16_t", Short),
    ("int32_t", Int),
    ("int64_t", Long),
    ("uint8_t", Byte),
    ("uint16_t", UShort),
    ("uint32_t", UInt),
    ("uint64_t", ULong),
    ("intptr_t", NInt),
    ("uintptr_t", NUInt),
];

const GLFW_SCALARS: &[(&str, Primitive)] = &[
    ("int", Int),
    ("uint32_t", UInt),
    ("uint64_t", ULong),
    ("void", Void),
    ("char", Byte),
    ("unsigned char", Byte),
    ("float", Float),
    ("double", Double),
    ("unsigned short", UShort),
    ("unsigned int", UInt),
    ("size_t", NUInt),
];

const OPENAL_SCALARS: &[(&str, Primitive)] = &[
    ("void", Void),
    ("ALboolean", Bool),
    ("ALchar", Byte),
    ("ALbyte", SByte),
    ("ALubyte", Byte),
    ("ALshort", Short),
    ("ALushort", UShort),
    ("ALint", Int),
    ("ALuint", UInt),
    ("ALsizei", Int),
    ("ALenum", Int),
    ("ALfloat", Float),
    ("ALdouble", Double),
    ("ALvoid", Void),
    ("ALCboolean", Bool),
    ("ALCchar", Byte),
    ("ALCbyte", SByte),
    ("ALCubyte", Byte),
    ("ALCshort", Short),
    ("ALCushort", UShort),
    ("ALCint", Int),
    ("ALCuint", UInt),
    ("ALCsizei", Int),
    ("ALCenum", Int),
    ("ALCfloat", Float),
    ("ALCdouble", Double),
    ("ALCvoid", Void),
];

const OPENGL_SCALARS: &[(&str, Primitive)] = &[
    ("void", Void),
    ("GLenum", UInt),
    ("GLboolean", Bool),
    ("GLbitfield", UInt),
    ("GLvoid", Void),
    ("GLbyte", SByte),
    ("GLubyte", Byte),
    ("GLshort", Short),
    ("GLushort", UShort),
    ("GLint", Int),
    ("GLuint", UInt),
    ("GLclampx", Int),
    ("GLsizei", Int),
    ("GLfloat", Float),
    ("GLclampf", Float),
    ("GLdouble", Double),
    ("GLclampd", Double),
    ("GLchar", Byte),
    ("GLcharARB", Byte),
    ("GLhalf", UShort),
    ("GLhalfARB", UShort),
    ("GLfixed", Int),
    ("GLintptr", NInt),
    ("GLintptrARB", NInt),
    // GLsizeiptr is signed.
    ("GLsizeiptr", NInt),
    ("GLsizeiptrARB", NInt),
    ("GLint64", Long),
    ("GLint64EXT", Long),
    ("GLuint64", ULong),
    ("GLuint64EXT", ULong),
    ("GLhalfNV", UShort),
    ("GLsync", NInt),
    ("GLvdpauSurfaceNV", NInt),
];

impl Preset {
    fn entries(self) -> &'static [(&'static str, Primitive)] {
        match self {
            Preset::C => C_SCALARS,
            Preset::Glfw => GLFW_SCALARS,
            Preset::OpenAl => OPENAL_SCALARS,
            Preset::OpenGl => OPENGL_SCALARS,
        }
    }
}

/// Lookup table from a bare native type name to a target primitive.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, Primitive>,
}

impl AliasTable {
    pub fn preset(preset: Preset) -> Self {
        let entries = preset
            .entries()
            .iter()
            .map(|(name, prim)| (name.to_string(), *prim))
            .collect();
        Self { entries }
    }

    /// Builds the table for a config: the preset first, then overrides.
    pub fn with_overrides(preset: Preset, overrides: &HashMap<String, Primitive>) -> Self {
        let mut table = Self::preset(preset);
        for (name, prim) in overrides {
            table.insert(name, *prim);
        }
        table
    }

    pub fn insert(&mut self, name: &str, primitive: Primitive) {
        self.entries.insert(name.to_string(), primitive);
    }

    pub fn get(&self, name: &str) -> Option<Primitive> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
