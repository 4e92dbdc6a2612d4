//! Type conversion: native C type spellings → C# type spellings.
//!
//! The converter resolves a bare type name against the frozen
//! [`TypeRegistry`] first and the API family's [`AliasTable`] second. Names it
//! cannot resolve come back with the [`UNKNOWN_MARKER`] prefix and are
//! collected so the caller can report them and drop the declarations that use
//! them.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::model::{
    ConvertedSignature, ConvertedStruct, ConvertedType, Signature, StructDef, UNKNOWN_MARKER,
};
use crate::registry::TypeRegistry;
use crate::types::AliasTable;

// ---------------------------------------------------------------------------
// Constant width selection
// ---------------------------------------------------------------------------

/// Integer type chosen for a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    Int,
    UInt,
    Long,
    ULong,
}

impl IntKind {
    /// Smallest kind that holds `value`. Negative values are always `int`.
    pub fn for_value(value: i128) -> IntKind {
        if value > 0x7FFF_FFFF_FFFF_FFFF {
            IntKind::ULong
        } else if value > 0xFFFF_FFFF {
            IntKind::Long
        } else if value > 0x7FFF_FFFF {
            IntKind::UInt
        } else {
            IntKind::Int
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            IntKind::Int => "int",
            IntKind::UInt => "uint",
            IntKind::Long => "long",
            IntKind::ULong => "ulong",
        }
    }
}

// ---------------------------------------------------------------------------
// Identifier sanitizing
// ---------------------------------------------------------------------------

const RESERVED_NAMES: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Prefix that lets a C# keyword be used as an identifier.
pub const ESCAPE_PREFIX: char = '@';

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Trim `name` and escape it if it collides with a C# keyword.
pub fn sanitize_name(name: &str) -> String {
    let name = name.trim();
    if is_reserved(name) {
        format!("{ESCAPE_PREFIX}{name}")
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// Function pointer spelling
// ---------------------------------------------------------------------------

/// `delegate* unmanaged[Cdecl]<int, byte*, void>`: parameters first, return
/// type last.
pub fn fn_pointer_type<'s>(
    calling_convention: Option<&str>,
    params: impl IntoIterator<Item = &'s str>,
    return_type: &str,
) -> String {
    let mut out = String::from("delegate* unmanaged");
    if let Some(cc) = calling_convention {
        out.push('[');
        out.push_str(cc);
        out.push(']');
    }
    out.push('<');
    for p in params {
        out.push_str(p);
        out.push_str(", ");
    }
    out.push_str(return_type);
    out.push('>');
    out
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Per-call conversion switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// `T name[N]` becomes `T*` instead of staying an inline array.
    pub decay_fixed_arrays: bool,
    /// Callback typedef names become full function pointer types.
    pub inline_callbacks: bool,
}

impl ConvertOptions {
    /// Options for function parameters and return types: arrays always decay.
    pub fn params() -> Self {
        Self {
            decay_fixed_arrays: true,
            inline_callbacks: false,
        }
    }

    pub fn inline_callbacks(mut self, inline: bool) -> Self {
        self.inline_callbacks = inline;
        self
    }
}

static ARRAY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*(\d*)\s*\]\s*$").expect("array suffix regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArraySuffix {
    Unsized,
    Sized(usize),
}

/// Strip every trailing `[..]` from `text`. Returns the remaining text and the
/// outermost (last written) suffix.
fn strip_array_suffix(text: &str) -> (&str, Option<ArraySuffix>) {
    let mut rest = text.trim_end();
    let mut found = None;
    while let Some(caps) = ARRAY_SUFFIX.captures(rest) {
        let Some(whole) = caps.get(0) else { break };
        if found.is_none() {
            found = Some(match caps[1].parse::<usize>() {
                Ok(n) => ArraySuffix::Sized(n),
                Err(_) => ArraySuffix::Unsized,
            });
        }
        rest = rest[..whole.start()].trim_end();
    }
    (rest, found)
}

/// Split `const char * const *` into the bare name `char` and a pointer
/// depth of 2. Qualifiers are dropped wherever they appear.
fn split_pointer_depth(native: &str) -> (String, usize) {
    let spaced = native.replace('*', " * ");
    let mut depth = 0;
    let mut words = Vec::new();
    for token in spaced.split_whitespace() {
        match token {
            "*" => depth += 1,
            "const" | "volatile" => {}
            word => words.push(word),
        }
    }
    (words.join(" "), depth)
}

/// Converts native types for one generation run.
///
/// Holds the frozen registry and alias table by reference and owns the list
/// of unknown types it has seen.
#[derive(Debug)]
pub struct TypeConverter<'a> {
    registry: &'a TypeRegistry,
    aliases: &'a AliasTable,
    calling_convention: Option<String>,
    unknown: Vec<String>,
    /// Registered structs and callbacks whose own declaration was dropped.
    withdrawn: HashSet<String>,
}

impl<'a> TypeConverter<'a> {
    pub fn new(registry: &'a TypeRegistry, aliases: &'a AliasTable) -> Self {
        Self {
            registry,
            aliases,
            calling_convention: None,
            unknown: Vec::new(),
            withdrawn: HashSet::new(),
        }
    }

    /// Calling convention used when callbacks are inlined as function
    /// pointers (`Cdecl`, `Stdcall`).
    pub fn with_calling_convention(mut self, cc: Option<String>) -> Self {
        self.calling_convention = cc;
        self
    }

    /// Stop resolving a registered struct or callback. Later conversions
    /// render it with the unknown marker without reporting it as unmapped.
    /// Returns `false` if `name` was already withdrawn.
    pub fn withdraw(&mut self, name: &str) -> bool {
        if !self.withdrawn.insert(name.to_string()) {
            return false;
        }
        debug!(name, "withdrawn from registry");
        true
    }

    pub fn is_withdrawn(&self, name: &str) -> bool {
        self.withdrawn.contains(name)
    }

    /// Convert one native type, optionally together with the field or
    /// parameter name that carries array and pointer decorations.
    pub fn convert(
        &mut self,
        native: &str,
        name: Option<&str>,
        options: ConvertOptions,
    ) -> ConvertedType {
        let mut fixed_array_len = None;
        let mut extra_depth = 0;

        let (native, type_suffix) = strip_array_suffix(native.trim());
        let (base, mut depth) = split_pointer_depth(native);
        let mut apply_suffix = |suffix: ArraySuffix, depth: &mut usize| match suffix {
            ArraySuffix::Unsized => *depth += 1,
            ArraySuffix::Sized(n) => {
                fixed_array_len = Some(n);
                if options.decay_fixed_arrays {
                    *depth += 1;
                }
            }
        };
        if let Some(suffix) = type_suffix {
            apply_suffix(suffix, &mut extra_depth);
        }

        let name = name.map(|raw| {
            let mut raw = raw.trim();
            while let Some(rest) = raw.strip_prefix('*') {
                extra_depth += 1;
                raw = rest.trim_start();
            }
            let (bare, suffix) = strip_array_suffix(raw);
            if let Some(suffix) = suffix {
                apply_suffix(suffix, &mut extra_depth);
            }
            sanitize_name(bare)
        });
        depth += extra_depth;

        let registry = self.registry;
        let rendered = if registry.is_opaque_struct(&base) {
            // Opaque handles are always passed around as a single pointer.
            depth = 0;
            "nint".to_string()
        } else if self.withdrawn.contains(&base) {
            format!("{UNKNOWN_MARKER}{base}")
        } else if registry.is_data_struct(&base) {
            base.clone()
        } else if let Some(callback) = registry.callback(&base) {
            if options.inline_callbacks {
                self.inline_callback(callback)
            } else {
                base.clone()
            }
        } else if let Some(primitive) = self.aliases.get(&base) {
            primitive.keyword().to_string()
        } else {
            self.record_unknown(&base);
            format!("{UNKNOWN_MARKER}{base}")
        };

        let converted = ConvertedType {
            rendered: format!("{rendered}{}", "*".repeat(depth)),
            name,
            fixed_array_len,
        };
        trace!(native, rendered = %converted.rendered, "converted type");
        converted
    }

    /// Build a function pointer type from a callback signature. Callbacks
    /// referenced by the callback's own parameters stay named.
    fn inline_callback(&mut self, callback: &Signature) -> String {
        let options = ConvertOptions::params();
        let params: Vec<ConvertedType> = callback
            .params
            .iter()
            .map(|p| self.convert(&p.native_type, p.name.as_deref(), options))
            .collect();
        let ret = self.convert(&callback.return_type, None, options);
        fn_pointer_type(
            self.calling_convention.as_deref(),
            params.iter().map(|p| p.rendered.as_str()),
            &ret.rendered,
        )
    }

    fn record_unknown(&mut self, native: &str) {
        if self.unknown.iter().any(|u| u == native) {
            return;
        }
        warn!(ty = native, "unknown type");
        self.unknown.push(native.to_string());
    }

    /// Convert a function, command or callback signature. Parameter arrays
    /// decay to pointers.
    pub fn convert_signature(
        &mut self,
        signature: &Signature,
        inline_callbacks: bool,
    ) -> ConvertedSignature {
        let options = ConvertOptions::params().inline_callbacks(inline_callbacks);
        let return_type = self.convert(&signature.return_type, None, options);
        let params = signature
            .params
            .iter()
            .map(|p| self.convert(&p.native_type, p.name.as_deref(), options))
            .collect();
        ConvertedSignature {
            name: signature.name.clone(),
            return_type,
            params,
        }
    }

    /// Convert every field of a struct. The struct is named by its typedef
    /// alias.
    pub fn convert_struct(&mut self, s: &StructDef, options: ConvertOptions) -> ConvertedStruct {
        let fields = s
            .fields
            .iter()
            .map(|f| self.convert(&f.native_type, f.name.as_deref(), options))
            .collect();
        ConvertedStruct {
            name: s.typedef_alias.clone(),
            fields,
        }
    }

    /// Distinct unknown type names, in the order they were first seen.
    pub fn unknown_types(&self) -> &[String] {
        &self.unknown
    }

    pub fn into_unknown_types(self) -> Vec<String> {
        self.unknown
    }
}
