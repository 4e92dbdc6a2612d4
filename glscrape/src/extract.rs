//! Extraction: C header text → intermediate model types.
//!
//! Headers are read as plain text without preprocessing. Every extractor
//! returns `None` (or nothing) for input that does not have the expected shape;
//! a non-match is the normal case for most lines of a header.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::model::*;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// `#define NAME value`; function-like macros never match because the name
/// must be followed by whitespace.
static DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*define\s+([A-Za-z0-9_]+)\s+(.*)$").expect("define regex")
});

/// Characters a constant value may be spelled with. Strings, casts to
/// pointer types and line continuations fall outside it.
static DEFINE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.|&^~<>+\-*/%() \t]+$").expect("define value regex")
});

static OPAQUE_TYPEDEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*typedef\s+struct\s+([A-Za-z0-9_]+)\s*(\*?)\s*([A-Za-z0-9_]+)\s*;")
        .expect("opaque typedef regex")
});

static CALLBACK_TYPEDEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*typedef\s+([A-Za-z0-9_ *]+?)\s*\(\s*\*\s*([A-Za-z0-9_]+)\s*\)\s*\((.*)\)\s*;",
    )
    .expect("callback typedef regex")
});

static STRUCT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:typedef\s+)?struct\s+([A-Za-z0-9_]+)\s*\{")
        .expect("struct start regex")
});

static CALLBACK_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_ *]+\(\s*\*\s*([A-Za-z0-9_]+)\s*\)\s*\(.*\)$")
        .expect("callback field regex")
});

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex"));

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[^\n]*").expect("line comment regex"));

/// `type name`, `type *name`, `type name[N]`. The type part must end in
/// whitespace or `*` so that a lone `int` is not split into `i` + `nt`.
static DECLARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?[\s*])\s*([A-Za-z_][A-Za-z0-9_]*\s*(?:\[\s*[0-9]*\s*\])*)$")
        .expect("declarator regex")
});

/// Words that can end a C type but are never a parameter name.
const TYPE_WORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "const",
];

/// How a header names its API.
#[derive(Debug, Clone, Default)]
pub struct HeaderApi {
    /// Constants must start with this (`GLFW_`).
    pub constant_prefix: String,
    /// Functions must start with this (`glfw`).
    pub function_prefix: String,
    /// Export macro required in front of prototypes (`GLFWAPI`).
    pub api_macro: Option<String>,
    /// Words deleted from each line before matching (`AL_APIENTRY`).
    pub remove_words: Vec<String>,
}

impl HeaderApi {
    /// Apply `remove_words` to a line.
    pub fn clean_line(&self, line: &str) -> String {
        let mut line = line.trim().to_string();
        for word in &self.remove_words {
            line = line.replace(word.as_str(), "");
        }
        line
    }

    fn function_pattern(&self) -> Regex {
        let api = match &self.api_macro {
            Some(m) => format!(r"{}\s+", regex::escape(m)),
            None => String::new(),
        };
        let pattern = format!(
            r"^\s*{api}([A-Za-z0-9_ *]+?)\s*\b({}[A-Za-z0-9_]*)\s*\((.*)\)\s*;",
            regex::escape(&self.function_prefix)
        );
        Regex::new(&pattern).expect("function pattern is built from escaped input")
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Parse `#define PREFIX_NAME value`.
pub fn parse_constant(line: &str, prefix: &str) -> Option<ConstantDef> {
    let caps = DEFINE.captures(line)?;
    let name = caps[1].trim();
    if !name.starts_with(prefix) {
        return None;
    }
    let raw = strip_trailing_comment(&caps[2]).trim();
    if raw.is_empty() || !DEFINE_VALUE.is_match(raw) || !has_balanced_parens(raw) {
        return None;
    }
    let value = parse_constant_value(raw);
    trace!(name, ?value, "constant");
    Some(ConstantDef {
        name: name.to_string(),
        value,
    })
}

fn strip_trailing_comment(text: &str) -> &str {
    let cut = [text.find("//"), text.find("/*")].into_iter().flatten().min();
    match cut {
        Some(at) => &text[..at],
        None => text,
    }
}

fn has_balanced_parens(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// Interpret a constant's value text. Anything that is not a plain hex,
/// decimal or float literal (after dropping surrounding parentheses and
/// integer suffixes) is kept verbatim as an expression.
pub fn parse_constant_value(raw: &str) -> ConstantValue {
    let raw = raw.trim();
    match parse_int_literal(raw) {
        Some(v) => ConstantValue::Integer(v),
        None => match parse_float_literal(raw) {
            Some(v) => ConstantValue::Float(v),
            None => ConstantValue::Expression(raw.to_string()),
        },
    }
}

fn strip_parens(mut text: &str) -> &str {
    text = text.trim();
    while let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner.trim();
    }
    text
}

/// Hex or decimal integer with optional sign and `u`/`l` suffixes.
pub fn parse_int_literal(raw: &str) -> Option<i128> {
    let text = strip_parens(raw);
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let text = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let magnitude = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
    {
        i128::from_str_radix(hex, 16).ok()?
    } else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        text.parse::<i128>().ok()?
    } else {
        return None;
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// `1.5f`, `2.`, `1e-5`, `-3.0E+2`.
fn parse_float_literal(raw: &str) -> Option<f64> {
    let text = strip_parens(raw);
    let starts_numeric = text.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-');
    if !starts_numeric || !text.contains(['.', 'e', 'E']) {
        return None;
    }
    text.trim_end_matches(['f', 'F']).parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Functions and callbacks
// ---------------------------------------------------------------------------

/// Parse an exported function prototype.
///
/// Variadic prototypes are skipped; there is no way to bind them as a plain
/// function pointer.
pub fn parse_function(line: &str, api: &HeaderApi) -> Option<Signature> {
    parse_function_with(&api.function_pattern(), line)
}

/// Like [`parse_function`] with a pattern compiled once by the caller via
/// [`FunctionMatcher`].
fn parse_function_with(pattern: &Regex, line: &str) -> Option<Signature> {
    let caps = pattern.captures(line)?;
    let return_type = caps[1].trim().to_string();
    // ` *  glfwFoo(window);` inside a doc comment
    if !return_type.chars().any(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let name = caps[2].trim().to_string();
    let params = match parse_params(&caps[3]) {
        Some(p) => p,
        None => {
            debug!(name = %name, "skipping variadic function");
            return None;
        }
    };
    Some(Signature {
        name,
        return_type,
        params,
    })
}

/// Function prototype matcher with its pattern compiled once per header.
#[derive(Debug)]
pub struct FunctionMatcher {
    pattern: Regex,
}

impl FunctionMatcher {
    pub fn new(api: &HeaderApi) -> Self {
        Self {
            pattern: api.function_pattern(),
        }
    }

    pub fn parse(&self, line: &str) -> Option<Signature> {
        parse_function_with(&self.pattern, line)
    }
}

/// A type-defining declaration found during the registration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinition {
    /// `typedef struct Tag Alias;` or `typedef struct Tag *Alias;`
    Opaque(String),
    /// `typedef Ret (*Name)(params);`
    Callback(Signature),
}

/// Parse an opaque struct typedef or a callback typedef.
pub fn parse_type_definition(line: &str) -> Option<TypeDefinition> {
    if let Some(caps) = OPAQUE_TYPEDEF.captures(line) {
        return Some(TypeDefinition::Opaque(caps[3].to_string()));
    }
    parse_callback(line).map(TypeDefinition::Callback)
}

/// Parse `typedef Ret (*Name)(params);`.
pub fn parse_callback(text: &str) -> Option<Signature> {
    let caps = CALLBACK_TYPEDEF.captures(text)?;
    let name = caps[2].trim().to_string();
    let params = parse_params(&caps[3])?;
    Some(Signature {
        name,
        return_type: caps[1].trim().to_string(),
        params,
    })
}

/// Split a comma-joined parameter list. `void` and an empty list mean no
/// parameters; unnamed parameters are named after their position. Returns
/// `None` for variadic lists.
pub fn parse_params(raw: &str) -> Option<Vec<RawDeclaration>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "void" {
        return Some(Vec::new());
    }
    let mut params = Vec::new();
    for (i, piece) in raw.split(',').enumerate() {
        let piece = piece.trim();
        if piece == "..." {
            return None;
        }
        match split_declarator(piece) {
            Some((ty, name)) => params.push(RawDeclaration::new(ty, name)),
            None => params.push(RawDeclaration::new(piece, format!("arg{i}"))),
        }
    }
    Some(params)
}

/// Split `const char* title` into `("const char*", "title")`. Returns `None`
/// when there is no name (`int`, `unsigned int`, `const GLFWvidmode`).
pub fn split_declarator(decl: &str) -> Option<(String, String)> {
    let caps = DECLARATOR.captures(decl.trim())?;
    let ty = caps[1].trim();
    let name = caps[2].trim();
    if ty
        .split_whitespace()
        .all(|word| matches!(word, "const" | "volatile"))
    {
        return None;
    }
    let bare = name.split('[').next().unwrap_or(name).trim();
    if TYPE_WORDS.contains(&bare) {
        return None;
    }
    Some((ty.to_string(), name.to_string()))
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Find every struct definition with a body in `text`.
///
/// Accepts `typedef struct Name { ... } Alias;` and `struct Name { ... };`,
/// on one line or many.
pub fn parse_structs(text: &str) -> Vec<StructDef> {
    let mut structs = Vec::new();
    let mut search_from = 0;

    while let Some(caps) = STRUCT_START.captures_at(text, search_from) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let body_start = whole.end();
        let Some(body_len) = matching_brace(&text[body_start..]) else {
            debug!(name = name.as_str(), "unterminated struct body");
            break;
        };
        let body = &text[body_start..body_start + body_len];
        let after = &text[body_start + body_len + 1..];
        search_from = body_start + body_len + 1;

        let Some(semi) = after.find(';') else {
            continue;
        };
        let alias = after[..semi].trim();
        if alias.contains(['*', '{', '(']) {
            trace!(name = name.as_str(), alias, "skipping struct with pointer alias");
            continue;
        }
        let typedef_alias = if alias.is_empty() {
            name.as_str().to_string()
        } else {
            alias.to_string()
        };

        let fields = parse_fields(body);
        debug!(
            name = name.as_str(),
            alias = %typedef_alias,
            fields = fields.len(),
            "extracted struct"
        );
        structs.push(StructDef {
            name: name.as_str().to_string(),
            typedef_alias,
            fields,
        });
    }

    structs
}

/// Byte length of `text` up to (not including) the `}` closing a block whose
/// `{` was just consumed.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Parse the field list of a struct body.
fn parse_fields(body: &str) -> Vec<RawDeclaration> {
    let body = BLOCK_COMMENT.replace_all(body, "");
    let body = LINE_COMMENT.replace_all(&body, "");
    let body: String = body
        .lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut fields = Vec::new();
    for piece in top_level_statements(&body) {
        let piece = piece.split_whitespace().collect::<Vec<_>>().join(" ");
        if piece.is_empty() || piece.starts_with('*') || piece.starts_with('!') {
            continue;
        }
        if let Some(caps) = CALLBACK_FIELD.captures(&piece) {
            // Function pointer members are stored as untyped pointers.
            fields.push(RawDeclaration::new("void*", &caps[1]));
            continue;
        }
        fields.extend(parse_field_statement(&piece));
    }
    fields
}

/// Split on `;` at brace depth 0. Statements that contain a nested aggregate
/// are dropped.
fn top_level_statements(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut nested = false;
    for c in body.chars() {
        match c {
            '{' => {
                depth += 1;
                nested = true;
            }
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                if nested {
                    trace!(statement = %current.trim(), "skipping nested aggregate field");
                } else {
                    out.push(current.trim().to_string());
                }
                current.clear();
                nested = false;
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    let tail = current.trim();
    if !tail.is_empty() && !nested {
        out.push(tail.to_string());
    }
    out
}

/// `int a, b[2], *c` → three fields sharing the base type `int`.
fn parse_field_statement(statement: &str) -> Vec<RawDeclaration> {
    let mut pieces = statement.split(',');
    let Some(first) = pieces.next() else {
        return Vec::new();
    };
    let Some((ty, name)) = split_declarator(first) else {
        trace!(statement, "field without a name");
        return Vec::new();
    };
    let base = ty.trim_end_matches(['*', ' ']).to_string();
    let mut fields = vec![RawDeclaration::new(ty, name)];
    for extra in pieces {
        let extra = extra.trim();
        if extra.is_empty() {
            continue;
        }
        // Leading `*` on the name is understood by the converter.
        fields.push(RawDeclaration::new(base.clone(), extra));
    }
    fields
}
