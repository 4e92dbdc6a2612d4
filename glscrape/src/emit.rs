//! Emitter: converted model types → C# source text.

use anyhow::{Result, bail};
use tracing::debug;

use crate::convert::fn_pointer_type;
use crate::model::*;

/// Switches that shape the generated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions<'a> {
    /// Calling convention inside `delegate* unmanaged[..]`.
    pub calling_convention: Option<&'a str>,
    /// Native symbol lookup function used by `Load()`.
    pub loader: Option<&'a str>,
    /// Struct fields with a fixed array length were kept as inline arrays.
    pub struct_fixed_arrays: bool,
}

/// Element types C# allows in a `fixed` buffer.
const FIXED_BUFFER_TYPES: &[&str] = &[
    "bool", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "char", "float",
    "double",
];

const INDENT: &str = "    ";

/// Line-oriented text builder with brace-driven indentation.
#[derive(Default)]
struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, header: impl AsRef<str>) {
        self.line(header);
        self.line("{");
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }
}

/// Render one output file.
pub fn emit_module(module: &Module, options: &EmitOptions<'_>) -> Result<String> {
    if module.namespace.trim().is_empty() {
        bail!("output namespace is empty");
    }

    let mut w = CodeWriter::default();
    for line in &module.header_comment {
        if line.is_empty() {
            w.line("//");
        } else {
            w.line(format!("// {line}"));
        }
    }
    if !module.header_comment.is_empty() {
        w.blank();
    }

    w.open(format!("namespace {}", module.namespace));
    let mut first = true;
    let mut separate = |w: &mut CodeWriter| {
        if !first {
            w.blank();
        }
        first = false;
    };

    for s in &module.structs {
        separate(&mut w);
        emit_struct(&mut w, s, options);
    }
    for cb in &module.callbacks {
        separate(&mut w);
        w.line(format!(
            "public unsafe delegate {} {}({});",
            cb.return_type.rendered,
            cb.name,
            param_list(&cb.params)
        ));
    }
    for class in &module.classes {
        if class.name.trim().is_empty() {
            bail!("class name is empty");
        }
        if class.constants.is_empty() && class.functions.is_empty() {
            debug!(class = %class.name, "skipping empty class");
            continue;
        }
        separate(&mut w);
        emit_class(&mut w, class, options);
    }
    w.close();

    Ok(w.out)
}

fn emit_struct(w: &mut CodeWriter, s: &ConvertedStruct, options: &EmitOptions<'_>) {
    w.open(format!("public unsafe struct {}", s.name));
    for (i, field) in s.fields.iter().enumerate() {
        let name = field.name.clone().unwrap_or_else(|| format!("field{i}"));
        match field.fixed_array_len {
            Some(len) if options.struct_fixed_arrays => {
                if FIXED_BUFFER_TYPES.contains(&field.rendered.as_str()) {
                    w.line(format!("public fixed {} {name}[{len}];", field.rendered));
                } else {
                    // Structs and pointers can't live in a fixed buffer.
                    for n in 0..len {
                        w.line(format!("public {} {name}_{n};", field.rendered));
                    }
                }
            }
            _ => w.line(format!("public {} {name};", field.rendered)),
        }
    }
    w.close();
}

fn param_list(params: &[ConvertedType]) -> String {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| match &p.name {
            Some(name) => format!("{} {name}", p.rendered),
            None => format!("{} arg{i}", p.rendered),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn function_pointer(f: &ConvertedSignature, options: &EmitOptions<'_>) -> String {
    fn_pointer_type(
        options.calling_convention,
        f.params.iter().map(|p| p.rendered.as_str()),
        &f.return_type.rendered,
    )
}

fn emit_class(w: &mut CodeWriter, class: &ClassBindings, options: &EmitOptions<'_>) {
    w.open(format!("public static unsafe class {}", class.name));

    for c in &class.constants {
        w.line(format!(
            "public const {} {} = {};",
            c.value.type_keyword(),
            c.name,
            c.value.literal()
        ));
    }
    if !class.constants.is_empty() && !class.functions.is_empty() {
        w.blank();
    }

    for f in &class.functions {
        w.line(format!("public static {} {};", function_pointer(f, options), f.name));
    }

    if let Some(loader) = options.loader
        && !class.functions.is_empty()
    {
        w.blank();
        w.open("public static void Load()");
        for f in &class.functions {
            w.line(format!(
                "{} = ({}){loader}(\"{}\");",
                f.name,
                function_pointer(f, options),
                f.name
            ));
        }
        w.close();
        w.blank();
        w.open("public static void Unload()");
        for f in &class.functions {
            w.line(format!("{} = null;", f.name));
        }
        w.close();
    }

    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(rendered: &str, name: &str) -> ConvertedType {
        ConvertedType {
            rendered: rendered.to_string(),
            name: Some(name.to_string()),
            fixed_array_len: None,
        }
    }

    fn sample_module() -> Module {
        Module {
            namespace: "Bindings.Test".to_string(),
            header_comment: vec!["Copyright (c) Someone".to_string(), String::new()],
            structs: vec![ConvertedStruct {
                name: "Matrix".to_string(),
                fields: vec![
                    ConvertedType {
                        rendered: "float".to_string(),
                        name: Some("m".to_string()),
                        fixed_array_len: Some(16),
                    },
                    ConvertedType {
                        rendered: "Vec2".to_string(),
                        name: Some("corners".to_string()),
                        fixed_array_len: Some(2),
                    },
                ],
            }],
            callbacks: vec![ConvertedSignature {
                name: "OnKey".to_string(),
                return_type: ConvertedType {
                    rendered: "void".to_string(),
                    name: None,
                    fixed_array_len: None,
                },
                params: vec![ty("nint", "window"), ty("int", "key")],
            }],
            classes: vec![
                ClassBindings {
                    name: "Test".to_string(),
                    constants: vec![
                        ConstantDef {
                            name: "TEST_BIG".to_string(),
                            value: ConstantValue::Integer(0x1_0000_0000),
                        },
                        ConstantDef {
                            name: "TEST_MIN".to_string(),
                            value: ConstantValue::Integer(-2_147_483_648),
                        },
                    ],
                    functions: vec![ConvertedSignature {
                        name: "testInit".to_string(),
                        return_type: ConvertedType {
                            rendered: "int".to_string(),
                            name: None,
                            fixed_array_len: None,
                        },
                        params: vec![],
                    }],
                },
                ClassBindings {
                    name: "Empty".to_string(),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn emits_structs_delegates_and_classes() {
        let options = EmitOptions {
            calling_convention: Some("Cdecl"),
            loader: Some("GetProc"),
            struct_fixed_arrays: true,
        };
        let text = emit_module(&sample_module(), &options).unwrap();

        assert!(text.starts_with("// Copyright (c) Someone\n//\n\nnamespace Bindings.Test\n{\n"));
        assert!(text.contains("        public fixed float m[16];\n"), "{text}");
        assert!(text.contains("public Vec2 corners_0;"), "{text}");
        assert!(text.contains("public Vec2 corners_1;"), "{text}");
        assert!(text.contains("public unsafe delegate void OnKey(nint window, int key);"));
        assert!(text.contains("public const long TEST_BIG = 0x100000000;"), "{text}");
        assert!(text.contains("public const int TEST_MIN = -2147483648;"), "{text}");
        assert!(text.contains("public static delegate* unmanaged[Cdecl]<int> testInit;"));
        assert!(
            text.contains("testInit = (delegate* unmanaged[Cdecl]<int>)GetProc(\"testInit\");"),
            "{text}"
        );
        assert!(text.contains("testInit = null;"));
        assert!(!text.contains("class Empty"), "empty class should be skipped");
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn no_loader_means_no_load_routine() {
        let text = emit_module(&sample_module(), &EmitOptions::default()).unwrap();
        assert!(!text.contains("Load()"));
        assert!(text.contains("public static delegate* unmanaged<int> testInit;"));
    }

    #[test]
    fn decayed_struct_arrays_are_plain_fields() {
        let mut module = sample_module();
        module.structs[0].fields[0].rendered = "float*".to_string();
        let text = emit_module(&module, &EmitOptions::default()).unwrap();
        assert!(text.contains("public float* m;"), "{text}");
        assert!(!text.contains("fixed"));
    }

    #[test]
    fn empty_namespace_is_an_error() {
        let module = Module::default();
        assert!(emit_module(&module, &EmitOptions::default()).is_err());
    }
}
