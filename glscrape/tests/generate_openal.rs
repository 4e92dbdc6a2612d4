//! End-to-end: al.h + alc.h → one C# file with an `AL` and an `ALC` class.

use std::path::Path;
use std::sync::LazyLock;

static OPENAL_CS: LazyLock<String> = LazyLock::new(|| {
    let path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/openal/openal.toml");
    glscrape::generate(&path).expect("generate openal bindings")
});

fn has_line(line: &str) -> bool {
    OPENAL_CS.lines().any(|l| l.trim() == line)
}

/// Text of one class body, from its header to the closing brace at class
/// indentation.
fn class_body(name: &str) -> &'static str {
    let header = format!("    public static unsafe class {name}\n");
    let start = OPENAL_CS
        .find(&header)
        .unwrap_or_else(|| panic!("class {name} missing. Output:\n{}", *OPENAL_CS));
    let rest = &OPENAL_CS[start..];
    let end = rest.find("\n    }\n").map_or(rest.len(), |i| i + 7);
    &rest[..end]
}

#[test]
fn one_class_per_header() {
    let al = class_body("AL");
    let alc = class_body("ALC");

    assert!(al.contains("public const int AL_POSITION = 0x1004;"), "{al}");
    assert!(al.contains("alGenSources;"), "{al}");
    assert!(!al.contains("ALC_FREQUENCY"), "{al}");

    assert!(alc.contains("public const int ALC_FREQUENCY = 0x1007;"), "{alc}");
    assert!(alc.contains("alcOpenDevice;"), "{alc}");
    assert!(!alc.contains("alGenSources"), "{alc}");
}

#[test]
fn export_macros_are_not_constants() {
    assert!(!OPENAL_CS.contains("AL_API ="), "{}", *OPENAL_CS);
    assert!(!OPENAL_CS.contains("ALC_API ="), "{}", *OPENAL_CS);
    assert!(!OPENAL_CS.contains("AL_APIENTRY"), "{}", *OPENAL_CS);
}

#[test]
fn removed_words_let_prototypes_match() {
    for line in [
        "public static delegate* unmanaged[Cdecl]<int, void> alEnable;",
        "public static delegate* unmanaged[Cdecl]<int, byte*> alGetString;",
        "public static delegate* unmanaged[Cdecl]<int> alGetError;",
        "public static delegate* unmanaged[Cdecl]<byte*, byte> alIsExtensionPresent;",
        "public static delegate* unmanaged[Cdecl]<byte*, void*> alGetProcAddress;",
        "public static delegate* unmanaged[Cdecl]<int, uint*, void> alGenSources;",
        "public static delegate* unmanaged[Cdecl]<uint, int, float*, void> alSourcefv;",
        "public static delegate* unmanaged[Cdecl]<uint, int, void*, int, int, void> alBufferData;",
    ] {
        assert!(has_line(line), "`{line}` missing. Output:\n{}", *OPENAL_CS);
    }
}

#[test]
fn opaque_device_handles() {
    for line in [
        "public static delegate* unmanaged[Cdecl]<nint, int*, nint> alcCreateContext;",
        "public static delegate* unmanaged[Cdecl]<nint, byte> alcMakeContextCurrent;",
        "public static delegate* unmanaged[Cdecl]<byte*, nint> alcOpenDevice;",
        "public static delegate* unmanaged[Cdecl]<nint, void*, int, void> alcCaptureSamples;",
    ] {
        assert!(has_line(line), "`{line}` missing. Output:\n{}", *OPENAL_CS);
    }
}

#[test]
fn function_pointer_typedefs_become_delegates() {
    assert!(has_line("public unsafe delegate void LPALENABLE(int capability);"));
    assert!(has_line("public unsafe delegate byte* LPALGETSTRING(int param);"));
}

#[test]
fn loader_uses_configured_function() {
    assert!(has_line(
        "alcOpenDevice = (delegate* unmanaged[Cdecl]<byte*, nint>)LoadFunction(\"alcOpenDevice\");"
    ));
    assert!(has_line("alEnable = null;"));
    assert_eq!(
        OPENAL_CS.matches("public static void Load()").count(),
        2,
        "one Load() per class"
    );
}

#[test]
fn booleans_are_single_bytes() {
    assert!(
        has_line("public static delegate* unmanaged[Cdecl]<nint, byte> alcCloseDevice;"),
        "{}",
        *OPENAL_CS
    );
    assert!(
        !OPENAL_CS.contains("bool"),
        "ALboolean/ALCboolean must not be written as C# bool:\n{}",
        *OPENAL_CS
    );
}
