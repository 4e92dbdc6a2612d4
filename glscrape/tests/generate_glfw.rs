//! End-to-end: glfw3.h → C# bindings, checked line by line.

use std::path::Path;
use std::sync::LazyLock;

static GLFW_CS: LazyLock<String> = LazyLock::new(|| {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/glfw/glfw.toml");
    glscrape::generate(&path).expect("generate glfw bindings")
});

fn has_line(line: &str) -> bool {
    GLFW_CS.lines().any(|l| l.trim() == line)
}

#[test]
fn license_and_namespace() {
    assert!(
        GLFW_CS.starts_with("// Copyright (c) 2002-2006 Marcus Geelnard\n//\n"),
        "license header missing:\n{}",
        *GLFW_CS
    );
    assert!(has_line("namespace Bindings.GLFW"));
}

#[test]
fn structs() {
    for line in [
        "public unsafe struct GLFWvidmode",
        "public int width;",
        "public int refreshRate;",
        "public unsafe struct GLFWgammaramp",
        "public ushort* red;",
        "public uint size;",
        "public byte* pixels;",
        "public fixed byte buttons[15];",
        "public fixed float axes[6];",
    ] {
        assert!(has_line(line), "`{line}` missing. Output:\n{}", *GLFW_CS);
    }
}

#[test]
fn callback_delegates() {
    for line in [
        "public unsafe delegate void GLFWglproc();",
        "public unsafe delegate void GLFWerrorfun(int error_code, byte* description);",
        "public unsafe delegate void GLFWkeyfun(nint window, int key, int scancode, int action, int mods);",
        "public unsafe delegate void GLFWdropfun(nint window, int path_count, byte** paths);",
    ] {
        assert!(has_line(line), "`{line}` missing. Output:\n{}", *GLFW_CS);
    }
}

#[test]
fn constants() {
    for line in [
        "public const int GLFW_VERSION_MAJOR = 0x3;",
        "public const int GLFW_KEY_UNKNOWN = -1;",
        "public const int GLFW_KEY_ESCAPE = 0x100;",
        "public const int GLFW_FOCUSED = 0x20001;",
        "public const uint GLFW_HAT_RIGHT_UP = (GLFW_HAT_RIGHT | GLFW_HAT_UP);",
        "public const uint GLFW_KEY_LAST = GLFW_KEY_MENU;",
    ] {
        assert!(has_line(line), "`{line}` missing. Output:\n{}", *GLFW_CS);
    }
    assert!(
        !GLFW_CS.contains("GLFW_INCLUDE_NONE"),
        "valueless define should be skipped"
    );
}

#[test]
fn function_pointers() {
    for line in [
        "public static delegate* unmanaged[Cdecl]<int> glfwInit;",
        "public static delegate* unmanaged[Cdecl]<void> glfwTerminate;",
        "public static delegate* unmanaged[Cdecl]<int*, int*, int*, void> glfwGetVersion;",
        "public static delegate* unmanaged[Cdecl]<byte*> glfwGetVersionString;",
        "public static delegate* unmanaged[Cdecl]<int*, nint> glfwGetMonitors;",
        "public static delegate* unmanaged[Cdecl]<nint, GLFWvidmode*> glfwGetVideoMode;",
        "public static delegate* unmanaged[Cdecl]<int, int, byte*, nint, nint, nint> glfwCreateWindow;",
        "public static delegate* unmanaged[Cdecl]<nint, GLFWgammaramp*, void> glfwSetGammaRamp;",
        "public static delegate* unmanaged[Cdecl]<nint, GLFWkeyfun, GLFWkeyfun> glfwSetKeyCallback;",
        "public static delegate* unmanaged[Cdecl]<int, GLFWgamepadstate*, int> glfwGetGamepadState;",
    ] {
        assert!(has_line(line), "`{line}` missing. Output:\n{}", *GLFW_CS);
    }
}

#[test]
fn unknown_types_skip_the_function() {
    assert!(
        !GLFW_CS.contains("glfwCreateWindowSurface"),
        "function with Vulkan types should be skipped"
    );
    assert!(!GLFW_CS.contains("__UNKNOWN_"));
}

#[test]
fn load_and_unload() {
    assert!(has_line("public static void Load()"));
    assert!(has_line("public static void Unload()"));
    assert!(has_line(
        "glfwInit = (delegate* unmanaged[Cdecl]<int>)NativeLoader.GetExport(\"glfwInit\");"
    ));
    assert!(has_line("glfwDestroyWindow = null;"));
}

#[test]
fn scrape_reports_unknown_types() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/glfw/glfw.toml");
    let cfg = glscrape::config::load_config(&path).expect("load config");
    let base_dir = path.parent().expect("fixture dir");
    let scrape = glscrape::scrape(&cfg, base_dir).expect("scrape");

    assert_eq!(
        scrape.unknown_types,
        ["VkResult", "VkInstance", "VkAllocationCallbacks", "VkSurfaceKHR"],
        "unknown types in first-seen order"
    );
    let class = &scrape.module.classes[0];
    assert_eq!(class.name, "GLFW");
    assert_eq!(class.functions.len(), 15, "functions: {:?}", class.functions);
}

#[test]
fn struct_arrays_decay_when_fixed_arrays_are_off() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/glfw/glfw.toml");
    let mut cfg = glscrape::config::load_config(&path).expect("load config");
    cfg.conversion.struct_fixed_arrays = false;
    let base_dir = path.parent().expect("fixture dir");
    let cs = glscrape::generate_from_config(&cfg, base_dir).expect("generate");

    let has = |line: &str| cs.lines().any(|l| l.trim() == line);
    assert!(has("public byte* buttons;"), "decayed buttons missing:\n{cs}");
    assert!(has("public float* axes;"), "decayed axes missing:\n{cs}");
    assert!(!cs.contains("fixed "), "no fixed buffers expected:\n{cs}");
    // Parameters decay either way.
    assert!(
        has("public unsafe delegate void GLFWdropfun(nint window, int path_count, byte** paths);"),
        "{cs}"
    );
}
