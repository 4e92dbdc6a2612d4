//! Configuration types for `glscrape.toml`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::extract::HeaderApi;
use crate::types::{AliasTable, Preset, Primitive};

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    /// Additional directories to search when resolving header, registry and
    /// license paths. Each entry is tried in order after `base_dir` (the TOML
    /// file's parent directory).
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub types: TypesConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Header sources; each becomes one class.
    #[serde(default)]
    pub header: Vec<HeaderConfig>,
    /// XML registry sources; each selected feature becomes one class.
    #[serde(default)]
    pub registry: Vec<RegistryConfig>,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Namespace the generated declarations live in (e.g. `Bindings.GLFW`).
    pub namespace: String,
    /// Output file path (e.g. `GLFW.cs`).
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
    /// License text copied as a comment block at the top of the output.
    #[serde(default)]
    pub license: Option<PathBuf>,
}

fn default_output_file() -> PathBuf {
    PathBuf::from("Bindings.cs")
}

/// Native scalar alias table selection.
#[derive(Debug, Default, Deserialize)]
pub struct TypesConfig {
    #[serde(default)]
    pub preset: Preset,
    /// Extra or overriding `native name = "primitive"` entries.
    #[serde(default)]
    pub aliases: HashMap<String, Primitive>,
}

impl TypesConfig {
    pub fn alias_table(&self) -> AliasTable {
        AliasTable::with_overrides(self.preset, &self.aliases)
    }
}

/// Conversion and emission switches.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Spell callback-typed parameters and fields as function pointers
    /// instead of by delegate name.
    pub inline_callbacks: bool,
    /// Keep `T name[N]` struct fields as `fixed` buffers. When false they
    /// decay to pointers like parameters do.
    pub struct_fixed_arrays: bool,
    /// Drop declarations that reference unknown types.
    pub skip_unknown: bool,
    /// Fail the run if any type could not be resolved.
    pub strict: bool,
    /// Calling convention for `delegate* unmanaged[..]` (e.g. `Cdecl`).
    pub calling_convention: Option<String>,
    /// Name of the native symbol lookup function called by the generated
    /// `Load()` routine. No `Load()`/`Unload()` is emitted when unset.
    pub loader: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            inline_callbacks: false,
            struct_fixed_arrays: true,
            skip_unknown: true,
            strict: false,
            calling_convention: Some("Cdecl".to_string()),
            loader: None,
        }
    }
}

/// A C header source.
#[derive(Debug, Deserialize)]
pub struct HeaderConfig {
    pub path: PathBuf,
    /// Class holding this header's constants and function pointers.
    pub class: String,
    /// Prefix selecting `#define` constants (e.g. `GLFW_`).
    pub constant_prefix: String,
    /// Prefix selecting exported functions (e.g. `glfw`).
    pub function_prefix: String,
    /// Export macro in front of each prototype (e.g. `GLFWAPI`).
    #[serde(default)]
    pub api_macro: Option<String>,
    /// Words removed from every line before matching (e.g. `AL_APIENTRY`).
    #[serde(default)]
    pub remove_words: Vec<String>,
}

impl HeaderConfig {
    pub fn header_api(&self) -> HeaderApi {
        HeaderApi {
            constant_prefix: self.constant_prefix.clone(),
            function_prefix: self.function_prefix.clone(),
            api_macro: self.api_macro.clone(),
            remove_words: self.remove_words.clone(),
        }
    }
}

/// An XML API registry source (`gl.xml` layout).
#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    pub path: PathBuf,
    /// API the features, extensions and enums are filtered by.
    #[serde(default = "default_api")]
    pub api: String,
    /// Feature names to bind. All features of `api` when omitted.
    #[serde(default)]
    pub features: Option<Vec<String>>,
    /// Extension names to bind; entries starting with `@/` are regular
    /// expressions. No extensions when empty.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_api() -> String {
    "gl".to_string()
}

/// Resolve a source path by searching `base_dir` first, then each
/// `include_paths` entry. Absolute paths are returned as-is. If the file is
/// not found anywhere, falls back to `base_dir.join(path)` so that the
/// caller's read reports the path it expected.
pub fn resolve_header(path: &Path, base_dir: &Path, include_paths: &[PathBuf]) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = base_dir.join(path);
    if candidate.exists() {
        return candidate;
    }
    include_paths
        .iter()
        .map(|inc| inc.join(path))
        .find(|c| c.exists())
        .unwrap_or(candidate)
}

/// Load and parse a `glscrape.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    parse_config(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))
}

/// Parse configuration text.
pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
