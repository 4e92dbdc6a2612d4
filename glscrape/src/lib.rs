//! glscrape: C header and XML API registry → C# binding generator.
//!
//! Scrapes constants, function prototypes, structs and callback typedefs from
//! plain header text (GLFW, OpenAL) and commands/enums/features from a
//! `gl.xml`-style registry, maps every native type to a C# spelling, and
//! writes one C# source file of unmanaged function pointers, constants,
//! structs and delegates.
//!
//! # Quick start
//!
//! Generate the bindings file from a config (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads glscrape.toml, scrapes the sources, writes the .cs file.
//! glscrape::run(Path::new("glscrape.toml"), None).unwrap();
//! ```
//!
//! Or get the source text without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let source = glscrape::generate(Path::new("glscrape.toml")).unwrap();
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub mod config;
pub mod convert;
pub mod emit;
pub mod extract;
pub mod model;
pub mod registry;
pub mod types;
pub mod xml;

use config::{Config, HeaderConfig, RegistryConfig};
use convert::{ConvertOptions, TypeConverter};
use extract::{FunctionMatcher, HeaderApi, TypeDefinition};
use model::*;
use registry::{TypeRegistry, TypeRegistryBuilder};

/// Run the full pipeline: load config, scrape the sources, emit C#, and write
/// the output file.
///
/// `config_path` is the path to a `glscrape.toml` file.
/// `output` optionally overrides the output file path from the config.
///
/// Returns the path the `.cs` file was written to.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    write_output(&cfg, base_dir, output)
}

/// Generate from an already-loaded config and write the result to `output`
/// (or the config's `[output] file`, relative to `base_dir`).
pub fn write_output(cfg: &Config, base_dir: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let source = generate_from_config(cfg, base_dir)?;

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output.file),
    };
    std::fs::write(&output_path, &source)
        .with_context(|| format!("writing output to {}", output_path.display()))?;

    info!(
        path = %output_path.display(),
        size = source.len(),
        "wrote bindings"
    );

    Ok(output_path)
}

/// Parse a `glscrape.toml` config file, scrape the referenced sources, and
/// return the generated C# source without writing to disk.
pub fn generate(config_path: &Path) -> Result<String> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Generate C# source from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which source paths in the config
/// are resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &Config, base_dir: &Path) -> Result<String> {
    let scrape = scrape(cfg, base_dir)?;

    let conversion = &cfg.conversion;
    let options = emit::EmitOptions {
        calling_convention: conversion.calling_convention.as_deref(),
        loader: conversion.loader.as_deref(),
        struct_fixed_arrays: conversion.struct_fixed_arrays,
    };
    let source = emit::emit_module(&scrape.module, &options)?;

    info!(size = source.len(), "generated bindings");

    Ok(source)
}

/// Result of scraping and converting every source of a config.
#[derive(Debug)]
pub struct Scrape {
    pub module: Module,
    /// Native type names that could not be mapped, in first-seen order.
    pub unknown_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A header read into memory with `remove_words` applied to every line.
struct HeaderSource<'c> {
    cfg: &'c HeaderConfig,
    api: HeaderApi,
    lines: Vec<String>,
    structs: Vec<StructDef>,
}

impl<'c> HeaderSource<'c> {
    fn load(cfg: &'c HeaderConfig, base_dir: &Path, include_paths: &[PathBuf]) -> Result<Self> {
        let path = config::resolve_header(&cfg.path, base_dir, include_paths);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading header {}", path.display()))?;
        let api = cfg.header_api();
        let lines: Vec<String> = text.lines().map(|l| api.clean_line(l)).collect();
        let structs = extract::parse_structs(&lines.join("\n"));
        info!(
            path = %path.display(),
            lines = lines.len(),
            structs = structs.len(),
            "loaded header"
        );
        Ok(Self {
            cfg,
            api,
            lines,
            structs,
        })
    }

    fn type_definitions(&self) -> impl Iterator<Item = TypeDefinition> + '_ {
        self.lines
            .iter()
            .filter_map(|l| extract::parse_type_definition(l))
    }
}

/// Everything needed from an XML registry, extracted up front so the
/// document does not outlive the load.
struct RegistrySource {
    type_definitions: Vec<TypeDefinition>,
    commands: HashMap<String, Signature>,
    enums: HashMap<String, ConstantDef>,
    features: Vec<Feature>,
}

impl RegistrySource {
    fn load(cfg: &RegistryConfig, base_dir: &Path, include_paths: &[PathBuf]) -> Result<Self> {
        let path = config::resolve_header(&cfg.path, base_dir, include_paths);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading registry {}", path.display()))?;
        let doc = xml::RegistryDocument::parse(&text)
            .with_context(|| format!("parsing registry {}", path.display()))?;
        let root = doc.root();

        let filter = xml::FeatureFilter::new(&cfg.api, cfg.features.clone(), &cfg.extensions)?;
        let features: Vec<Feature> = xml::parse_features(root, &cfg.api)
            .into_iter()
            .chain(xml::parse_extensions(root, &cfg.api))
            .filter(|f| filter.accepts(f))
            .collect();

        let commands = xml::parse_commands(root)
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        let enums = xml::parse_enums(root, &cfg.api)
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect();

        info!(
            path = %path.display(),
            api = %cfg.api,
            features = features.len(),
            "loaded registry"
        );
        Ok(Self {
            type_definitions: xml::parse_type_definitions(root),
            commands,
            enums,
            features,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Scrape every source in `cfg` into a [`Module`].
///
/// Runs in two phases: type definitions from all sources are registered
/// first, then declarations are converted against the frozen registry.
/// Declarations using unknown types are dropped when `skip_unknown` is set;
/// with `strict` any unknown type fails the run.
pub fn scrape(cfg: &Config, base_dir: &Path) -> Result<Scrape> {
    info!(
        namespace = %cfg.output.namespace,
        headers = cfg.header.len(),
        registries = cfg.registry.len(),
        "loaded configuration"
    );

    let headers = cfg
        .header
        .iter()
        .map(|h| HeaderSource::load(h, base_dir, &cfg.include_paths))
        .collect::<Result<Vec<_>>>()?;
    let registries = cfg
        .registry
        .iter()
        .map(|r| RegistrySource::load(r, base_dir, &cfg.include_paths))
        .collect::<Result<Vec<_>>>()?;

    // Phase 1: registration over the whole input.
    let mut builder = TypeRegistryBuilder::new();
    let definitions = headers
        .iter()
        .flat_map(|h| h.type_definitions().collect::<Vec<_>>())
        .chain(registries.iter().flat_map(|r| r.type_definitions.clone()));
    for def in definitions {
        match def {
            TypeDefinition::Opaque(alias) => builder.register_opaque_struct(&alias),
            TypeDefinition::Callback(signature) => builder.register_callback(signature),
        }
    }
    for h in &headers {
        builder.register_data_structs(&h.structs);
    }
    let registry = builder.freeze();

    // Phase 2: conversion.
    let aliases = cfg.types.alias_table();
    debug!(preset = ?cfg.types.preset, aliases = aliases.len(), "alias table");
    let mut pass = ConversionPass::new(cfg, &registry, &aliases);

    let mut module = Module {
        namespace: cfg.output.namespace.clone(),
        header_comment: license_lines(cfg, base_dir)?,
        ..Default::default()
    };

    let mut seen_structs = HashSet::new();
    let structs: Vec<&StructDef> = headers
        .iter()
        .flat_map(|h| &h.structs)
        .filter(|s| seen_structs.insert(s.typedef_alias.as_str()))
        .collect();
    (module.structs, module.callbacks) = pass.type_declarations(&structs, registry.callbacks());
    for h in &headers {
        module.classes.push(pass.header_class(h));
    }
    for r in &registries {
        for feature in &r.features {
            module.classes.push(pass.feature_class(r, feature));
        }
    }

    let unknown_types = pass.converter.into_unknown_types();
    if cfg.conversion.strict {
        check_unknown_types(&unknown_types)?;
    }

    info!(
        structs = module.structs.len(),
        callbacks = module.callbacks.len(),
        classes = module.classes.len(),
        unknown = unknown_types.len(),
        "converted declarations"
    );

    Ok(Scrape {
        module,
        unknown_types,
    })
}

/// Phase 2 state: the converter plus the switches from `[conversion]`.
struct ConversionPass<'a> {
    converter: TypeConverter<'a>,
    inline_callbacks: bool,
    struct_options: ConvertOptions,
    skip_unknown: bool,
}

impl<'a> ConversionPass<'a> {
    fn new(cfg: &Config, registry: &'a TypeRegistry, aliases: &'a types::AliasTable) -> Self {
        let conversion = &cfg.conversion;
        Self {
            converter: TypeConverter::new(registry, aliases)
                .with_calling_convention(conversion.calling_convention.clone()),
            inline_callbacks: conversion.inline_callbacks,
            struct_options: ConvertOptions {
                decay_fixed_arrays: !conversion.struct_fixed_arrays,
                inline_callbacks: conversion.inline_callbacks,
            },
            skip_unknown: conversion.skip_unknown,
        }
    }

    fn structure(&mut self, s: &StructDef) -> Option<ConvertedStruct> {
        let converted = self.converter.convert_struct(s, self.struct_options);
        if self.skip_unknown && converted.has_unknown() {
            warn!(name = %converted.name, "skipping struct (contains unknown types)");
            return None;
        }
        debug!(name = %converted.name, fields = converted.fields.len(), "converted struct");
        Some(converted)
    }

    /// Convert structs and callback typedefs. A dropped one is withdrawn from
    /// the registry and the rest are converted again, until nothing more is
    /// dropped, so no output declaration names a type that is not emitted.
    fn type_declarations(
        &mut self,
        structs: &[&StructDef],
        callbacks: &[Signature],
    ) -> (Vec<ConvertedStruct>, Vec<ConvertedSignature>) {
        loop {
            let mut withdrew = false;
            let mut converted_structs = Vec::new();
            for s in structs {
                if self.converter.is_withdrawn(&s.typedef_alias) {
                    continue;
                }
                match self.structure(s) {
                    Some(converted) => converted_structs.push(converted),
                    None => withdrew |= self.converter.withdraw(&s.typedef_alias),
                }
            }
            let mut converted_callbacks = Vec::new();
            for cb in callbacks {
                if self.converter.is_withdrawn(&cb.name) {
                    continue;
                }
                match self.signature(cb, false, "callback") {
                    Some(converted) => converted_callbacks.push(converted),
                    None => withdrew |= self.converter.withdraw(&cb.name),
                }
            }
            if !withdrew {
                return (converted_structs, converted_callbacks);
            }
        }
    }

    fn signature(
        &mut self,
        signature: &Signature,
        inline_callbacks: bool,
        kind: &'static str,
    ) -> Option<ConvertedSignature> {
        let converted = self.converter.convert_signature(signature, inline_callbacks);
        if self.skip_unknown && converted.has_unknown() {
            warn!(name = %converted.name, kind, "skipping declaration (contains unknown types)");
            return None;
        }
        Some(converted)
    }

    fn header_class(&mut self, header: &HeaderSource<'_>) -> ClassBindings {
        let matcher = FunctionMatcher::new(&header.api);
        let inline = self.inline_callbacks;
        let mut class = ClassBindings {
            name: header.cfg.class.clone(),
            ..Default::default()
        };
        let mut names = HashSet::new();
        for line in &header.lines {
            if let Some(c) = extract::parse_constant(line, &header.api.constant_prefix) {
                // `#define AL_API extern`
                let is_macro = header.api.api_macro.as_deref() == Some(c.name.as_str());
                if !is_macro && names.insert(c.name.clone()) {
                    class.constants.push(c);
                }
            } else if let Some(f) = matcher.parse(line)
                && names.insert(f.name.clone())
                && let Some(converted) = self.signature(&f, inline, "function")
            {
                class.functions.push(converted);
            }
        }
        debug!(
            class = %class.name,
            constants = class.constants.len(),
            functions = class.functions.len(),
            "scraped header"
        );
        class
    }

    fn feature_class(&mut self, source: &RegistrySource, feature: &Feature) -> ClassBindings {
        let mut class = ClassBindings {
            name: xml::class_name_for(&feature.name),
            ..Default::default()
        };
        let inline = self.inline_callbacks;
        let mut seen = HashSet::new();
        for name in &feature.enums {
            if !seen.insert(name.as_str()) {
                continue;
            }
            match source.enums.get(name) {
                Some(c) => class.constants.push(c.clone()),
                None => debug!(feature = %feature.name, name = %name, "enum not defined for api"),
            }
        }
        for name in &feature.commands {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let Some(command) = source.commands.get(name) else {
                debug!(feature = %feature.name, name = %name, "command not defined");
                continue;
            };
            if let Some(converted) = self.signature(command, inline, "command") {
                class.functions.push(converted);
            }
        }
        debug!(
            class = %class.name,
            constants = class.constants.len(),
            functions = class.functions.len(),
            "selected feature"
        );
        class
    }
}

/// License text as comment lines.
fn license_lines(cfg: &Config, base_dir: &Path) -> Result<Vec<String>> {
    let Some(license) = &cfg.output.license else {
        return Ok(Vec::new());
    };
    let path = config::resolve_header(license, base_dir, &cfg.include_paths);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading license {}", path.display()))?;
    Ok(text.lines().map(|l| l.trim_end().to_string()).collect())
}

/// Fail with a summary of every type the converter could not map.
fn check_unknown_types(unknown: &[String]) -> Result<()> {
    if unknown.is_empty() {
        return Ok(());
    }

    let mut msg = format!(
        "{} unresolved type(s) found.\n\
         Hint: map each native scalar under `[types.aliases]` (e.g. `MyInt = \"int\"`), \
         or add the header that defines the struct or callback as a `[[header]]` source.\n",
        unknown.len()
    );
    for ty in unknown {
        msg.push_str(&format!("\n  • `{ty}`"));
    }

    anyhow::bail!("{msg}");
}
