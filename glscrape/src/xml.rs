//! Extraction: XML API registry (`gl.xml` layout) → intermediate model types.
//!
//! Only three tree operations are used: children by tag path, attribute
//! lookup, and text/tail access. Entries missing a required attribute or
//! child element are skipped without failing the batch.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use roxmltree::{Document, Node};
use tracing::{debug, trace};

use crate::extract::{self, TypeDefinition};
use crate::model::*;

/// Parsed registry document.
pub struct RegistryDocument<'input> {
    doc: Document<'input>,
}

impl<'input> RegistryDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self> {
        let doc = Document::parse(text).context("parsing XML registry")?;
        Ok(Self { doc })
    }

    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.has_tag_name(tag))
}

fn child_named<'a, 'input>(node: Node<'a, 'input>, tag: &'static str) -> Option<Node<'a, 'input>> {
    children_named(node, tag).next()
}

/// All elements reached from `node` by a `/`-separated tag path.
fn find_all<'a, 'input>(node: Node<'a, 'input>, path: &'static str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for tag in path.split('/') {
        current = current
            .into_iter()
            .flat_map(|n| children_named(n, tag))
            .collect();
    }
    current
}

fn trimmed_text(node: Node<'_, '_>) -> Option<String> {
    let text = node.text()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Reassemble the C type of a `<proto>` or `<param>` element.
///
/// The type is split across text nodes around embedded tags
/// (`const <ptype>GLchar</ptype> *<name>s</name>`). Concatenate the element's
/// leading text with the text and tail of every child except `<name>`.
fn reassemble_type(node: Node<'_, '_>) -> String {
    let mut ty = node.text().unwrap_or_default().to_string();
    for child in node.children().filter(Node::is_element) {
        if child.has_tag_name("name") {
            continue;
        }
        ty.push_str(child.text().unwrap_or_default());
        ty.push_str(child.tail().unwrap_or_default());
    }
    ty.trim().to_string()
}

/// All text below `node`, in document order.
fn full_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Callback and opaque handle typedefs from `types/type`.
pub fn parse_type_definitions(root: Node<'_, '_>) -> Vec<TypeDefinition> {
    find_all(root, "types/type")
        .into_iter()
        .filter_map(|t| extract::parse_type_definition(&full_text(t)))
        .collect()
}

/// `commands/command` entries as signatures.
pub fn parse_commands(root: Node<'_, '_>) -> Vec<Signature> {
    let mut commands = Vec::new();
    for command in find_all(root, "commands/command") {
        let Some(proto) = child_named(command, "proto") else {
            continue;
        };
        let Some(name) = child_named(proto, "name").and_then(trimmed_text) else {
            continue;
        };

        let mut params = Vec::new();
        for param in children_named(command, "param") {
            let Some(pname) = child_named(param, "name").and_then(trimmed_text) else {
                continue;
            };
            params.push(RawDeclaration::new(reassemble_type(param), pname));
        }

        trace!(name = %name, params = params.len(), "command");
        commands.push(Signature {
            name,
            return_type: reassemble_type(proto),
            params,
        });
    }
    debug!(count = commands.len(), "parsed commands");
    commands
}

/// `enums/enum` entries. Entries restricted to a different `api` are
/// dropped; the first definition of a name wins.
pub fn parse_enums(root: Node<'_, '_>, api: &str) -> Vec<ConstantDef> {
    let mut seen = HashSet::new();
    let mut enums = Vec::new();
    for e in find_all(root, "enums/enum") {
        let (Some(name), Some(value)) = (e.attribute("name"), e.attribute("value")) else {
            continue;
        };
        if e.attribute("api").is_some_and(|a| a != api) {
            continue;
        }
        let name = name.trim();
        if !seen.insert(name.to_string()) {
            continue;
        }
        enums.push(ConstantDef {
            name: name.to_string(),
            value: extract::parse_constant_value(value),
        });
    }
    debug!(count = enums.len(), api, "parsed enums");
    enums
}

/// Names listed under `require`. Blocks restricted to another api
/// (`<require api="gles2">`) are left out.
fn parse_requirements(
    element: Node<'_, '_>,
    name: &str,
    supported: Option<&str>,
    is_extension: bool,
    api: &str,
) -> Feature {
    let required = |tag: &'static str| -> Vec<String> {
        children_named(element, "require")
            .filter(|r| r.attribute("api").is_none_or(|a| a == api))
            .flat_map(|r| children_named(r, tag))
            .filter_map(|n| n.attribute("name"))
            .map(|n| n.trim().to_string())
            .collect()
    };
    Feature {
        name: name.to_string(),
        api: supported.map(str::to_string),
        is_extension,
        enums: required("enum"),
        commands: required("command"),
    }
}

/// `feature` elements (core API versions), with requirements for `api`.
pub fn parse_features(root: Node<'_, '_>, api: &str) -> Vec<Feature> {
    find_all(root, "feature")
        .into_iter()
        .filter_map(|f| {
            let name = f.attribute("name")?.trim();
            Some(parse_requirements(f, name, f.attribute("api"), false, api))
        })
        .collect()
}

/// `extensions/extension` elements, with requirements for `api`.
pub fn parse_extensions(root: Node<'_, '_>, api: &str) -> Vec<Feature> {
    find_all(root, "extensions/extension")
        .into_iter()
        .filter_map(|e| {
            let name = e.attribute("name")?.trim();
            Some(parse_requirements(e, name, e.attribute("supported"), true, api))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Feature selection
// ---------------------------------------------------------------------------

/// Decides which features and extensions get bindings.
#[derive(Debug)]
pub struct FeatureFilter {
    api: String,
    features: Option<Vec<String>>,
    extension_names: Vec<String>,
    extension_patterns: Vec<Regex>,
}

/// Prefix marking an extension allow-list entry as a regular expression.
pub const PATTERN_PREFIX: &str = "@/";

impl FeatureFilter {
    /// `features = None` accepts every feature of `api`. Extension entries
    /// starting with `@/` are regular expressions matched against the name.
    pub fn new(api: &str, features: Option<Vec<String>>, extensions: &[String]) -> Result<Self> {
        let mut extension_names = Vec::new();
        let mut extension_patterns = Vec::new();
        for entry in extensions {
            match entry.strip_prefix(PATTERN_PREFIX) {
                Some(pattern) => extension_patterns.push(
                    Regex::new(pattern)
                        .with_context(|| format!("invalid extension pattern `{entry}`"))?,
                ),
                None => extension_names.push(entry.clone()),
            }
        }
        Ok(Self {
            api: api.to_string(),
            features,
            extension_names,
            extension_patterns,
        })
    }

    fn supports_api(&self, feature: &Feature) -> bool {
        let Some(api) = feature.api.as_deref() else {
            return false;
        };
        if !feature.is_extension {
            return api == self.api;
        }
        api.split('|')
            .any(|a| a == self.api || (self.api == "gl" && a == "glcore"))
    }

    pub fn accepts(&self, feature: &Feature) -> bool {
        if !self.supports_api(feature) {
            return false;
        }
        if feature.is_extension {
            self.extension_names.iter().any(|n| *n == feature.name)
                || self
                    .extension_patterns
                    .iter()
                    .any(|p| p.is_match(&feature.name))
        } else {
            match &self.features {
                Some(allowed) => allowed.iter().any(|n| *n == feature.name),
                None => true,
            }
        }
    }
}

/// Class name for a feature: `GL_VERSION_1_0` → `GL10`,
/// `GL_ARB_debug_output` → `GLARBdebugoutput`.
pub fn class_name_for(feature: &str) -> String {
    feature.replace("_VERSION", "").replace('_', "")
}
