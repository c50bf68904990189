//! The software context's shader model.
//!
//! `SoftGl` does not execute GLSL. Linking extracts the declared interface (attributes,
//! uniforms, uniform blocks) and picks one of a handful of fragment behaviours that cover
//! the flat-colour, vertex-colour and textured-point shaders used throughout the test suites.

use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UniformKind {
    Sampler,
    Vec4,
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ShaderInterface {
    pub attributes: Vec<String>,
    pub uniforms: Vec<(String, UniformKind)>,
    pub blocks: Vec<String>,
    pub samples_texture: bool,
}

/// What a linked program writes for each covered fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FragmentOutput {
    /// Texel (0,0) of the 2D texture bound to the unit named by the sampler uniform.
    Texture { sampler: Option<u32> },
    /// The value of a `vec4` uniform.
    Uniform(u32),
    /// The value of a vertex attribute, forwarded through a varying.
    Attribute(u32),
    Constant([u8; 4]),
}

fn strip_array_suffix(name: &str) -> &str {
    name.split('[').next().unwrap_or(name)
}

fn tokens(source: &str) -> Vec<&str> {
    source
        .split(|c: char| c.is_whitespace() || matches!(c, ';' | ',' | '(' | ')' | '{' | '}'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extract the declared interface of one shader stage.
pub(crate) fn parse_interface(source: &str, is_vertex: bool) -> ShaderInterface {
    let mut iface = ShaderInterface {
        samples_texture: source.contains("texture2D(") || source.contains("texture("),
        ..Default::default()
    };

    let toks = tokens(source);
    let mut i = 0;
    while i < toks.len() {
        let tok = toks[i];
        let is_attribute = tok == "attribute" || (is_vertex && tok == "in");
        if is_attribute || tok == "uniform" {
            // Skip precision qualifiers between the storage qualifier and the type.
            let mut j = i + 1;
            while j < toks.len() && matches!(toks[j], "lowp" | "mediump" | "highp") {
                j += 1;
            }
            if j + 1 >= toks.len() {
                break;
            }
            let ty = toks[j];
            let name = strip_array_suffix(toks[j + 1]).to_string();
            if is_attribute {
                if !iface.attributes.contains(&name) {
                    iface.attributes.push(name);
                }
            } else if ty.chars().next().is_some_and(char::is_uppercase) {
                // `uniform Block { ... }` declares a uniform block, not a uniform.
                if !iface.blocks.iter().any(|b| b == ty) {
                    iface.blocks.push(ty.to_string());
                }
            } else {
                let kind = match ty {
                    t if t.starts_with("sampler") => UniformKind::Sampler,
                    "vec4" => UniformKind::Vec4,
                    _ => UniformKind::Other,
                };
                if !iface.uniforms.iter().any(|(n, _)| *n == name) {
                    iface.uniforms.push((name, kind));
                }
            }
            i = j + 2;
            continue;
        }
        i += 1;
    }
    iface
}

pub(crate) fn is_position_attribute(name: &str) -> bool {
    matches!(name, "position" | "a_position" | "aPosition" | "in_position")
}

/// The interface of a successfully linked program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LinkedProgram {
    pub attributes: Vec<(String, u32)>,
    /// Active uniforms; a uniform's location index is its position in this list.
    pub uniforms: Vec<(String, UniformKind)>,
    pub blocks: Vec<String>,
    pub position: Option<u32>,
    pub output: FragmentOutput,
}

impl LinkedProgram {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }

    pub fn uniform_index(&self, name: &str) -> Option<u32> {
        let name = strip_array_suffix(name);
        self.uniforms
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| i as u32)
    }
}

/// Assigns attribute locations and picks the fragment behaviour.
///
/// Explicit `bind_attrib_location` bindings win; remaining attributes take the lowest free
/// location in declaration order.
pub(crate) fn link(
    vertex: &ShaderInterface,
    fragment: &ShaderInterface,
    bindings: &BTreeMap<String, u32>,
) -> LinkedProgram {
    let mut attributes = Vec::with_capacity(vertex.attributes.len());
    let mut taken: Vec<u32> = vertex
        .attributes
        .iter()
        .filter_map(|name| bindings.get(name).copied())
        .collect();
    for name in &vertex.attributes {
        let location = match bindings.get(name) {
            Some(loc) => *loc,
            None => {
                let loc = (0..).find(|l| !taken.contains(l)).unwrap_or(0);
                taken.push(loc);
                loc
            }
        };
        attributes.push((name.clone(), location));
    }

    let mut uniforms = vertex.uniforms.clone();
    for (name, kind) in &fragment.uniforms {
        if !uniforms.iter().any(|(n, _)| n == name) {
            uniforms.push((name.clone(), *kind));
        }
    }
    let mut blocks = vertex.blocks.clone();
    for block in &fragment.blocks {
        if !blocks.contains(block) {
            blocks.push(block.clone());
        }
    }

    let position = attributes
        .iter()
        .find(|(name, _)| is_position_attribute(name))
        .or_else(|| attributes.first())
        .map(|(_, loc)| *loc);

    let index_of = |wanted: &str| uniforms.iter().position(|(n, _)| n == wanted).map(|i| i as u32);
    let output = if fragment.samples_texture {
        FragmentOutput::Texture {
            sampler: fragment
                .uniforms
                .iter()
                .find(|(_, kind)| *kind == UniformKind::Sampler)
                .and_then(|(name, _)| index_of(name)),
        }
    } else if let Some(index) = fragment
        .uniforms
        .iter()
        .find(|(_, kind)| *kind == UniformKind::Vec4)
        .and_then(|(name, _)| index_of(name))
    {
        FragmentOutput::Uniform(index)
    } else if let Some((_, loc)) = attributes
        .iter()
        .find(|(name, loc)| !is_position_attribute(name) && Some(*loc) != position)
    {
        FragmentOutput::Attribute(*loc)
    } else {
        FragmentOutput::Constant([255; 4])
    };

    LinkedProgram {
        attributes,
        uniforms,
        blocks,
        position,
        output,
    }
}
