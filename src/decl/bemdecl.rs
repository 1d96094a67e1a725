//! Bundle declarations: the tree-shaped `bemdecl` format and the flat `deps`
//! format.
//!
//! ```json
//! { "blocks": [{ "name": "page", "elems": [{ "name": "header" }], "mods": [{ "name": "theme", "vals": ["dark"] }] }] }
//! { "deps": ["page", { "block": "page", "elem": "header" }] }
//! ["page", { "block": "page", "elem": "header" }]
//! ```
//!
//! Both flatten into the ordered entity list that seeds the root of a
//! resolution; [`bemdecl_from_entities`] folds a flat list back into a tree.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::file::DeclFormat;
use super::fragment::{DeclFragment, FragmentScope, OneOrMany, unfold_all};
use crate::core::{BemError, Entity, ModVal};

/// A modifier value entry of a bemdecl modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BemDeclVal {
    /// `{ "name": "dark" }`
    Named {
        /// The value
        name: ModVal,
    },
    /// `"dark"` or `true`
    Bare(ModVal),
}

impl BemDeclVal {
    fn value(&self) -> &ModVal {
        match self {
            Self::Named {
                name,
            }
            | Self::Bare(name) => name,
        }
    }
}

/// Modifier of a bemdecl block or element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BemDeclMod {
    /// Modifier name
    pub name: String,
    /// Values; none means a presence-only modifier
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vals: Vec<BemDeclVal>,
}

/// Element of a bemdecl block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BemDeclElem {
    /// Element name
    pub name: String,
    /// Element modifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mods: Vec<BemDeclMod>,
}

/// Block of a bemdecl tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BemDeclBlock {
    /// Block name
    pub name: String,
    /// Block modifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mods: Vec<BemDeclMod>,
    /// Block elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elems: Vec<BemDeclElem>,
}

/// A bundle declaration in either supported shape.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// Flat list of fragments
    Deps(Vec<DeclFragment>),
    /// Nested block tree
    BemDecl(Vec<BemDeclBlock>),
}

impl Declaration {
    /// Parse a declaration file; JSON unless the extension says YAML.
    pub fn parse(path: &Path, content: &str) -> Result<Self, BemError> {
        let fail = |reason: String| BemError::DeclParse {
            path: path.display().to_string(),
            reason,
        };

        let value: serde_json::Value = match DeclFormat::from_path(path) {
            DeclFormat::Json => serde_json::from_str(content).map_err(|e| fail(e.to_string()))?,
            DeclFormat::Yaml => serde_yaml::from_str(content).map_err(|e| fail(e.to_string()))?,
        };

        let parsed = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value).map(Self::Deps),
            serde_json::Value::Object(mut map) => {
                if let Some(blocks) = map.remove("blocks") {
                    serde_json::from_value(blocks).map(Self::BemDecl)
                } else if let Some(deps) = map.remove("deps") {
                    serde_json::from_value::<OneOrMany<DeclFragment>>(deps)
                        .map(|deps| Self::Deps(deps.as_slice().to_vec()))
                } else {
                    return Err(fail(
                        "not a bemdecl or deps declaration: expected `blocks` or `deps`".into(),
                    ));
                }
            }
            _ => {
                return Err(fail(
                    "not a bemdecl or deps declaration: expected an array or an object".into(),
                ));
            }
        };
        parsed.map_err(|e| fail(e.to_string()))
    }

    /// A declaration listing the given entities.
    pub fn from_entities(entities: &[Entity]) -> Self {
        Self::BemDecl(bemdecl_from_entities(entities))
    }

    /// Flatten into ordered, unique entities.
    pub fn to_entities(&self) -> Result<Vec<Entity>, BemError> {
        match self {
            Self::Deps(fragments) => unfold_all(fragments, FragmentScope::default()),
            Self::BemDecl(blocks) => {
                let mut seen = std::collections::HashSet::new();
                let mut out = Vec::new();
                for block in blocks {
                    for entity in block_entities(block) {
                        if seen.insert(entity.key()) {
                            out.push(entity);
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

fn block_entities(block: &BemDeclBlock) -> Vec<Entity> {
    let owner = Entity::block(block.name.clone());
    let mut out = vec![owner.clone()];
    push_mods(&owner, &block.mods, &mut out);
    for elem in &block.elems {
        let elem_owner = Entity::elem(block.name.clone(), elem.name.clone());
        out.push(elem_owner.clone());
        push_mods(&elem_owner, &elem.mods, &mut out);
    }
    out
}

fn push_mods(owner: &Entity, mods: &[BemDeclMod], out: &mut Vec<Entity>) {
    for m in mods {
        out.push(owner.clone().with_mod_name(m.name.clone()));
        if m.vals.is_empty() {
            out.push(owner.clone().with_mod(m.name.clone(), ModVal::Flag));
        }
        for val in &m.vals {
            out.push(owner.clone().with_mod(m.name.clone(), val.value().clone()));
        }
    }
}

/// Fold a flat entity list into a bemdecl tree.
///
/// Blocks, elements, modifiers and values keep first-appearance order; tech
/// scopes are dropped.
pub fn bemdecl_from_entities(entities: &[Entity]) -> Vec<BemDeclBlock> {
    let mut blocks: Vec<BemDeclBlock> = Vec::new();

    for entity in entities {
        let index = match blocks.iter().position(|b| b.name == entity.block) {
            Some(index) => index,
            None => {
                blocks.push(BemDeclBlock {
                    name: entity.block.clone(),
                    mods: Vec::new(),
                    elems: Vec::new(),
                });
                blocks.len() - 1
            }
        };
        let block = &mut blocks[index];

        let mods = match &entity.elem {
            Some(elem_name) => {
                let elem_index = match block.elems.iter().position(|e| &e.name == elem_name) {
                    Some(i) => i,
                    None => {
                        block.elems.push(BemDeclElem {
                            name: elem_name.clone(),
                            mods: Vec::new(),
                        });
                        block.elems.len() - 1
                    }
                };
                &mut block.elems[elem_index].mods
            }
            None => &mut block.mods,
        };

        if let Some(mod_name) = &entity.mod_name {
            let mod_index = match mods.iter().position(|m| &m.name == mod_name) {
                Some(i) => i,
                None => {
                    mods.push(BemDeclMod {
                        name: mod_name.clone(),
                        vals: Vec::new(),
                    });
                    mods.len() - 1
                }
            };
            if let Some(val) = &entity.mod_val {
                let vals = &mut mods[mod_index].vals;
                if !vals.iter().any(|v| v.value() == val) {
                    vals.push(BemDeclVal::Named {
                        name: val.clone(),
                    });
                }
            }
        }
    }

    blocks
}
