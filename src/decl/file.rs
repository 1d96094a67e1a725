//! Per-entity declaration files.
//!
//! A declaration file (`button.deps.json`, `button.deps.yaml`) holds one item
//! or an array of items. Each item scopes its statements with an optional
//! `tech` and may retarget the owning entity with `block`/`elem`/`mod`/`val`:
//!
//! ```json
//! [
//!   { "mustDeps": ["i-bem"], "shouldDeps": { "elems": ["text", "icon"] } },
//!   { "tech": "js", "mustDeps": { "block": "i-bem", "tech": "bemhtml" } },
//!   { "noDeps": "legacy-reset" }
//! ]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::fragment::{DeclFragment, FragmentScope, ModsSpec, OneOrMany, unfold_all};
use crate::core::{BemError, Entity, ModVal};

/// One item of a declaration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DeclItem {
    /// Tech the statements of this item apply to
    #[serde(default)]
    pub tech: Option<String>,
    /// Retarget the owning block
    #[serde(default)]
    pub block: Option<String>,
    /// Retarget the owning element
    #[serde(default)]
    pub elem: Option<String>,
    /// Retarget the owning modifier
    #[serde(rename = "mod", default)]
    pub mod_name: Option<String>,
    /// Retarget the owning modifier value
    #[serde(default)]
    pub val: Option<ModVal>,
    /// Several values of `mod`; statements apply to each
    #[serde(default)]
    pub vals: Option<OneOrMany<ModVal>>,
    /// Several modifiers; statements apply to each value of each
    #[serde(default)]
    pub mods: Option<ModsSpec>,
    /// Hard, order-sensitive dependencies
    #[serde(default)]
    pub must_deps: Option<OneOrMany<DeclFragment>>,
    /// Soft dependencies
    #[serde(default)]
    pub should_deps: Option<OneOrMany<DeclFragment>>,
    /// Edges to remove from the owner
    #[serde(default)]
    pub no_deps: Option<OneOrMany<DeclFragment>>,
}

/// Statements of one item, resolved against the owning entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    /// Entity the statements attach to
    pub context: Entity,
    /// Must-dependency targets in declared order
    pub must: Vec<Entity>,
    /// Should-dependency targets in declared order
    pub should: Vec<Entity>,
    /// Edges to remove
    pub no: Vec<Entity>,
}

impl DeclItem {
    /// The entities this item's statements attach to.
    ///
    /// Setting `block` resets the element and modifier of `owner`; setting
    /// `elem` resets the modifier. `vals` and `mods` fan out into one context
    /// per modifier value.
    pub fn contexts(&self, owner: &Entity) -> Result<Vec<Entity>, BemError> {
        let invalid = |reason: &str| BemError::InvalidFragment {
            reason: format!("item under '{owner}' {reason}"),
        };
        if (self.val.is_some() || self.vals.is_some()) && self.mod_name.is_none() {
            return Err(invalid("sets val without mod"));
        }
        if self.val.is_some() && self.vals.is_some() {
            return Err(invalid("sets both val and vals"));
        }
        if self.mod_name.is_some() && self.mods.is_some() {
            return Err(invalid("sets both mod and mods"));
        }

        let mut base = owner.clone();
        if let Some(block) = &self.block {
            base = Entity::block(block.clone()).with_tech(owner.tech.clone());
        }
        if let Some(elem) = &self.elem {
            base.elem = Some(elem.clone());
        }
        if self.block.is_some() || self.elem.is_some() {
            base.mod_name = None;
            base.mod_val = None;
        }

        let contexts = match (&self.mod_name, &self.mods) {
            (Some(mod_name), _) => match &self.vals {
                Some(vals) => vals
                    .as_slice()
                    .iter()
                    .map(|val| base.clone().with_mod(mod_name.clone(), val.clone()))
                    .collect(),
                None => {
                    let mut context = base.with_mod_name(mod_name.clone());
                    context.mod_val = self.val.clone();
                    vec![context]
                }
            },
            (None, Some(mods)) => {
                let mut contexts = Vec::new();
                for (name, vals) in &mods.0 {
                    for val in vals.as_slice() {
                        contexts.push(base.clone().with_mod(name.clone(), val.clone()));
                    }
                }
                contexts
            }
            (None, None) => vec![base],
        };
        Ok(contexts)
    }

    /// Resolve every statement of this item under `owner`, once per context.
    pub fn resolve(&self, owner: &Entity) -> Result<Vec<ResolvedItem>, BemError> {
        let mut resolved = Vec::new();
        for context in self.contexts(owner)? {
            let scope = FragmentScope::under(&context).with_tech(self.tech.as_deref());
            let unfold = |fragments: &Option<OneOrMany<DeclFragment>>| match fragments {
                Some(fragments) => unfold_all(fragments.as_slice(), scope),
                None => Ok(Vec::new()),
            };
            let must = unfold(&self.must_deps)?;
            let should = unfold(&self.should_deps)?;
            let no = unfold(&self.no_deps)?;
            resolved.push(ResolvedItem {
                context,
                must,
                should,
                no,
            });
        }
        Ok(resolved)
    }
}

/// A parsed declaration file.
#[derive(Debug, Clone)]
pub struct DeclFile {
    /// Where the file was read from
    pub path: PathBuf,
    /// Items in source order
    pub items: Vec<DeclItem>,
}

/// Serialization format of a declaration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclFormat {
    /// JSON (`.json` and anything unrecognized)
    Json,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
}

impl DeclFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl DeclFile {
    /// Build a file from already-parsed items.
    pub fn new(path: impl Into<PathBuf>, items: Vec<DeclItem>) -> Self {
        Self {
            path: path.into(),
            items,
        }
    }

    /// Parse raw file content; the format follows the file extension.
    ///
    /// Whitespace-only content is an empty declaration.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, BemError> {
        let path = path.into();
        if content.trim().is_empty() {
            return Ok(Self::new(path, Vec::new()));
        }

        // Parse the document first and the items second, so a bad item
        // reports serde's own message instead of a failed untagged match.
        let parsed = match DeclFormat::from_path(&path) {
            DeclFormat::Json => parse_json(content),
            DeclFormat::Yaml => parse_yaml(content),
        };

        parsed
            .map(|items| Self::new(path.clone(), items))
            .map_err(|reason| BemError::DeclParse {
                path: path.display().to_string(),
                reason,
            })
    }

    /// Resolve all items under `owner`, naming this file on failure.
    pub fn resolve(&self, owner: &Entity) -> Result<Vec<ResolvedItem>, BemError> {
        let mut resolved = Vec::new();
        for item in &self.items {
            let items = item.resolve(owner).map_err(|e| BemError::DeclParse {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
            resolved.extend(items);
        }
        Ok(resolved)
    }
}

fn parse_json(content: &str) -> Result<Vec<DeclItem>, String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let items = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|item| vec![item])
    };
    items.map_err(|e| e.to_string())
}

fn parse_yaml(content: &str) -> Result<Vec<DeclItem>, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    let items = if value.is_sequence() {
        serde_yaml::from_value(value)
    } else {
        serde_yaml::from_value(value).map(|item| vec![item])
    };
    items.map_err(|e| e.to_string())
}
