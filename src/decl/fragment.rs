//! Declaration fragments and their unfolding into canonical entities.
//!
//! A fragment is either a bare block name (`"button"`, or a number) or an
//! object using the nested shorthand of deps files:
//!
//! ```json
//! { "block": "button", "elems": ["text", { "elem": "icon", "mods": { "size": ["s", "m"] } }] }
//! { "elem": "text" }
//! { "mods": { "disabled": true, "theme": "islands" } }
//! { "mod": "theme", "val": "islands", "tech": "css" }
//! ```
//!
//! Unfolding is a fixed two-level step: an owner (block or element), then a
//! modifier-name entity, then one entity per modifier value.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::core::{BemError, Entity, ModVal};

/// A single value or a list of values.
///
/// `Many` is tried first: derived struct impls also accept sequences, so
/// trying `One` first would read `["a", "b"]` positionally into one struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// List of values
    Many(Vec<T>),
    /// Bare value
    One(T),
}

impl<T> OneOrMany<T> {
    /// View as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Block name shorthand; numbers are accepted and stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockName(pub String);

impl<'de> Deserialize<'de> for BlockName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NameVisitor;

        impl Visitor<'_> for NameVisitor {
            type Value = BlockName;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a block name")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BlockName, E> {
                Ok(BlockName(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BlockName, E> {
                Ok(BlockName(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BlockName, E> {
                Ok(BlockName(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<BlockName, E> {
                Ok(BlockName(v.to_string()))
            }
        }

        deserializer.deserialize_any(NameVisitor)
    }
}

/// `mods` map in declaration order: modifier name to one or more values.
#[derive(Debug, Clone, Default)]
pub struct ModsSpec(pub Vec<(String, OneOrMany<ModVal>)>);

impl<'de> Deserialize<'de> for ModsSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModsVisitor;

        impl<'de> Visitor<'de> for ModsVisitor {
            type Value = ModsSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of modifier names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ModsSpec, A::Error> {
                let mut mods = Vec::new();
                while let Some((name, values)) = map.next_entry::<String, OneOrMany<ModVal>>()? {
                    mods.push((name, values));
                }
                Ok(ModsSpec(mods))
            }
        }

        deserializer.deserialize_map(ModsVisitor)
    }
}

/// Element entry inside `elems`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ElemSpec {
    /// Bare element name
    Name(BlockName),
    /// Element with modifiers
    Object {
        /// Element name
        elem: String,
        /// Element modifiers
        #[serde(default)]
        mods: Option<ModsSpec>,
    },
}

/// Object form of a fragment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentSpec {
    /// Block name; inherited from the context when absent.
    #[serde(default)]
    pub block: Option<String>,
    /// Single element.
    #[serde(default)]
    pub elem: Option<String>,
    /// Several elements of the block.
    #[serde(default)]
    pub elems: Option<OneOrMany<ElemSpec>>,
    /// Singular modifier name.
    #[serde(rename = "mod", default)]
    pub mod_name: Option<String>,
    /// Singular modifier value.
    #[serde(default)]
    pub val: Option<ModVal>,
    /// Several values of the singular modifier.
    #[serde(default)]
    pub vals: Option<Vec<ModVal>>,
    /// Modifier map.
    #[serde(default)]
    pub mods: Option<ModsSpec>,
    /// Technology scope.
    #[serde(default)]
    pub tech: Option<String>,
}

/// A declaration fragment as written in a declaration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DeclFragment {
    /// Block name shorthand
    Name(BlockName),
    /// Object form
    Object(Box<FragmentSpec>),
}

/// Scope a fragment is resolved in.
///
/// `context` is the entity the fragment was declared under; `tech` is the
/// statement-level technology (the `tech` key of a deps item).
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentScope<'a> {
    /// Entity owning the declaration
    pub context: Option<&'a Entity>,
    /// Statement-level tech
    pub tech: Option<&'a str>,
}

impl<'a> FragmentScope<'a> {
    /// Scope for fragments declared under `context`.
    pub fn under(context: &'a Entity) -> Self {
        Self {
            context: Some(context),
            tech: None,
        }
    }

    /// Same scope with a statement-level tech.
    #[must_use]
    pub fn with_tech(mut self, tech: Option<&'a str>) -> Self {
        self.tech = tech;
        self
    }

    fn default_tech(&self) -> Option<String> {
        self.tech.or_else(|| self.context.and_then(|c| c.tech.as_deref())).map(str::to_string)
    }
}

impl DeclFragment {
    /// A fragment naming a whole block.
    pub fn block(name: impl Into<String>) -> Self {
        Self::Name(BlockName(name.into()))
    }

    /// Unfold into ordered, deduplicated canonical entities.
    pub fn to_entities(&self, scope: FragmentScope<'_>) -> Result<Vec<Entity>, BemError> {
        let mut out = EntityList::default();
        match self {
            Self::Name(BlockName(name)) => {
                out.push(Entity::block(name.clone()).with_tech(scope.default_tech()));
            }
            Self::Object(spec) => unfold_spec(spec, scope, &mut out)?,
        }
        Ok(out.entities)
    }
}

/// Unfold a list of fragments, keeping first occurrences only.
pub fn unfold_all(
    fragments: &[DeclFragment],
    scope: FragmentScope<'_>,
) -> Result<Vec<Entity>, BemError> {
    let mut out = EntityList::default();
    for fragment in fragments {
        for entity in fragment.to_entities(scope)? {
            out.push(entity);
        }
    }
    Ok(out.entities)
}

#[derive(Default)]
struct EntityList {
    entities: Vec<Entity>,
    seen: HashSet<String>,
}

impl EntityList {
    fn push(&mut self, entity: Entity) {
        if self.seen.insert(entity.key()) {
            self.entities.push(entity);
        }
    }
}

fn unfold_spec(
    spec: &FragmentSpec,
    scope: FragmentScope<'_>,
    out: &mut EntityList,
) -> Result<(), BemError> {
    let block = match (&spec.block, scope.context) {
        (Some(block), _) => block.clone(),
        (None, Some(context)) => context.block.clone(),
        (None, None) => {
            return Err(BemError::InvalidFragment {
                reason: "fragment has no block and no context to inherit one from".to_string(),
            });
        }
    };

    if spec.elem.is_some() && spec.elems.is_some() {
        return Err(BemError::InvalidFragment {
            reason: format!("fragment for block '{block}' sets both elem and elems"),
        });
    }
    if spec.mod_name.is_none() && (spec.val.is_some() || spec.vals.is_some()) {
        return Err(BemError::InvalidFragment {
            reason: format!("fragment for block '{block}' sets a modifier value without mod"),
        });
    }

    let has_mods = spec.mod_name.is_some() || spec.mods.is_some();
    let inherits_elem =
        spec.block.is_none() && spec.elem.is_none() && spec.elems.is_none() && has_mods;
    let elem = spec.elem.clone().or_else(|| {
        if inherits_elem {
            scope.context.and_then(|c| c.elem.clone())
        } else {
            None
        }
    });

    let tech = spec.tech.clone().or_else(|| scope.default_tech());
    let owner = match elem {
        Some(elem) => Entity::elem(block.clone(), elem),
        None => Entity::block(block.clone()),
    }
    .with_tech(tech.clone());

    if let Some(mod_name) = &spec.mod_name {
        let values: Vec<ModVal> = match (&spec.val, &spec.vals) {
            (Some(val), _) => vec![val.clone()],
            (None, Some(vals)) => vals.clone(),
            (None, None) => vec![ModVal::Flag],
        };
        push_mod(&owner, mod_name, &values, out);
        return Ok(());
    }

    out.push(owner.clone());

    if let Some(mods) = &spec.mods {
        push_mods(&owner, mods, out);
    }

    if let Some(elems) = &spec.elems {
        for elem in elems.as_slice() {
            match elem {
                ElemSpec::Name(BlockName(name)) => {
                    out.push(Entity::elem(block.clone(), name.clone()).with_tech(tech.clone()));
                }
                ElemSpec::Object {
                    elem,
                    mods,
                } => {
                    let elem_owner = Entity::elem(block.clone(), elem.clone()).with_tech(tech.clone());
                    out.push(elem_owner.clone());
                    if let Some(mods) = mods {
                        push_mods(&elem_owner, mods, out);
                    }
                }
            }
        }
    }

    Ok(())
}

fn push_mods(owner: &Entity, mods: &ModsSpec, out: &mut EntityList) {
    for (name, values) in &mods.0 {
        push_mod(owner, name, values.as_slice(), out);
    }
}

fn push_mod(owner: &Entity, name: &str, values: &[ModVal], out: &mut EntityList) {
    out.push(owner.clone().with_mod_name(name));
    for value in values {
        out.push(owner.clone().with_mod(name, value.clone()));
    }
}
