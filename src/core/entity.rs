//! Canonical BEM entity identity.
//!
//! An [`Entity`] names a single BEM artifact: a block, an element of a block,
//! or a modifier (name, or name plus value) of either, optionally scoped to a
//! technology. Entities are the node keys of the dependency graph, so equality
//! and hashing follow the canonical string key:
//!
//! ```text
//! block[__elem][_modName[_modVal]][.tech]
//! ```
//!
//! # Examples
//!
//! ```
//! use bemdeps::core::{Entity, ModVal};
//!
//! let entity = Entity::block("button").with_mod("theme", ModVal::value("islands"));
//! assert_eq!(entity.key(), "button_theme_islands");
//!
//! let parsed: Entity = "button__text_size_m.css".parse().unwrap();
//! assert_eq!(parsed.elem.as_deref(), Some("text"));
//! assert_eq!(parsed.tech.as_deref(), Some("css"));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::error::BemError;

/// Separator between a block and its element.
pub const ELEM_DELIM: &str = "__";
/// Separator before a modifier name and before a modifier value.
pub const MOD_DELIM: &str = "_";

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^_.]+)(?:__([^_.]+))?(?:_([^_.]+)(?:_([^_.]+))?)?(?:\.(.+))?$")
        .expect("entity key pattern is valid")
});

/// Value of a modifier.
///
/// Boolean modifiers (`{ disabled: true }`) carry [`ModVal::Flag`], which renders
/// as `true` in keys and serializes as the JSON boolean `true`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModVal {
    /// Presence-only modifier.
    Flag,
    /// Modifier with an explicit value.
    Value(String),
}

impl ModVal {
    /// Create a valued modifier.
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    /// String form used inside entity keys.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flag => "true",
            Self::Value(value) => value,
        }
    }
}

impl fmt::Display for ModVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModVal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flag => serializer.serialize_bool(true),
            Self::Value(value) => serializer.serialize_str(value),
        }
    }
}

impl<'de> Deserialize<'de> for ModVal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModValVisitor;

        impl Visitor<'_> for ModValVisitor {
            type Value = ModVal;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a modifier value (string, number or `true`)")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<ModVal, E> {
                if v {
                    Ok(ModVal::Flag)
                } else {
                    Err(E::custom("modifier value `false` is not allowed"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ModVal, E> {
                Ok(ModVal::Value(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ModVal, E> {
                Ok(ModVal::Value(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ModVal, E> {
                Ok(ModVal::Value(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ModVal, E> {
                Ok(ModVal::Value(v.to_string()))
            }
        }

        deserializer.deserialize_any(ModValVisitor)
    }
}

/// A unique BEM artifact.
///
/// Two entities are the same node iff their [`key`](Entity::key) is equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Block name.
    pub block: String,
    /// Element name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem: Option<String>,
    /// Modifier name.
    #[serde(rename = "mod", default, skip_serializing_if = "Option::is_none")]
    pub mod_name: Option<String>,
    /// Modifier value; only meaningful together with `mod_name`.
    #[serde(rename = "val", default, skip_serializing_if = "Option::is_none")]
    pub mod_val: Option<ModVal>,
    /// Technology scope, e.g. `css` or `js`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<String>,
}

impl Entity {
    /// A block entity.
    pub fn block(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            elem: None,
            mod_name: None,
            mod_val: None,
            tech: None,
        }
    }

    /// An element entity.
    pub fn elem(block: impl Into<String>, elem: impl Into<String>) -> Self {
        Self {
            elem: Some(elem.into()),
            ..Self::block(block)
        }
    }

    /// Return a copy carrying the modifier name and value.
    #[must_use]
    pub fn with_mod(mut self, name: impl Into<String>, val: ModVal) -> Self {
        self.mod_name = Some(name.into());
        self.mod_val = Some(val);
        self
    }

    /// Return a copy carrying only the modifier name.
    #[must_use]
    pub fn with_mod_name(mut self, name: impl Into<String>) -> Self {
        self.mod_name = Some(name.into());
        self.mod_val = None;
        self
    }

    /// Return a copy scoped to `tech`.
    #[must_use]
    pub fn with_tech(mut self, tech: Option<String>) -> Self {
        self.tech = tech;
        self
    }

    /// The owning block or element, with modifiers and tech stripped.
    #[must_use]
    pub fn owner(&self) -> Self {
        Self {
            block: self.block.clone(),
            elem: self.elem.clone(),
            mod_name: None,
            mod_val: None,
            tech: None,
        }
    }

    /// Canonical key without the tech suffix.
    pub fn name(&self) -> String {
        let mut name = self.block.clone();
        if let Some(elem) = &self.elem {
            name.push_str(ELEM_DELIM);
            name.push_str(elem);
        }
        if let Some(mod_name) = &self.mod_name {
            name.push_str(MOD_DELIM);
            name.push_str(mod_name);
            if let Some(val) = &self.mod_val {
                name.push_str(MOD_DELIM);
                name.push_str(val.as_str());
            }
        }
        name
    }

    /// Canonical key, `block[__elem][_modName[_modVal]][.tech]`.
    pub fn key(&self) -> String {
        match &self.tech {
            Some(tech) => format!("{}.{tech}", self.name()),
            None => self.name(),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Entity {
    type Err = BemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = KEY_PATTERN.captures(s).ok_or_else(|| BemError::InvalidFragment {
            reason: format!("'{s}' is not a valid entity key"),
        })?;
        let text = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        Ok(Self {
            block: caps[1].to_string(),
            elem: text(2),
            mod_name: text(3),
            mod_val: text(4).map(|v| if v == "true" { ModVal::Flag } else { ModVal::Value(v) }),
            tech: text(5),
        })
    }
}
