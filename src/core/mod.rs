//! Core types for bemdeps
//!
//! - [`entity`] - canonical [`Entity`] identity used as the graph node key
//! - [`error`] - [`BemError`], [`ErrorContext`] and [`user_friendly_error`]
//!
//! # Examples
//!
//! ```rust
//! use bemdeps::core::{BemError, Entity, user_friendly_error};
//!
//! let entity: Entity = "page__header".parse().unwrap();
//! assert_eq!(entity.block, "page");
//!
//! let ctx = user_friendly_error(BemError::LevelNotFound {
//!     path: "blocks".to_string(),
//! }.into());
//! assert!(ctx.suggestion.is_some());
//! ```

pub mod entity;
pub mod error;

pub use entity::{Entity, ModVal};
pub use error::{BemError, ErrorContext, user_friendly_error};
