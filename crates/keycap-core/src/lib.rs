#![forbid(unsafe_code)]

//! Keycap label markup: parser, node model, caches and geometry (headless).
//!
//! A label is a short markup string assigned to one slot of a key face. This crate turns it into
//! a typed node tree ([`Node`]) and provides the building blocks the renderer shares:
//! - [`markup::parse`] and its plain-text helpers
//! - [`LruCache`] and the memoizing [`ParseCache`]
//! - rotation/mirror math in [`geom`]
//! - [`LabelConfig`]

pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod geom;
pub mod markup;
pub mod model;
pub mod parse_cache;

pub use cache::{CacheStats, LruCache};
pub use config::LabelConfig;
pub use error::{Error, Result};
pub use markup::{has_formatting, parse, plain_text, single_media, strip_formatting_tags};
pub use model::{ListItem, Node, NodeKind, Style};
pub use parse_cache::ParseCache;

#[cfg(test)]
mod tests;
