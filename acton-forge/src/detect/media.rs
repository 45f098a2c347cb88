//! Attached-media collection detection
//!
//! Media fields come from `register_media_collections` inside an
//! `impl HasMedia for Entity` block. Each statement registering a collection
//! yields one field:
//!
//! ```rust,ignore
//! impl HasMedia for Invoice {
//!     fn register_media_collections(&mut self) {
//!         self.add_media_collection("attachments");
//!         self.add_media_collection("logo").single_file().accepts_mime_types(&["image/png"]);
//!     }
//! }
//! ```

use quote::ToTokens;
use regex::Regex;
use std::sync::OnceLock;

use super::source::{string_literals, SourceFile};
use super::{MediaCardinality, MediaField, MimeCategory};
use crate::naming::Naming;

/// Traits marking an entity as carrying media
pub const MEDIA_TRAITS: &[&str] = &["HasMedia", "InteractsWithMedia"];

fn collection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"add_media_collection\s*\(\s*"([^"]+)"\s*\)"#).unwrap_or_else(|_| unreachable!())
    })
}

fn single_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bsingle_file\s*\(").unwrap_or_else(|_| unreachable!()))
}

fn mime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"accepts_mime_types\s*\(([^)]*)\)").unwrap_or_else(|_| unreachable!())
    })
}

/// Whether the entity implements a media trait
#[must_use]
pub fn has_media(source: &SourceFile, entity: &str) -> bool {
    source.trait_impl(entity, MEDIA_TRAITS).is_some()
}

/// Media fields registered by the entity, in registration order
#[must_use]
pub fn media_fields(source: &SourceFile, entity: &str) -> Vec<MediaField> {
    let Some(item) = source.trait_impl(entity, MEDIA_TRAITS) else {
        return Vec::new();
    };
    let Some(register) = item.items.iter().find_map(|item| match item {
        syn::ImplItem::Fn(function) if function.sig.ident == "register_media_collections" => {
            Some(function)
        }
        _ => None,
    }) else {
        return Vec::new();
    };

    register
        .block
        .stmts
        .iter()
        .filter_map(|stmt| field_from_statement(&stmt.to_token_stream().to_string()))
        .collect()
}

fn field_from_statement(tokens: &str) -> Option<MediaField> {
    let collection = collection_pattern().captures(tokens)?[1].to_string();

    let cardinality = if single_file_pattern().is_match(tokens) {
        MediaCardinality::Single
    } else {
        MediaCardinality::Multiple
    };

    let mime = mime_pattern()
        .captures(tokens)
        .and_then(|capture| {
            string_literals(&capture[1])
                .iter()
                .find_map(|mime| MimeCategory::from_mime(mime))
        })
        .or_else(|| MimeCategory::from_collection_name(&collection));

    Some(MediaField {
        name: Naming::to_field_name(&collection),
        collection,
        cardinality,
        mime,
    })
}
