// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-character formatting.
//!
//! Every distinct combination of styles and entity is allocated once and
//! shared by all characters that carry it, so comparing two characters'
//! metadata is usually a pointer comparison. The pool only holds weak
//! references: a combination no longer used by any character is dropped,
//! and its entry is pruned once the pool has doubled in size.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use once_cell::sync::Lazy;
use strum_macros::EnumString;

use crate::EntityKey;

/// An inline style applied to a single character.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    #[strum(default)]
    Custom(String),
}

impl InlineStyle {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bold => "BOLD",
            Self::Italic => "ITALIC",
            Self::Underline => "UNDERLINE",
            Self::Strikethrough => "STRIKETHROUGH",
            Self::Code => "CODE",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct MetadataConfig {
    style: BTreeSet<InlineStyle>,
    entity: Option<EntityKey>,
}

const MIN_PRUNE_LEN: usize = 64;

struct Pool {
    entries: HashMap<MetadataConfig, Weak<MetadataConfig>>,
    prune_at: usize,
}

impl Pool {
    fn prune(&mut self) {
        self.entries.retain(|_, shared| shared.strong_count() > 0);
        self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_LEN);
    }
}

static POOL: Lazy<Mutex<Pool>> = Lazy::new(|| {
    Mutex::new(Pool {
        entries: HashMap::new(),
        prune_at: MIN_PRUNE_LEN,
    })
});

static EMPTY: Lazy<CharacterMetadata> =
    Lazy::new(|| CharacterMetadata::intern(MetadataConfig::default()));

/// The style set and entity reference of one character.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CharacterMetadata(Arc<MetadataConfig>);

impl CharacterMetadata {
    /// Unstyled metadata with no entity.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn create(
        style: impl IntoIterator<Item = InlineStyle>,
        entity: Option<EntityKey>,
    ) -> Self {
        Self::intern(MetadataConfig {
            style: style.into_iter().collect(),
            entity,
        })
    }

    fn intern(config: MetadataConfig) -> Self {
        let mut pool = POOL.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = pool.entries.get(&config).and_then(Weak::upgrade)
        {
            return Self(existing);
        }
        if pool.entries.len() >= pool.prune_at {
            pool.prune();
        }
        let shared = Arc::new(config.clone());
        pool.entries.insert(config, Arc::downgrade(&shared));
        Self(shared)
    }

    pub fn style(&self) -> &BTreeSet<InlineStyle> {
        &self.0.style
    }

    pub fn entity(&self) -> Option<EntityKey> {
        self.0.entity
    }

    pub fn has_style(&self, style: &InlineStyle) -> bool {
        self.0.style.contains(style)
    }

    pub fn apply_style(&self, style: InlineStyle) -> Self {
        if self.has_style(&style) {
            return self.clone();
        }
        let mut config = (*self.0).clone();
        config.style.insert(style);
        Self::intern(config)
    }

    pub fn remove_style(&self, style: &InlineStyle) -> Self {
        if !self.has_style(style) {
            return self.clone();
        }
        let mut config = (*self.0).clone();
        config.style.remove(style);
        Self::intern(config)
    }

    pub fn apply_entity(&self, entity: Option<EntityKey>) -> Self {
        if self.0.entity == entity {
            return self.clone();
        }
        let mut config = (*self.0).clone();
        config.entity = entity;
        Self::intern(config)
    }

    /// Whether both values are the same pooled allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for CharacterMetadata {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use speculoos::prelude::*;

    use std::sync::{Arc, PoisonError};

    use super::{CharacterMetadata, InlineStyle, POOL};
    use crate::EntityKey;

    #[test]
    fn equal_metadata_is_shared() {
        let a = CharacterMetadata::create([InlineStyle::Bold], None);
        let b = CharacterMetadata::empty().apply_style(InlineStyle::Bold);
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn unused_metadata_is_released() {
        let meta = CharacterMetadata::create(
            [InlineStyle::Custom("RELEASED".to_owned())],
            Some(EntityKey::from(u64::MAX)),
        );
        let weak = Arc::downgrade(&meta.0);
        drop(meta);
        assert_that!(weak.upgrade()).is_none();
    }

    #[test]
    fn pool_does_not_grow_with_discarded_entities() {
        for key in 1_000_000..1_010_000 {
            CharacterMetadata::empty().apply_entity(Some(EntityKey::from(key)));
        }
        let len = POOL
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len();
        assert_that!(len).is_less_than(1_000);
    }

    #[test]
    fn removing_the_last_style_returns_to_empty() {
        let bold = CharacterMetadata::empty().apply_style(InlineStyle::Bold);
        let plain = bold.remove_style(&InlineStyle::Bold);
        assert!(plain.ptr_eq(&CharacterMetadata::empty()));
    }

    #[test]
    fn applying_an_entity_keeps_styles() {
        let meta = CharacterMetadata::create([InlineStyle::Italic], None)
            .apply_entity(Some(EntityKey::from(3)));
        assert_that!(meta.has_style(&InlineStyle::Italic)).is_true();
        assert_that!(meta.entity()).is_equal_to(Some(EntityKey::from(3)));
    }

    #[test]
    fn styles_parse_from_their_names() {
        assert_eq!(InlineStyle::from_str("BOLD"), Ok(InlineStyle::Bold));
        assert_eq!(
            InlineStyle::from_str("HIGHLIGHT"),
            Ok(InlineStyle::Custom("HIGHLIGHT".to_owned()))
        );
        assert_eq!(InlineStyle::Strikethrough.to_string(), "STRIKETHROUGH");
    }
}
