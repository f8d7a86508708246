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

//! Entities: out-of-band annotations such as link targets, referenced from
//! character metadata by key.
//!
//! The [`EntityRegistry`] belongs to an editor session. Content states hold a
//! handle on it and every snapshot of the session sees the same entities.
//! Entities are only ever added or have their data changed; they are never
//! removed.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::trace;

use crate::ContentError;

/// Key of an entity within its registry. Keys increase monotonically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(u64);

impl EntityKey {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Link,
    Token,
    Photo,
    Image,
    Mention,
    #[strum(default)]
    Custom(String),
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Link => "LINK",
            Self::Token => "TOKEN",
            Self::Photo => "PHOTO",
            Self::Image => "IMAGE",
            Self::Mention => "MENTION",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How text covered by an entity behaves when edited.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutability {
    /// Text can be changed freely; the entity stays attached.
    Mutable,
    /// Any edit removes the entity from the whole range.
    Immutable,
    /// Edits remove the entity from the affected word-like segment only.
    Segmented,
}

/// Opaque entity payload. Merging is shallow: a top-level key present in
/// the update replaces the stored value whole, nested objects included.
pub type EntityData = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityInstance {
    entity_type: EntityType,
    mutability: Mutability,
    data: EntityData,
}

impl EntityInstance {
    pub fn new(
        entity_type: EntityType,
        mutability: Mutability,
        data: EntityData,
    ) -> Self {
        Self {
            entity_type,
            mutability,
            data,
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn data(&self) -> &EntityData {
        &self.data
    }

    fn merge_data(&mut self, partial: EntityData) {
        self.data.extend(partial);
    }

    fn replace_data(&mut self, data: EntityData) {
        self.data = data;
    }
}

#[derive(Debug, Default)]
struct EntityStore {
    instances: IndexMap<EntityKey, EntityInstance>,
    next_key: u64,
}

impl EntityStore {
    fn add(&mut self, instance: EntityInstance) -> EntityKey {
        self.next_key += 1;
        let key = EntityKey(self.next_key);
        self.instances.insert(key, instance);
        key
    }

    fn get_mut(
        &mut self,
        key: EntityKey,
    ) -> Result<&mut EntityInstance, ContentError> {
        self.instances
            .get_mut(&key)
            .ok_or(ContentError::EntityNotFound(key))
    }
}

/// Shared handle on a session's entities.
///
/// Cloning the handle does not copy the entities. Writers must be
/// serialised by the caller: one edit transaction at a time.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    store: Arc<RwLock<EntityStore>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, EntityStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntityStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(
        &self,
        entity_type: EntityType,
        mutability: Mutability,
        data: EntityData,
    ) -> EntityKey {
        self.add(EntityInstance::new(entity_type, mutability, data))
    }

    pub fn add(&self, instance: EntityInstance) -> EntityKey {
        let key = self.write().add(instance);
        trace!(%key, "created entity");
        key
    }

    /// A copy of the entity stored under `key`.
    pub fn get(&self, key: EntityKey) -> Result<EntityInstance, ContentError> {
        self.read()
            .instances
            .get(&key)
            .cloned()
            .ok_or(ContentError::EntityNotFound(key))
    }

    pub fn merge_data(
        &self,
        key: EntityKey,
        partial: EntityData,
    ) -> Result<(), ContentError> {
        self.write().get_mut(key)?.merge_data(partial);
        trace!(%key, "merged entity data");
        Ok(())
    }

    pub fn replace_data(
        &self,
        key: EntityKey,
        data: EntityData,
    ) -> Result<(), ContentError> {
        self.write().get_mut(key)?.replace_data(data);
        trace!(%key, "replaced entity data");
        Ok(())
    }

    pub fn last_created_key(&self) -> Option<EntityKey> {
        self.read().instances.last().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.read().instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }
}

impl PartialEq for EntityRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRegistry {}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;
    use speculoos::prelude::*;
    use strum::IntoEnumIterator;

    use super::*;

    fn object(value: Value) -> EntityData {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn link(url: &str) -> EntityData {
        object(json!({ "url": url }))
    }

    #[test]
    fn keys_increase_monotonically() {
        let registry = EntityRegistry::new();
        let first =
            registry.create(EntityType::Link, Mutability::Mutable, link("a"));
        let second =
            registry.create(EntityType::Token, Mutability::Immutable, link("b"));
        assert!(first < second);
        assert_eq!(registry.last_created_key(), Some(second));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn merge_is_shallow_and_replace_is_total() {
        let registry = EntityRegistry::new();
        let key = registry.create(
            EntityType::Mention,
            Mutability::Immutable,
            object(json!({
                "url": "https://matrix.to/#/@alice:matrix.org",
                "title": "Alice",
                "user": { "id": "@alice:matrix.org", "avatar": "mxc://a" },
            })),
        );

        registry
            .merge_data(
                key,
                object(json!({ "width": 48, "user": { "id": "@bob:matrix.org" } })),
            )
            .unwrap();
        let merged = registry.get(key).unwrap();
        assert_eq!(merged.data().get("title"), Some(&json!("Alice")));
        assert_eq!(merged.data().get("width"), Some(&json!(48)));
        assert_eq!(
            merged.data().get("user"),
            Some(&json!({ "id": "@bob:matrix.org" }))
        );

        registry.replace_data(key, link("https://c")).unwrap();
        let replaced = registry.get(key).unwrap();
        assert_that!(replaced.data().len()).is_equal_to(1);
        assert_eq!(replaced.data().get("url"), Some(&json!("https://c")));
    }

    #[test]
    fn unknown_keys_are_errors() {
        let registry = EntityRegistry::new();
        let missing = EntityKey::from(42);
        assert_eq!(
            registry.merge_data(missing, EntityData::new()),
            Err(ContentError::EntityNotFound(missing))
        );
        assert_eq!(
            registry.replace_data(missing, EntityData::new()),
            Err(ContentError::EntityNotFound(missing))
        );
        assert_that!(registry.get(missing)).is_err();
    }

    #[test]
    fn cloned_handles_share_entities() {
        let registry = EntityRegistry::new();
        let other = registry.clone();
        let key =
            other.create(EntityType::Mention, Mutability::Immutable, link("u"));
        assert_eq!(registry.get(key).unwrap().entity_type(), &EntityType::Mention);
        assert_eq!(registry, other);
        assert_ne!(registry, EntityRegistry::new());
    }

    #[test]
    fn mutability_round_trips_through_strings() {
        assert_eq!(Mutability::Segmented.to_string(), "SEGMENTED");
        for mutability in Mutability::iter() {
            assert_eq!(
                Mutability::from_str(&mutability.to_string()),
                Ok(mutability)
            );
        }
        assert_eq!(
            EntityType::from_str("EMOJI"),
            Ok(EntityType::Custom("EMOJI".to_owned()))
        );
    }
}
