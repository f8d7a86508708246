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

//! The document snapshot.

use crate::plain_text::blocks_from_text;
use crate::{
    remove_range_from_content_state, Block, BlockKey, BlockMap, ContentError,
    EntityData, EntityInstance, EntityKey, EntityRegistry, EntityType,
    FromTextOptions, Mutability, SelectionState,
};

/// One immutable snapshot of a document.
///
/// Holds the blocks, a handle on the session's entity registry and the
/// selections before and after the edit that produced this snapshot.
/// Edits return a new `ContentState` that shares unchanged blocks with
/// this one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentState {
    block_map: BlockMap,
    entity_map: EntityRegistry,
    selection_before: SelectionState,
    selection_after: SelectionState,
}

impl ContentState {
    /// Build a snapshot from blocks in document order. A fresh registry is
    /// created when `entity_map` is `None`.
    pub fn create_from_block_array(
        blocks: impl IntoIterator<Item = Block>,
        entity_map: Option<EntityRegistry>,
    ) -> Result<Self, ContentError> {
        let block_map = BlockMap::from_blocks(blocks)?;
        let first_key = block_map
            .first()
            .map(|block| block.key().clone())
            .ok_or(ContentError::EmptyDocument)?;
        let selection = SelectionState::create_empty(first_key);
        Ok(Self {
            block_map,
            entity_map: entity_map.unwrap_or_default(),
            selection_before: selection.clone(),
            selection_after: selection,
        })
    }

    /// Split `text` into unstyled flat blocks. `None` splits on every
    /// CRLF, CR or LF.
    pub fn create_from_text(text: &str, delimiter: Option<&str>) -> Self {
        let options = FromTextOptions {
            delimiter: delimiter.map(str::to_owned),
            ..FromTextOptions::default()
        };
        Self::create_from_text_with(text, &options)
    }

    /// Text import always yields at least one block, each under a freshly
    /// generated key.
    pub fn create_from_text_with(text: &str, options: &FromTextOptions) -> Self {
        Self::create_from_block_array(blocks_from_text(text, options), None)
            .expect("text import failed")
    }

    pub fn block_map(&self) -> &BlockMap {
        &self.block_map
    }

    pub fn entity_map(&self) -> &EntityRegistry {
        &self.entity_map
    }

    pub fn selection_before(&self) -> &SelectionState {
        &self.selection_before
    }

    pub fn selection_after(&self) -> &SelectionState {
        &self.selection_after
    }

    pub fn with_block_map(&self, block_map: BlockMap) -> Self {
        Self {
            block_map,
            ..self.clone()
        }
    }

    pub fn with_selection_before(&self, selection: SelectionState) -> Self {
        Self {
            selection_before: selection,
            ..self.clone()
        }
    }

    pub fn with_selection_after(&self, selection: SelectionState) -> Self {
        Self {
            selection_after: selection,
            ..self.clone()
        }
    }

    pub fn block_for_key(&self, key: &BlockKey) -> Option<&Block> {
        self.block_map.get(key)
    }

    pub fn key_before(&self, key: &BlockKey) -> Option<&BlockKey> {
        self.block_map.key_before(key)
    }

    pub fn key_after(&self, key: &BlockKey) -> Option<&BlockKey> {
        self.block_map.key_after(key)
    }

    pub fn block_before(&self, key: &BlockKey) -> Option<&Block> {
        self.key_before(key).and_then(|k| self.block_map.get(k))
    }

    pub fn block_after(&self, key: &BlockKey) -> Option<&Block> {
        self.key_after(key).and_then(|k| self.block_map.get(k))
    }

    pub fn blocks_as_array(&self) -> Vec<&Block> {
        self.block_map.iter().collect()
    }

    pub fn first_block(&self) -> Option<&Block> {
        self.block_map.first()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.block_map.last()
    }

    /// Every block's text in document order, joined with `delimiter`.
    pub fn plain_text(&self, delimiter: &str) -> String {
        self.block_map
            .iter()
            .map(Block::text_string)
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    /// False only for a document made of a single empty block.
    pub fn has_text(&self) -> bool {
        self.block_map.len() > 1
            || self.block_map.first().is_some_and(|block| !block.is_empty())
    }

    /// Register a new entity. Its key is then available from
    /// [`ContentState::last_created_entity_key`].
    pub fn create_entity(
        &self,
        entity_type: EntityType,
        mutability: Mutability,
        data: EntityData,
    ) -> Self {
        self.entity_map.create(entity_type, mutability, data);
        self.clone()
    }

    pub fn add_entity(&self, instance: EntityInstance) -> Self {
        self.entity_map.add(instance);
        self.clone()
    }

    pub fn entity(&self, key: EntityKey) -> Result<EntityInstance, ContentError> {
        self.entity_map.get(key)
    }

    pub fn last_created_entity_key(&self) -> Option<EntityKey> {
        self.entity_map.last_created_key()
    }

    pub fn merge_entity_data(
        &self,
        key: EntityKey,
        partial: EntityData,
    ) -> Result<Self, ContentError> {
        self.entity_map.merge_data(key, partial)?;
        Ok(self.clone())
    }

    pub fn replace_entity_data(
        &self,
        key: EntityKey,
        data: EntityData,
    ) -> Result<Self, ContentError> {
        self.entity_map.replace_data(key, data)?;
        Ok(self.clone())
    }

    /// See [`remove_range_from_content_state`].
    pub fn remove_range(
        &self,
        selection: &SelectionState,
    ) -> Result<Self, ContentError> {
        remove_range_from_content_state(self, selection)
    }

    /// Whether both snapshots share the same block map allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.block_map.ptr_eq(&other.block_map)
            && self.selection_before == other.selection_before
            && self.selection_after == other.selection_after
    }
}
