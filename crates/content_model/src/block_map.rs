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

//! The ordered, keyed collection of blocks owned by a content state.
//!
//! Iteration order is document order. A `BlockMap` is never changed after
//! construction: [`BlockMap::merge`] and [`BlockMap::filter`] build a new
//! map whose untouched entries are the same `Arc<Block>` allocations as in
//! the source map.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Block, BlockKey, ContentError, TreeInvariantError};

#[derive(Clone, Debug, Default)]
pub struct BlockMap {
    blocks: Arc<IndexMap<BlockKey, Arc<Block>>>,
}

impl BlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from blocks in document order.
    pub fn from_blocks(
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<Self, ContentError> {
        let mut map = IndexMap::new();
        for block in blocks {
            let key = block.key().clone();
            if map.contains_key(&key) {
                return Err(ContentError::DuplicateBlockKey(key));
            }
            map.insert(key, Arc::new(block));
        }
        Ok(Self {
            blocks: Arc::new(map),
        })
    }

    pub fn get(&self, key: &BlockKey) -> Option<&Block> {
        self.blocks.get(key).map(Arc::as_ref)
    }

    pub fn contains_key(&self, key: &BlockKey) -> bool {
        self.blocks.contains_key(key)
    }

    /// Position of `key` in document order.
    pub fn index_of(&self, key: &BlockKey) -> Option<usize> {
        self.blocks.get_index_of(key)
    }

    pub fn get_index(&self, index: usize) -> Option<&Block> {
        self.blocks.get_index(index).map(|(_, block)| block.as_ref())
    }

    /// The key preceding `key` in document order, or `None` if `key` is
    /// first or absent.
    pub fn key_before(&self, key: &BlockKey) -> Option<&BlockKey> {
        let index = self.blocks.get_index_of(key)?.checked_sub(1)?;
        self.blocks.get_index(index).map(|(k, _)| k)
    }

    /// The key following `key` in document order, or `None` if `key` is
    /// last or absent.
    pub fn key_after(&self, key: &BlockKey) -> Option<&BlockKey> {
        let index = self.blocks.get_index_of(key)? + 1;
        self.blocks.get_index(index).map(|(k, _)| k)
    }

    pub fn first(&self) -> Option<&Block> {
        self.blocks.first().map(|(_, block)| block.as_ref())
    }

    pub fn last(&self) -> Option<&Block> {
        self.blocks.last().map(|(_, block)| block.as_ref())
    }

    /// Blocks in document order. Each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values().map(Arc::as_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = &BlockKey> + '_ {
        self.blocks.keys()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Apply a batch of updates: `Some(block)` replaces the block stored
    /// under the key (or appends it if the key is new), `None` removes it.
    /// When a key is updated twice the last update wins.
    pub fn merge(
        &self,
        updates: impl IntoIterator<Item = (BlockKey, Option<Block>)>,
    ) -> Self {
        let mut updates: IndexMap<BlockKey, Option<Block>> =
            updates.into_iter().collect();
        if updates.is_empty() {
            return self.clone();
        }

        let mut blocks = IndexMap::with_capacity(self.blocks.len());
        for (key, block) in self.blocks.iter() {
            match updates.shift_remove(key) {
                Some(Some(replacement)) => {
                    debug_assert_eq!(replacement.key(), key);
                    blocks.insert(key.clone(), Arc::new(replacement));
                }
                Some(None) => {}
                None => {
                    blocks.insert(key.clone(), Arc::clone(block));
                }
            }
        }
        for (key, update) in updates {
            if let Some(block) = update {
                blocks.insert(key, Arc::new(block));
            }
        }

        Self {
            blocks: Arc::new(blocks),
        }
    }

    /// Apply `f` to every block in document order. A block for which `f`
    /// returns `None` is kept unchanged and shared with this map.
    pub fn map(&self, f: impl Fn(&Block) -> Option<Block>) -> Self {
        let blocks = self
            .blocks
            .iter()
            .map(|(key, block)| {
                let block = match f(block) {
                    Some(replacement) => {
                        debug_assert_eq!(replacement.key(), key);
                        Arc::new(replacement)
                    }
                    None => Arc::clone(block),
                };
                (key.clone(), block)
            })
            .collect();
        Self {
            blocks: Arc::new(blocks),
        }
    }

    /// Keep only the blocks for which `keep` holds.
    pub fn filter(&self, keep: impl Fn(&Block) -> bool) -> Self {
        let blocks = self
            .blocks
            .iter()
            .filter(|(_, block)| keep(block))
            .map(|(key, block)| (key.clone(), Arc::clone(block)))
            .collect();
        Self {
            blocks: Arc::new(blocks),
        }
    }

    /// Whether both maps are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.blocks, &other.blocks)
    }

    /// Whether both maps hold the very same allocation for `key`.
    pub fn shares_block_with(&self, other: &Self, key: &BlockKey) -> bool {
        match (self.blocks.get(key), other.blocks.get(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Check that every parent, child and sibling key of every tree node
    /// names a block in this map, and that the links agree with each other.
    pub fn validate_tree(&self) -> Result<(), TreeInvariantError> {
        for block in self.iter() {
            let Some(links) = block.links() else {
                continue;
            };
            let key = block.key();

            if let Some(parent_key) = &links.parent {
                let parent = self.get(parent_key).ok_or_else(|| {
                    TreeInvariantError::MissingParent {
                        child: key.clone(),
                        parent: parent_key.clone(),
                    }
                })?;
                if !parent.children_keys().contains(key) {
                    return Err(TreeInvariantError::NotListedByParent {
                        child: key.clone(),
                        parent: parent_key.clone(),
                    });
                }
            }

            if let Some(prev_key) = &links.prev_sibling {
                let prev = self.sibling(key, prev_key)?;
                if prev.next_sibling_key() != Some(key) {
                    return Err(TreeInvariantError::AsymmetricSiblings {
                        from: key.clone(),
                        to: prev_key.clone(),
                    });
                }
            }

            if let Some(next_key) = &links.next_sibling {
                let next = self.sibling(key, next_key)?;
                if next.prev_sibling_key() != Some(key) {
                    return Err(TreeInvariantError::AsymmetricSiblings {
                        from: key.clone(),
                        to: next_key.clone(),
                    });
                }
            }

            for (i, child_key) in links.children.iter().enumerate() {
                let child = self.get(child_key).ok_or_else(|| {
                    TreeInvariantError::MissingChild {
                        parent: key.clone(),
                        child: child_key.clone(),
                    }
                })?;
                if child.parent_key() != Some(key) {
                    return Err(TreeInvariantError::ChildHasOtherParent {
                        parent: key.clone(),
                        child: child_key.clone(),
                        actual: child.parent_key().cloned(),
                    });
                }
                let expected_prev =
                    i.checked_sub(1).map(|prev| &links.children[prev]);
                let expected_next = links.children.get(i + 1);
                if child.prev_sibling_key() != expected_prev
                    || child.next_sibling_key() != expected_next
                {
                    return Err(TreeInvariantError::ChildOrderMismatch {
                        parent: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn sibling(
        &self,
        key: &BlockKey,
        sibling_key: &BlockKey,
    ) -> Result<&Block, TreeInvariantError> {
        self.get(sibling_key)
            .ok_or_else(|| TreeInvariantError::MissingSibling {
                key: key.clone(),
                sibling: sibling_key.clone(),
            })
    }

    /// Panic if [`BlockMap::validate_tree`] finds a broken link.
    pub fn assert_tree_invariants(&self) {
        if let Err(error) = self.validate_tree() {
            panic!("Block map invariant violated: {error}");
        }
    }
}

impl PartialEq for BlockMap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len()
                && self
                    .blocks
                    .iter()
                    .zip(other.blocks.iter())
                    .all(|((ka, a), (kb, b))| ka == kb && a == b))
    }
}

impl Eq for BlockMap {}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;
    use crate::{BlockType, TreeLinks};

    fn key(k: &str) -> BlockKey {
        BlockKey::from(k)
    }

    fn flat(k: &str, text: &str) -> Block {
        Block::new(k, BlockType::Unstyled, text)
    }

    fn abc() -> BlockMap {
        BlockMap::from_blocks([flat("a", "1"), flat("b", "2"), flat("c", "3")])
            .unwrap()
    }

    #[test]
    fn neighbours_follow_document_order() {
        let map = abc();
        assert_eq!(map.key_before(&key("b")), Some(&key("a")));
        assert_eq!(map.key_after(&key("b")), Some(&key("c")));
        assert_that!(map.key_before(&key("a"))).is_none();
        assert_that!(map.key_after(&key("c"))).is_none();
    }

    #[test]
    fn neighbours_of_absent_key_are_none() {
        let map = abc();
        assert_that!(map.key_before(&key("zz"))).is_none();
        assert_that!(map.key_after(&key("zz"))).is_none();
    }

    #[test]
    fn first_last_and_iteration() {
        let map = abc();
        assert_eq!(map.first().unwrap().key(), &key("a"));
        assert_eq!(map.last().unwrap().key(), &key("c"));
        let texts: Vec<String> = map.iter().map(Block::text_string).collect();
        assert_eq!(texts, ["1", "2", "3"]);
        // a second pass restarts from the beginning
        assert_eq!(map.iter().count(), 3);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let result = BlockMap::from_blocks([flat("a", ""), flat("a", "")]);
        assert_eq!(result, Err(ContentError::DuplicateBlockKey(key("a"))));
    }

    #[test]
    fn merge_replaces_removes_and_appends() {
        let map = abc();
        let merged = map.merge([
            (key("b"), Some(flat("b", "two"))),
            (key("a"), None),
            (key("d"), Some(flat("d", "4"))),
        ]);
        let keys: Vec<&str> = merged.keys().map(BlockKey::as_str).collect();
        assert_eq!(keys, ["b", "c", "d"]);
        assert_eq!(merged.get(&key("b")).unwrap().text_string(), "two");
        // the original is untouched
        assert_eq!(map.get(&key("b")).unwrap().text_string(), "2");
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn merge_shares_untouched_blocks() {
        let map = abc();
        let merged = map.merge([(key("b"), None)]);
        assert!(merged.shares_block_with(&map, &key("a")));
        assert!(merged.shares_block_with(&map, &key("c")));
        assert!(map.merge(Vec::new()).ptr_eq(&map));
    }

    #[test]
    fn map_shares_untouched_blocks() {
        let map = abc();
        let mapped = map.map(|b| {
            (b.key() == &key("b"))
                .then(|| b.clone().with_type(BlockType::Blockquote))
        });

        assert_eq!(mapped.len(), 3);
        assert_eq!(
            mapped.keys().collect::<Vec<_>>(),
            [&key("a"), &key("b"), &key("c")]
        );
        assert!(mapped.shares_block_with(&map, &key("a")));
        assert!(mapped.shares_block_with(&map, &key("c")));
        assert!(!mapped.shares_block_with(&map, &key("b")));
        assert_eq!(
            mapped.get(&key("b")).unwrap().block_type(),
            &BlockType::Blockquote
        );
        assert_eq!(map.get(&key("b")).unwrap().block_type(), &BlockType::Unstyled);
    }

    #[test]
    fn filter_keeps_matching_blocks() {
        let map = abc().filter(|b| b.text_string() != "2");
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key(&key("b")));
    }

    #[test]
    fn equality_is_structural_and_ordered() {
        let reordered = BlockMap::from_blocks([
            flat("b", "2"),
            flat("a", "1"),
            flat("c", "3"),
        ])
        .unwrap();
        assert_eq!(abc(), abc());
        assert_ne!(abc(), reordered);
    }

    fn node(k: &str, links: TreeLinks) -> Block {
        Block::new_node(k, BlockType::Unstyled, "", links)
    }

    #[test]
    fn valid_tree_passes() {
        let map = BlockMap::from_blocks([
            node("r", TreeLinks::new().with_children(["a", "b"])),
            node("a", TreeLinks::new().with_parent("r").with_next_sibling("b")),
            node("b", TreeLinks::new().with_parent("r").with_prev_sibling("a")),
        ])
        .unwrap();
        assert_that!(map.validate_tree()).is_ok();
    }

    #[test]
    fn dangling_child_is_reported() {
        let map = BlockMap::from_blocks([node(
            "r",
            TreeLinks::new().with_children(["gone"]),
        )])
        .unwrap();
        assert_eq!(
            map.validate_tree(),
            Err(TreeInvariantError::MissingChild {
                parent: key("r"),
                child: key("gone"),
            })
        );
    }

    #[test]
    fn dangling_sibling_is_reported() {
        let map = BlockMap::from_blocks([node(
            "a",
            TreeLinks::new().with_next_sibling("gone"),
        )])
        .unwrap();
        assert_eq!(
            map.validate_tree(),
            Err(TreeInvariantError::MissingSibling {
                key: key("a"),
                sibling: key("gone"),
            })
        );
    }

    #[test]
    fn one_way_sibling_link_is_reported() {
        let map = BlockMap::from_blocks([
            node("a", TreeLinks::new().with_next_sibling("b")),
            node("b", TreeLinks::new()),
        ])
        .unwrap();
        assert_eq!(
            map.validate_tree(),
            Err(TreeInvariantError::AsymmetricSiblings {
                from: key("a"),
                to: key("b"),
            })
        );
    }

    #[test]
    #[should_panic(expected = "Block map invariant violated")]
    fn assert_tree_invariants_panics_on_broken_tree() {
        BlockMap::from_blocks([node(
            "a",
            TreeLinks::new().with_parent("gone"),
        )])
        .unwrap()
        .assert_tree_invariants();
    }
}
