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

//! Navigation helpers over tree-structured blocks.
//!
//! Every walk is bounded by the size of the map so a corrupt link cycle
//! cannot loop forever.

use std::iter::successors;

use crate::{Block, BlockKey, BlockMap};

/// Keys of the ancestors of `key`, nearest first.
pub fn ancestor_keys(key: &BlockKey, block_map: &BlockMap) -> Vec<BlockKey> {
    successors(
        block_map.get(key).and_then(Block::parent_key),
        |parent| block_map.get(parent).and_then(Block::parent_key),
    )
    .take(block_map.len())
    .cloned()
    .collect()
}

/// The first block after `block` and its descendants that is a sibling of
/// `block` or of one of its ancestors.
pub fn next_delimiter_key(block: &Block, block_map: &BlockMap) -> Option<BlockKey> {
    if !block.is_tree_node() {
        return None;
    }
    successors(Some(block), |node| {
        node.parent_key().and_then(|parent| block_map.get(parent))
    })
    .take(block_map.len() + 1)
    .find_map(Block::next_sibling_key)
    .cloned()
}

/// The chain of next delimiters starting at `block`, up to and including
/// the first one found at root level.
pub fn next_delimiter_keys(block: &Block, block_map: &BlockMap) -> Vec<BlockKey> {
    let mut delimiters = Vec::new();
    let mut next = next_delimiter_key(block, block_map);
    while let Some(key) = next {
        let Some(delimiter) = block_map.get(&key) else {
            break;
        };
        next = match delimiter.parent_key() {
            Some(_) => next_delimiter_key(delimiter, block_map),
            None => None,
        };
        delimiters.push(key);
        if delimiters.len() > block_map.len() {
            break;
        }
    }
    delimiters
}

/// The nearest following sibling of `block` in `original` that is still
/// present in `updated`.
pub fn next_valid_sibling(
    block: &Block,
    updated: &BlockMap,
    original: &BlockMap,
) -> Option<BlockKey> {
    first_present(
        block.next_sibling_key(),
        Block::next_sibling_key,
        updated,
        original,
    )
}

/// The nearest preceding sibling of `block` in `original` that is still
/// present in `updated`.
pub fn prev_valid_sibling(
    block: &Block,
    updated: &BlockMap,
    original: &BlockMap,
) -> Option<BlockKey> {
    first_present(
        block.prev_sibling_key(),
        Block::prev_sibling_key,
        updated,
        original,
    )
}

fn first_present<'a>(
    first: Option<&'a BlockKey>,
    step: fn(&Block) -> Option<&BlockKey>,
    updated: &BlockMap,
    original: &'a BlockMap,
) -> Option<BlockKey> {
    successors(first, |key| original.get(key).and_then(step))
        .take(original.len())
        .find(|key| updated.contains_key(key))
        .cloned()
}
