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

//! Deleting a selected span of text, within one block or across many.
//!
//! For tree-structured documents the deleted span may cover blocks whose
//! children or siblings lie outside it. Those blocks are retained (with
//! their text removed) and the links of every block next to the span are
//! recomputed against the topology the document had before the edit, so
//! no surviving block refers to a deleted one.

use std::collections::HashSet;

use tracing::{debug, trace};
use widestring::U16String;

use super::tree_links::{
    ancestor_keys, next_delimiter_key, next_delimiter_keys,
    next_valid_sibling, prev_valid_sibling,
};
use crate::{
    Block, BlockKey, BlockMap, ContentError, ContentState, SelectionState,
    TreeLinks,
};

/// Remove the span covered by `selection` from `content_state`.
///
/// A collapsed selection returns the input unchanged. Otherwise the text
/// before the span in the start block is joined with the text after it in
/// the end block under the start block's key, and the blocks in between are
/// removed. The result records `selection` as its selection before, and a
/// cursor at the start of the span as its selection after.
pub fn remove_range_from_content_state(
    content_state: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState, ContentError> {
    if selection.is_collapsed() {
        return Ok(content_state.clone());
    }

    let block_map = content_state.block_map();
    let start_key = selection.start_key();
    let start_offset = selection.start_offset();
    let end_key = selection.end_key();
    let end_offset = selection.end_offset();

    let (start_index, start_block) = locate(block_map, start_key, start_offset)?;
    let (end_index, end_block) = locate(block_map, end_key, end_offset)?;
    if start_index > end_index
        || (start_index == end_index && start_offset > end_offset)
    {
        return Err(ContentError::InvalidSelection);
    }

    debug!(
        %start_key,
        start_offset,
        %end_key,
        end_offset,
        "removing range"
    );

    let spans_blocks = start_index != end_index;
    let is_tree = start_block.is_tree_node();
    let retained = if is_tree && spans_blocks {
        retained_keys(end_block, block_map)
    } else {
        HashSet::new()
    };
    trace!(?retained, "blocks retained inside the range");

    let (text, characters) = if spans_blocks {
        (
            concat(
                &start_block.text().as_slice()[..start_offset],
                &end_block.text().as_slice()[end_offset..],
            ),
            concat(
                &start_block.characters()[..start_offset],
                &end_block.characters()[end_offset..],
            ),
        )
    } else {
        (
            remove_from_list(start_block.text().as_slice(), start_offset, end_offset),
            remove_from_list(start_block.characters(), start_offset, end_offset),
        )
    };
    let merged = start_block.replace_content(U16String::from_vec(text), characters);

    let mut updates = vec![(start_key.clone(), Some(merged))];
    for index in start_index + 1..=end_index {
        let Some(block) = block_map.get_index(index) else {
            continue;
        };
        let update = retained
            .contains(block.key())
            .then(|| block.replace_content(U16String::new(), Vec::new()));
        updates.push((block.key().clone(), update));
    }
    let mut updated = block_map.merge(updates);

    if is_tree && spans_blocks {
        updated = repair_links(&updated, block_map, start_block, end_block);
    }

    cfg_if::cfg_if! {
        if #[cfg(feature = "assert-invariants")] {
            updated.assert_tree_invariants();
        }
    }

    let selection_after = selection
        .clone()
        .with_anchor(start_key.clone(), start_offset)
        .with_focus(start_key.clone(), start_offset)
        .with_is_backward(false);

    Ok(content_state
        .with_block_map(updated)
        .with_selection_before(selection.clone())
        .with_selection_after(selection_after))
}

fn locate<'a>(
    block_map: &'a BlockMap,
    key: &BlockKey,
    offset: usize,
) -> Result<(usize, &'a Block), ContentError> {
    let not_found = || ContentError::BlockNotFound(key.clone());
    let index = block_map.index_of(key).ok_or_else(not_found)?;
    let block = block_map.get_index(index).ok_or_else(not_found)?;
    if offset > block.len() {
        return Err(ContentError::OffsetOutOfRange {
            key: key.clone(),
            offset,
            length: block.len(),
        });
    }
    Ok((index, block))
}

/// Keys inside the range that must survive because content outside the
/// range still hangs off them.
fn retained_keys(end_block: &Block, block_map: &BlockMap) -> HashSet<BlockKey> {
    let mut retained = HashSet::new();
    let end_ancestors = ancestor_keys(end_block.key(), block_map);

    if end_block.next_sibling_key().is_some() {
        retained.extend(end_ancestors.iter().cloned());
    }
    if !end_block.children_keys().is_empty() {
        retained.extend(end_ancestors.iter().cloned());
        retained.insert(end_block.key().clone());
    }
    if let Some(delimiter) = next_delimiter_key(end_block, block_map) {
        retained.extend(ancestor_keys(&delimiter, block_map));
    }

    retained
}

/// Recompute children and sibling links of the blocks bordering the removed
/// range. Every new link is derived from `original`, then all of them are
/// applied to `updated` in one batch.
fn repair_links(
    updated: &BlockMap,
    original: &BlockMap,
    start_block: &Block,
    end_block: &Block,
) -> BlockMap {
    let targets = [start_block.key().clone(), end_block.key().clone()]
        .into_iter()
        .chain(ancestor_keys(start_block.key(), original))
        .chain(start_block.next_sibling_key().cloned())
        .chain(start_block.prev_sibling_key().cloned())
        .chain(end_block.next_sibling_key().cloned())
        .chain(end_block.prev_sibling_key().cloned())
        .chain(ancestor_keys(end_block.key(), original))
        .chain(next_delimiter_keys(end_block, original));

    let mut seen = HashSet::new();
    let repairs: Vec<(BlockKey, Option<Block>)> = targets
        .filter(|key| seen.insert(key.clone()))
        .filter_map(|key| {
            let current = updated.get(&key)?;
            let before = original.get(&key)?;
            let relinked = relink(current, before, updated, original);
            Some((key, Some(relinked)))
        })
        .collect();

    updated.merge(repairs)
}

fn relink(
    current: &Block,
    before: &Block,
    updated: &BlockMap,
    original: &BlockMap,
) -> Block {
    let Some(links) = before.links() else {
        return current.clone();
    };
    current.clone().with_links(TreeLinks {
        parent: links.parent.clone(),
        children: links
            .children
            .iter()
            .filter(|child| updated.contains_key(child))
            .cloned()
            .collect(),
        prev_sibling: prev_valid_sibling(before, updated, original),
        next_sibling: next_valid_sibling(before, updated, original),
    })
}

fn concat<T: Clone>(head: &[T], tail: &[T]) -> Vec<T> {
    let mut joined = Vec::with_capacity(head.len() + tail.len());
    joined.extend_from_slice(head);
    joined.extend_from_slice(tail);
    joined
}

/// `list` without the elements in `start..end`.
pub(crate) fn remove_from_list<T: Clone>(
    list: &[T],
    start: usize,
    end: usize,
) -> Vec<T> {
    if start == 0 {
        list[end..].to_vec()
    } else if end == list.len() {
        list[..start].to_vec()
    } else {
        concat(&list[..start], &list[end..])
    }
}
