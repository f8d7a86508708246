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

//! Blocks: one paragraph-like unit of text with per-character formatting.
//!
//! A block is either flat (positioned by an indent depth) or a tree node
//! whose parent, children and siblings are named by key. Links are lookups
//! into the owning [`BlockMap`](crate::BlockMap), never ownership.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};
use strum_macros::EnumString;
use widestring::{U16Str, U16String};

use crate::{BlockKey, CharacterMetadata, ContentError, EntityKey, InlineStyle};

/// The semantic kind of a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum BlockType {
    #[default]
    Unstyled,
    Paragraph,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    HeaderFour,
    HeaderFive,
    HeaderSix,
    UnorderedListItem,
    OrderedListItem,
    Blockquote,
    CodeBlock,
    Atomic,
    #[strum(default)]
    Custom(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unstyled => "unstyled",
            Self::Paragraph => "paragraph",
            Self::HeaderOne => "header-one",
            Self::HeaderTwo => "header-two",
            Self::HeaderThree => "header-three",
            Self::HeaderFour => "header-four",
            Self::HeaderFive => "header-five",
            Self::HeaderSix => "header-six",
            Self::UnorderedListItem => "unordered-list-item",
            Self::OrderedListItem => "ordered-list-item",
            Self::Blockquote => "blockquote",
            Self::CodeBlock => "code-block",
            Self::Atomic => "atomic",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Block-level metadata.
pub type BlockData = Map<String, Value>;

/// Tree position of a block, expressed as keys of other blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeLinks {
    pub parent: Option<BlockKey>,
    pub children: Vec<BlockKey>,
    pub prev_sibling: Option<BlockKey>,
    pub next_sibling: Option<BlockKey>,
}

impl TreeLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: impl Into<BlockKey>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_children<K: Into<BlockKey>>(
        mut self,
        children: impl IntoIterator<Item = K>,
    ) -> Self {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prev_sibling(mut self, sibling: impl Into<BlockKey>) -> Self {
        self.prev_sibling = Some(sibling.into());
        self
    }

    pub fn with_next_sibling(mut self, sibling: impl Into<BlockKey>) -> Self {
        self.next_sibling = Some(sibling.into());
        self
    }
}

/// Which of the two block variants a block is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockShape {
    Flat { depth: usize },
    Tree(TreeLinks),
}

/// A block of text. `characters` always has one entry per UTF-16 code unit
/// of `text`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    key: BlockKey,
    block_type: BlockType,
    text: U16String,
    characters: Vec<CharacterMetadata>,
    data: BlockData,
    shape: BlockShape,
}

impl Block {
    /// A flat block at depth 0 whose characters carry no formatting.
    pub fn new(
        key: impl Into<BlockKey>,
        block_type: BlockType,
        text: &str,
    ) -> Self {
        let text = U16String::from_vec(text.encode_utf16().collect::<Vec<_>>());
        let characters = vec![CharacterMetadata::empty(); text.len()];
        Self {
            key: key.into(),
            block_type,
            text,
            characters,
            data: BlockData::new(),
            shape: BlockShape::Flat { depth: 0 },
        }
    }

    /// A tree node whose characters carry no formatting.
    pub fn new_node(
        key: impl Into<BlockKey>,
        block_type: BlockType,
        text: &str,
        links: TreeLinks,
    ) -> Self {
        Self::new(key, block_type, text).with_links(links)
    }

    /// Replace text and characters together.
    pub fn with_content(
        self,
        text: U16String,
        characters: Vec<CharacterMetadata>,
    ) -> Result<Self, ContentError> {
        if text.len() != characters.len() {
            return Err(ContentError::LengthMismatch {
                text: text.len(),
                characters: characters.len(),
            });
        }
        Ok(Self {
            text,
            characters,
            ..self
        })
    }

    /// Replace the characters, keeping the text.
    pub fn with_characters(
        self,
        characters: Vec<CharacterMetadata>,
    ) -> Result<Self, ContentError> {
        let text = self.text.clone();
        self.with_content(text, characters)
    }

    /// Crate-internal counterpart of [`Block::with_content`] for callers
    /// that already sliced text and characters at the same offsets.
    pub(crate) fn replace_content(
        &self,
        text: U16String,
        characters: Vec<CharacterMetadata>,
    ) -> Self {
        debug_assert_eq!(text.len(), characters.len());
        Self {
            key: self.key.clone(),
            block_type: self.block_type.clone(),
            text,
            characters,
            data: self.data.clone(),
            shape: self.shape.clone(),
        }
    }

    pub fn with_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    pub fn with_data(mut self, data: BlockData) -> Self {
        self.data = data;
        self
    }

    /// Set the indent depth. Tree nodes have no depth and are returned
    /// unchanged.
    pub fn with_depth(mut self, depth: usize) -> Self {
        if let BlockShape::Flat { .. } = self.shape {
            self.shape = BlockShape::Flat { depth };
        }
        self
    }

    /// Turn the block into a tree node with the given links.
    pub fn with_links(mut self, links: TreeLinks) -> Self {
        self.shape = BlockShape::Tree(links);
        self
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    pub fn block_type(&self) -> &BlockType {
        &self.block_type
    }

    pub fn text(&self) -> &U16Str {
        self.text.as_ustr()
    }

    pub fn text_string(&self) -> String {
        self.text.to_string_lossy()
    }

    pub fn characters(&self) -> &[CharacterMetadata] {
        &self.characters
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    pub fn shape(&self) -> &BlockShape {
        &self.shape
    }

    /// Indent depth of a flat block; tree nodes report 0.
    pub fn depth(&self) -> usize {
        match self.shape {
            BlockShape::Flat { depth } => depth,
            BlockShape::Tree(_) => 0,
        }
    }

    pub fn is_tree_node(&self) -> bool {
        matches!(self.shape, BlockShape::Tree(_))
    }

    pub fn links(&self) -> Option<&TreeLinks> {
        match &self.shape {
            BlockShape::Tree(links) => Some(links),
            BlockShape::Flat { .. } => None,
        }
    }

    pub fn parent_key(&self) -> Option<&BlockKey> {
        self.links().and_then(|l| l.parent.as_ref())
    }

    pub fn children_keys(&self) -> &[BlockKey] {
        self.links().map(|l| l.children.as_slice()).unwrap_or(&[])
    }

    pub fn prev_sibling_key(&self) -> Option<&BlockKey> {
        self.links().and_then(|l| l.prev_sibling.as_ref())
    }

    pub fn next_sibling_key(&self) -> Option<&BlockKey> {
        self.links().and_then(|l| l.next_sibling.as_ref())
    }

    /// A tree node with neither parent nor previous sibling: the first
    /// block of a top-level segment.
    pub fn is_delimiter(&self) -> bool {
        self.is_tree_node()
            && self.parent_key().is_none()
            && self.prev_sibling_key().is_none()
    }

    /// Styles at `offset`, empty past the end of the block.
    pub fn inline_style_at(&self, offset: usize) -> BTreeSet<InlineStyle> {
        self.characters
            .get(offset)
            .map(|c| c.style().clone())
            .unwrap_or_default()
    }

    pub fn entity_at(&self, offset: usize) -> Option<EntityKey> {
        self.characters.get(offset).and_then(CharacterMetadata::entity)
    }

    /// Call `found(start, end)` for every maximal run of characters with the
    /// same style set for which `filter` holds.
    pub fn find_style_ranges(
        &self,
        filter: impl Fn(&CharacterMetadata) -> bool,
        found: impl FnMut(usize, usize),
    ) {
        find_ranges(
            &self.characters,
            |a, b| a.style() == b.style(),
            filter,
            found,
        );
    }

    /// Call `found(start, end)` for every maximal run of characters with the
    /// same entity for which `filter` holds.
    pub fn find_entity_ranges(
        &self,
        filter: impl Fn(&CharacterMetadata) -> bool,
        found: impl FnMut(usize, usize),
    ) {
        find_ranges(
            &self.characters,
            |a, b| a.entity() == b.entity(),
            filter,
            found,
        );
    }
}

fn find_ranges<T>(
    items: &[T],
    are_equal: impl Fn(&T, &T) -> bool,
    filter: impl Fn(&T) -> bool,
    mut found: impl FnMut(usize, usize),
) {
    let mut cursor = 0;
    while cursor < items.len() {
        let mut end = cursor + 1;
        while end < items.len() && are_equal(&items[cursor], &items[end]) {
            end += 1;
        }
        if filter(&items[cursor]) {
            found(cursor, end);
        }
        cursor = end;
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use speculoos::prelude::*;
    use widestring::U16String;

    use super::*;

    fn styled_block() -> Block {
        let plain = CharacterMetadata::empty();
        let bold = plain.apply_style(InlineStyle::Bold);
        let linked = plain.apply_entity(Some(EntityKey::from(1)));
        Block::new("a", BlockType::Unstyled, "abcdef")
            .with_characters(vec![
                plain.clone(),
                bold.clone(),
                bold,
                linked.clone(),
                linked,
                plain,
            ])
            .unwrap()
    }

    #[test]
    fn new_block_has_one_character_per_code_unit() {
        // U+1F4A9 is two UTF-16 code units
        let block = Block::new("a", BlockType::Unstyled, "x\u{1F4A9}");
        assert_eq!(block.len(), 3);
        assert_eq!(block.characters().len(), 3);
        assert_eq!(block.text_string(), "x\u{1F4A9}");
    }

    #[test]
    fn block_data_holds_structured_values() {
        let data = match serde_json::json!({ "width": 320, "align": "left" }) {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        };
        let block = Block::new("a", BlockType::Atomic, "").with_data(data);
        assert_eq!(block.data().get("width"), Some(&Value::from(320)));
        assert_that!(Block::new("b", BlockType::Atomic, "").data().is_empty())
            .is_true();
    }

    #[test]
    fn mismatched_content_is_rejected() {
        let result = Block::new("a", BlockType::Unstyled, "").with_content(
            U16String::from_vec(vec![97u16, 98]),
            vec![CharacterMetadata::empty()],
        );
        assert_eq!(
            result,
            Err(ContentError::LengthMismatch {
                text: 2,
                characters: 1
            })
        );
    }

    #[test]
    fn style_and_entity_lookups() {
        let block = styled_block();
        assert_that!(block.inline_style_at(1).contains(&InlineStyle::Bold))
            .is_true();
        assert_that!(block.inline_style_at(99).is_empty()).is_true();
        assert_that!(block.entity_at(3)).is_equal_to(Some(EntityKey::from(1)));
        assert_that!(block.entity_at(0)).is_none();
    }

    #[test]
    fn style_ranges_group_equal_runs() {
        let block = styled_block();
        let mut ranges = Vec::new();
        block.find_style_ranges(
            |c| c.has_style(&InlineStyle::Bold),
            |s, e| ranges.push((s, e)),
        );
        assert_eq!(ranges, vec![(1, 3)]);
    }

    #[test]
    fn entity_ranges_group_equal_runs() {
        let block = styled_block();
        let mut ranges = Vec::new();
        block.find_entity_ranges(
            |c| c.entity().is_some(),
            |s, e| ranges.push((s, e)),
        );
        assert_eq!(ranges, vec![(3, 5)]);
    }

    #[test]
    fn tree_links_are_only_on_nodes() {
        let flat = Block::new("a", BlockType::Unstyled, "x").with_depth(2);
        assert_eq!(flat.depth(), 2);
        assert_that!(flat.parent_key()).is_none();
        assert!(flat.children_keys().is_empty());
        assert!(!flat.is_delimiter());

        let node = Block::new_node(
            "r",
            BlockType::Unstyled,
            "",
            TreeLinks::new().with_children(["b", "c"]),
        );
        assert!(node.is_delimiter());
        assert_eq!(node.children_keys().len(), 2);
        assert_eq!(node.clone().with_depth(3).depth(), 0);
    }

    #[test]
    fn block_types_parse_from_kebab_case() {
        assert_eq!(
            BlockType::from_str("unordered-list-item"),
            Ok(BlockType::UnorderedListItem)
        );
        assert_eq!(
            BlockType::from_str("callout"),
            Ok(BlockType::Custom("callout".to_owned()))
        );
        assert_eq!(BlockType::CodeBlock.to_string(), "code-block");
    }
}
