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

//! Splitting raw text into blocks.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Block, BlockKey, BlockType, TreeLinks};

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n?|\n").expect("line break pattern"));

// Control characters other than tab have no place in block text.
static UNSAFE_CHARACTERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Cc}&&[^\t]]").expect("control character pattern")
});

/// Which block variant text import produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockStructure {
    #[default]
    Flat,
    /// Root-level tree nodes chained as siblings.
    Tree,
}

/// Options for [`ContentState::create_from_text_with`](crate::ContentState::create_from_text_with).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FromTextOptions {
    /// Literal block separator. `None` splits on every CRLF, CR or LF; an
    /// empty string keeps the text in one block.
    pub delimiter: Option<String>,
    pub structure: BlockStructure,
}

impl FromTextOptions {
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_structure(mut self, structure: BlockStructure) -> Self {
        self.structure = structure;
        self
    }
}

pub(crate) fn split_text<'a>(
    text: &'a str,
    delimiter: Option<&str>,
) -> Vec<&'a str> {
    match delimiter {
        None => LINE_BREAK.split(text).collect(),
        Some("") => vec![text],
        Some(delimiter) => text.split(delimiter).collect(),
    }
}

pub(crate) fn sanitize(text: &str) -> Cow<'_, str> {
    UNSAFE_CHARACTERS.replace_all(text, "")
}

/// One unstyled block per segment of `text`. Never empty.
pub(crate) fn blocks_from_text(
    text: &str,
    options: &FromTextOptions,
) -> Vec<Block> {
    let lines = split_text(text, options.delimiter.as_deref());
    let keys: Vec<BlockKey> =
        lines.iter().map(|_| BlockKey::generate()).collect();

    lines
        .iter()
        .zip(&keys)
        .enumerate()
        .map(|(i, (line, key))| {
            let block =
                Block::new(key.clone(), BlockType::Unstyled, &sanitize(line));
            match options.structure {
                BlockStructure::Flat => block,
                BlockStructure::Tree => block.with_links(TreeLinks {
                    prev_sibling: i.checked_sub(1).map(|p| keys[p].clone()),
                    next_sibling: keys.get(i + 1).cloned(),
                    ..TreeLinks::default()
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_split_handles_every_line_ending() {
        assert_eq!(split_text("a\r\nb\rc\nd", None), ["a", "b", "c", "d"]);
    }

    #[test]
    fn consecutive_line_breaks_give_empty_segments() {
        assert_eq!(split_text("a\n\nb", None), ["a", "", "b"]);
    }

    #[test]
    fn empty_text_is_one_segment() {
        assert_eq!(split_text("", None), [""]);
    }

    #[test]
    fn custom_delimiter_is_literal() {
        assert_eq!(split_text("a||b|c", Some("||")), ["a", "b|c"]);
        assert_eq!(split_text("a\nb", Some("")), ["a\nb"]);
    }

    #[test]
    fn sanitize_strips_control_characters_but_not_tabs() {
        assert_eq!(sanitize("a\u{0}b\tc\u{7}d\re"), "ab\tcde");
        assert_eq!(sanitize("caf\u{e9}"), "caf\u{e9}");
    }

    #[test]
    fn tree_import_chains_root_siblings() {
        let options =
            FromTextOptions::default().with_structure(BlockStructure::Tree);
        let blocks = blocks_from_text("a\nb\nc", &options);
        assert!(blocks[0].is_delimiter());
        assert_eq!(blocks[0].next_sibling_key(), Some(blocks[1].key()));
        assert_eq!(blocks[1].prev_sibling_key(), Some(blocks[0].key()));
        assert_eq!(blocks[2].next_sibling_key(), None);
        assert!(blocks.iter().all(|b| b.parent_key().is_none()));
    }
}
