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

use crate::{BlockKey, EntityKey};

/// Errors returned by content construction and transformation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("block `{0}` is not in the block map")]
    BlockNotFound(BlockKey),

    #[error("entity `{0}` is not in the entity registry")]
    EntityNotFound(EntityKey),

    #[error(
        "offset {offset} is past the end of block `{key}` (length {length})"
    )]
    OffsetOutOfRange {
        key: BlockKey,
        offset: usize,
        length: usize,
    },

    #[error("the selection starts after it ends")]
    InvalidSelection,

    #[error(
        "text has {text} code units but there are {characters} character entries"
    )]
    LengthMismatch { text: usize, characters: usize },

    #[error("a document must contain at least one block")]
    EmptyDocument,

    #[error("block key `{0}` appears more than once")]
    DuplicateBlockKey(BlockKey),
}

/// A broken reference or link between tree-structured blocks.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeInvariantError {
    #[error("block `{child}` names missing parent `{parent}`")]
    MissingParent { child: BlockKey, parent: BlockKey },

    #[error("block `{child}` is not listed among the children of `{parent}`")]
    NotListedByParent { child: BlockKey, parent: BlockKey },

    #[error("block `{parent}` lists missing child `{child}`")]
    MissingChild { parent: BlockKey, child: BlockKey },

    #[error("block `{parent}` lists `{child}`, whose parent is {actual:?}")]
    ChildHasOtherParent {
        parent: BlockKey,
        child: BlockKey,
        actual: Option<BlockKey>,
    },

    #[error("block `{key}` points at missing sibling `{sibling}`")]
    MissingSibling { key: BlockKey, sibling: BlockKey },

    #[error("sibling link `{from}` -> `{to}` is not mirrored")]
    AsymmetricSiblings { from: BlockKey, to: BlockKey },

    #[error("children of `{parent}` disagree with their sibling chain")]
    ChildOrderMismatch { parent: BlockKey },
}
