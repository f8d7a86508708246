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

//! Immutable document model for a rich text editing surface.
//!
//! A [`ContentState`] is one snapshot of a document: an ordered
//! [`BlockMap`] of [`Block`]s, a handle on the session's
//! [`EntityRegistry`] and the selections recorded around the edit that
//! produced it. Every transformation, such as
//! [`remove_range_from_content_state`], returns a new snapshot that shares
//! unchanged blocks with its predecessor.
//!
//! All offsets are UTF-16 code units.

mod block;
mod block_key;
mod block_map;
mod character_metadata;
mod content_state;
mod entity;
mod error;
mod plain_text;
mod selection_state;
mod to_tree;
mod transaction;

pub use crate::block::{Block, BlockData, BlockShape, BlockType, TreeLinks};
pub use crate::block_key::BlockKey;
pub use crate::block_map::BlockMap;
pub use crate::character_metadata::{CharacterMetadata, InlineStyle};
pub use crate::content_state::ContentState;
pub use crate::entity::{
    EntityData, EntityInstance, EntityKey, EntityRegistry, EntityType,
    Mutability,
};
pub use crate::error::{ContentError, TreeInvariantError};
pub use crate::plain_text::{BlockStructure, FromTextOptions};
pub use crate::selection_state::SelectionState;
pub use crate::to_tree::ToTree;
pub use crate::transaction::remove_range_from_content_state;
pub use crate::transaction::tree_links;
