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

//! Cursor and range selection within a content state.

use crate::BlockKey;

/// An immutable description of a cursor or selected range.
///
/// The anchor is where the selection began and the focus is where it ends
/// up; `is_backward` records that the focus precedes the anchor in
/// document order. Start and end are derived from these, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionState {
    anchor_key: BlockKey,
    anchor_offset: usize,
    focus_key: BlockKey,
    focus_offset: usize,
    is_backward: bool,
    has_focus: bool,
}

impl SelectionState {
    /// A collapsed, unfocused cursor at the start of `key`.
    pub fn create_empty(key: impl Into<BlockKey>) -> Self {
        Self::collapsed_at(key, 0)
    }

    /// A collapsed, unfocused cursor at `offset` in `key`.
    pub fn collapsed_at(key: impl Into<BlockKey>, offset: usize) -> Self {
        let key = key.into();
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            has_focus: false,
        }
    }

    /// A forward selection from `(anchor_key, anchor_offset)` to
    /// `(focus_key, focus_offset)`.
    pub fn range(
        anchor_key: impl Into<BlockKey>,
        anchor_offset: usize,
        focus_key: impl Into<BlockKey>,
        focus_offset: usize,
    ) -> Self {
        Self {
            anchor_key: anchor_key.into(),
            anchor_offset,
            focus_key: focus_key.into(),
            focus_offset,
            is_backward: false,
            has_focus: false,
        }
    }

    pub fn with_anchor(mut self, key: impl Into<BlockKey>, offset: usize) -> Self {
        self.anchor_key = key.into();
        self.anchor_offset = offset;
        self
    }

    pub fn with_focus(mut self, key: impl Into<BlockKey>, offset: usize) -> Self {
        self.focus_key = key.into();
        self.focus_offset = offset;
        self
    }

    pub fn with_is_backward(mut self, is_backward: bool) -> Self {
        self.is_backward = is_backward;
        self
    }

    pub fn with_has_focus(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }

    pub fn anchor_key(&self) -> &BlockKey {
        &self.anchor_key
    }

    pub fn anchor_offset(&self) -> usize {
        self.anchor_offset
    }

    pub fn focus_key(&self) -> &BlockKey {
        &self.focus_key
    }

    pub fn focus_offset(&self) -> usize {
        self.focus_offset
    }

    pub fn is_backward(&self) -> bool {
        self.is_backward
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key
            && self.anchor_offset == self.focus_offset
    }

    pub fn start_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    /// Whether the anchor or the focus lies in `key` between `start` and
    /// `end` inclusive.
    pub fn has_edge_within(
        &self,
        key: &BlockKey,
        start: usize,
        end: usize,
    ) -> bool {
        let within = |edge_key: &BlockKey, offset: usize| {
            edge_key == key && (start..=end).contains(&offset)
        };
        within(&self.anchor_key, self.anchor_offset)
            || within(&self.focus_key, self.focus_offset)
    }
}
