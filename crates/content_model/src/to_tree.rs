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

//! Debug rendering of a document as a text tree.

use crate::{Block, BlockMap, ContentState};

pub trait ToTree {
    fn to_tree(&self) -> String;
}

impl ToTree for BlockMap {
    /// Every block without a parent is a root. Tree nodes' children are
    /// nested under them.
    fn to_tree(&self) -> String {
        let roots: Vec<&Block> =
            self.iter().filter(|b| b.parent_key().is_none()).collect();
        let mut out = String::from("\n");
        render(self, &roots, "", self.len(), &mut out);
        out
    }
}

impl ToTree for ContentState {
    fn to_tree(&self) -> String {
        self.block_map().to_tree()
    }
}

fn render(
    map: &BlockMap,
    blocks: &[&Block],
    prefix: &str,
    depth_left: usize,
    out: &mut String,
) {
    for (i, block) in blocks.iter().enumerate() {
        let is_last = i + 1 == blocks.len();
        out.push_str(prefix);
        out.push_str(if is_last { "└>" } else { "├>" });
        out.push_str(&describe(block));
        out.push('\n');

        if depth_left == 0 {
            continue;
        }
        let children: Vec<&Block> = block
            .children_keys()
            .iter()
            .filter_map(|key| map.get(key))
            .collect();
        let child_prefix =
            format!("{prefix}{}", if is_last { "  " } else { "│ " });
        render(map, &children, &child_prefix, depth_left - 1, out);
    }
}

fn describe(block: &Block) -> String {
    let mut description = format!(
        "{} {} \"{}\"",
        block.key(),
        block.block_type(),
        block.text_string()
    );
    if block.depth() > 0 {
        description.push_str(&format!(" depth={}", block.depth()));
    }
    description
}
