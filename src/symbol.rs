// Copyright 2026 The Changeset Engine Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The symbol database consumed from the parser (§6): `symbol_id → {name,
//! kind}`. Classification of a symbol as branch, tag, or excluded happens
//! upstream (§1 Non-goals); the core only ever sees symbols already resolved
//! to one of the two kinds below.

use std::collections::HashMap;

use crate::ids::SymbolId;

/// What a symbol represents on the legacy line-of-development model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    /// A named line of development that can receive its own commits.
    Branch,
    /// A point-in-time label with no commits of its own.
    Tag,
}

/// One entry in the symbol database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Human-readable symbol name (e.g. a CVS tag or branch name).
    pub name: String,
    /// Branch or tag.
    pub kind: SymbolKind,
}

/// Read-only view over the parser's symbol database.
#[derive(Debug, Clone, Default)]
pub struct SymbolDatabase {
    symbols: HashMap<SymbolId, SymbolInfo>,
}

impl SymbolDatabase {
    /// Builds a database from parser-provided entries.
    pub fn new(symbols: HashMap<SymbolId, SymbolInfo>) -> Self {
        Self { symbols }
    }

    /// Looks up a symbol's metadata by id.
    pub fn get(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(&id)
    }

    /// Returns the kind of a symbol, or `None` if `id` is unknown.
    pub fn kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.symbols.get(&id).map(|info| info.kind)
    }
}
