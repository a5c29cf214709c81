//! Identifier interning.
//!
//! Names are interned once and referenced everywhere else by `NameId`,
//! so scope maps key on small integers and name comparisons are cheap.

use std::collections::HashMap;

/// An interned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

/// Maps names to small integer ids and back.
#[derive(Debug, Default)]
pub struct Interner {
    names: Vec<String>,
    map: HashMap<String, NameId>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the existing id if already present.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.map.insert(name.to_string(), id);
        id
    }

    /// Resolve an id back to its name.
    pub fn resolve(&self, id: NameId) -> &str {
        &self.names[id.0 as usize]
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<NameId> {
        self.map.get(name).copied()
    }
}
