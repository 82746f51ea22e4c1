use std::sync::RwLock;

use hashbrown::HashMap;
use once_cell::sync::Lazy;

/// Global string-interning table. Interned strings are leaked so the handles
/// can be `Copy` and live for the rest of the process.
#[derive(Debug, Default)]
struct InterningTable {
    inner: RwLock<InterningTableInner>,
}

#[derive(Debug, Default)]
struct InterningTableInner {
    strings: Vec<&'static str>,
    indices: HashMap<&'static str, u32>,
}

static INTERNING_TABLE: Lazy<InterningTable> = Lazy::new(Default::default);

impl InterningTable {
    fn get(&self, index: u32) -> Option<&'static str> {
        let inner = self.inner.read().unwrap();

        inner.strings.get(index as usize).copied()
    }

    fn insert_if_absent(&self, string: &str) -> u32 {
        if let Some(index) = self.inner.read().unwrap().indices.get(string) {
            return *index;
        }

        let mut inner = self.inner.write().unwrap();

        // A writer may have raced us between the locks
        if let Some(index) = inner.indices.get(string) {
            return *index;
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = inner.strings.len() as u32;
        inner.strings.push(leaked);
        inner.indices.insert(leaked, index);

        index
    }
}

/// An index into the string interning table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternedSymbol(u32);

impl InternedSymbol {
    pub fn new(value: &str) -> Self {
        Self(INTERNING_TABLE.insert_if_absent(value))
    }

    pub fn value(&self) -> &'static str {
        INTERNING_TABLE.get(self.0).expect(
            "once an interned symbol is created, the string it references is never removed",
        )
    }
}

impl core::fmt::Debug for InternedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InternedSymbol")
            .field(&self.0)
            .field(&self.value())
            .finish()
    }
}

impl core::fmt::Display for InternedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = InternedSymbol::new("main");
        let b = InternedSymbol::new("main");
        let c = InternedSymbol::new("other");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.value(), "main");
        assert_eq!(c.to_string(), "other");
    }
}
