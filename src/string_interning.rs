use crate::settings::MINIMUM_STRING_TABLE_CAPACITY;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A unique identifier for an interned string, represented as a u32 for memory efficiency.
/// Keeps local, field and routine names from being mixed up with other integer ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StringId(u32);

/// Stores every identifier the front end hands over exactly once.
///
/// The table is only written while the IR is being built. Analysis takes it by
/// shared reference, so one table can back routines analysed on several threads.
#[derive(Debug, Clone)]
pub struct StringTable {
    /// ID → string, indexed by the id's value
    strings: Vec<Box<str>>,

    /// String → ID, for interning
    string_to_id: FxHashMap<Box<str>, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: Vec::with_capacity(MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::default(),
        }
    }

    /// Intern a string slice, returning its unique ID.
    /// Existing strings return their existing ID.
    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }

        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.strings.len() as u32);
        self.strings.push(s.into());
        self.string_to_id.insert(s.into(), new_id);
        new_id
    }

    /// Resolve an interned string ID back to its string content.
    ///
    /// Ids from another table resolve to `"<unknown>"` rather than panicking,
    /// since diagnostics are rendered from whatever the front end handed over.
    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        self.try_resolve(id).unwrap_or("<unknown>")
    }

    #[inline]
    pub fn try_resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_ref())
    }

    /// Check if a string is already interned without interning it.
    #[inline]
    pub fn get_existing(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
