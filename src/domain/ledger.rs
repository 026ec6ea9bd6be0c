use super::entry::ActivityEntry;

/// Insertion-ordered collection of activity entries, keyed by name.
/// Insertion order is display order. The ledger is a plain data
/// structure; the tracker that owns it emits the matching observer
/// notifications for every mutation.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<ActivityEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActivityEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    pub fn find(&self, name: &str) -> Option<&ActivityEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut ActivityEntry> {
        self.entries.iter_mut().find(|e| e.name() == name)
    }

    /// Look up the entry with `name`, appending a fresh zero-duration
    /// one if absent. Returns the index and whether it was created.
    pub fn find_or_create(&mut self, name: &str) -> (usize, bool) {
        if let Some(index) = self.position(name) {
            return (index, false);
        }
        self.entries.push(ActivityEntry::new(name));
        (self.entries.len() - 1, true)
    }

    /// Append a restored entry, replacing any earlier one with the same
    /// name so the uniqueness invariant holds even for a tampered store.
    pub fn restore(&mut self, entry: ActivityEntry) -> usize {
        if let Some(index) = self.position(entry.name()) {
            self.entries[index] = entry;
            return index;
        }
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Remove the entry with `name`, returning the index it occupied.
    pub fn remove(&mut self, name: &str) -> Option<usize> {
        let index = self.position(name)?;
        self.entries.remove(index);
        Some(index)
    }

    /// Add seconds to an existing entry, returning its index. Requires
    /// the entry to exist; returns None otherwise.
    pub fn add_seconds(&mut self, name: &str, secs: i64) -> Option<usize> {
        let index = self.position(name)?;
        self.entries[index].add_seconds(secs);
        Some(index)
    }

    /// Remove every entry, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
