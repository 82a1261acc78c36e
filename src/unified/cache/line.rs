/// one slot of the cache
///
/// - `age` is 0 for the line touched last in its set and grows by one on every
///   access to the set.
/// - `insertion_order` grows with `age` but only drops back to 0 when the line
///   is installed by an eviction; it breaks ties between equally aged lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u64,
    pub valid: bool,
    pub age: u64,
    pub insertion_order: u64,
}

impl CacheLine {
    pub(super) fn grow_older(&mut self) {
        self.age = self.age.saturating_add(1);
        self.insertion_order = self.insertion_order.saturating_add(1);
    }

    pub(super) fn fill(&mut self, tag: u64) {
        self.valid = true;
        self.tag = tag;
    }
}
