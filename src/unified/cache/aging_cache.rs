use super::{AccessResult, CacheGeometry, CacheLine, MissKind, TagMatch};

/// A set-associative cache that replaces by age, breaking ties on insertion order.
///
/// - all `total_sets * associativity` lines live in one array; set `i` owns
///   `lines[i * associativity..(i + 1) * associativity]`.
/// - every access to a set ages all of its lines and makes the touched one the youngest.
pub struct AgingCache {
    geometry: CacheGeometry,
    lines: Vec<CacheLine>,
    tag_match: TagMatch,
}

impl AgingCache {
    pub fn new(geometry: CacheGeometry, tag_match: TagMatch) -> Self {
        let lines = vec![CacheLine::default(); geometry.total_lines() as usize];
        AgingCache {
            geometry,
            lines,
            tag_match,
        }
    }

    pub fn access(&mut self, addr: u64) -> AccessResult {
        let (tag, set_index) = self.geometry.decode(addr);
        let tag_match = self.tag_match;
        let set = self.set_mut(set_index);

        // hit
        if let Some(way) = set.iter().position(|line| match tag_match {
            TagMatch::ValidOnly => line.valid && line.tag == tag,
            TagMatch::IgnoreValid => line.tag == tag,
        }) {
            touch(set, way);
            tracing::trace!(addr, tag, set_index, way, "hit");
            return AccessResult::Hit(tag);
        }

        // not in the set, take the first empty way
        if let Some(way) = set.iter().position(|line| !line.valid) {
            set[way].fill(tag);
            touch(set, way);
            tracing::trace!(addr, tag, set_index, way, "cold fill");
            return AccessResult::Miss(tag, MissKind::ColdFill);
        }

        // the set is full, evict
        let way = select_victim(set);
        let victim_tag = set[way].tag;
        set[way].fill(tag);
        touch(set, way);
        set[way].insertion_order = 0;
        tracing::trace!(addr, tag, set_index, way, victim_tag, "evict");
        AccessResult::Miss(tag, MissKind::Eviction { victim_tag })
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn tag_match(&self) -> TagMatch {
        self.tag_match
    }

    /// the lines of the set `set_index`
    pub fn set(&self, set_index: u64) -> &[CacheLine] {
        let start = (set_index * self.geometry.associativity) as usize;
        &self.lines[start..start + self.geometry.associativity as usize]
    }

    fn set_mut(&mut self, set_index: u64) -> &mut [CacheLine] {
        let start = (set_index * self.geometry.associativity) as usize;
        &mut self.lines[start..start + self.geometry.associativity as usize]
    }
}

/// age every line of the set, then make `way` the youngest
fn touch(set: &mut [CacheLine], way: usize) {
    set.iter_mut().for_each(CacheLine::grow_older);
    set[way].age = 0;
}

/// the oldest line; on equal age the larger insertion order, then the lowest way
fn select_victim(set: &[CacheLine]) -> usize {
    let mut victim = 0;
    for (way, line) in set.iter().enumerate().skip(1) {
        let current = &set[victim];
        if (line.age, line.insertion_order) > (current.age, current.insertion_order) {
            victim = way;
        }
    }
    victim
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils;

    fn two_by_two() -> AgingCache {
        // 2 sets, 2 ways, 16 byte lines
        AgingCache::new(CacheGeometry::new(64, 2, 16).unwrap(), TagMatch::ValidOnly)
    }

    /// address of `tag` in set 0 of the 2x2 cache
    fn set0(tag: u64) -> u64 {
        tag << 5
    }

    #[test]
    fn test_cache() {
        test_utils::init();
        let mut cache = two_by_two();
        assert!(cache.access(0x00).as_miss().is_some());
        // same line, different offset
        assert!(cache.access(0x0f).as_hit().is_some());
        assert!(cache.access(0x20).as_miss().is_some());
        assert!(cache.access(0x00).as_hit().is_some());
        assert!(cache.access(0x30).as_miss().is_some());
        // set 0 is full now, 0x20 is the oldest
        let (tag, kind) = cache.access(0x40).into_miss().unwrap();
        assert_eq!(tag, 2);
        assert_eq!(kind, MissKind::Eviction { victim_tag: 1 });
        assert!(cache.access(0x00).as_hit().is_some());
        assert!(cache.access(0x20).as_miss().is_some());
    }

    #[test]
    fn test_repeated_hit_is_youngest() {
        let mut cache = two_by_two();
        cache.access(set0(3));
        cache.access(set0(4));
        assert!(cache.access(set0(3)).as_hit().is_some());
        assert!(cache.access(set0(3)).as_hit().is_some());
        let line = cache.set(0).iter().find(|line| line.tag == 3).unwrap();
        assert_eq!(line.age, 0);
    }

    #[test]
    fn test_capacity() {
        let geometry = CacheGeometry::new(1024, 8, 16).unwrap();
        let mut cache = AgingCache::new(geometry, TagMatch::ValidOnly);
        let stride = 1u64 << geometry.combined_shift;
        for tag in 1..=8u64 {
            let result = cache.access(tag * stride);
            assert_eq!(result.into_miss().unwrap().1, MissKind::ColdFill);
        }
        for tag in 1..=8u64 {
            assert!(cache.access(tag * stride).as_hit().is_some());
        }
        assert!(cache.set(0).iter().all(|line| line.valid));
        // the other sets never got touched
        assert!(cache.set(1).iter().all(|line| !line.valid));
    }

    #[test]
    fn test_first_empty_way_is_filled() {
        let mut cache = two_by_two();
        cache.access(set0(7));
        assert_eq!(cache.set(0)[0].tag, 7);
        assert!(cache.set(0)[0].valid);
        assert!(!cache.set(0)[1].valid);
    }

    #[test]
    fn test_aging_counters() {
        let mut cache = two_by_two();
        cache.access(set0(1));
        cache.access(set0(2));
        cache.access(set0(1));
        let set = cache.set(0);
        assert_eq!((set[0].age, set[0].insertion_order), (0, 3));
        assert_eq!((set[1].age, set[1].insertion_order), (1, 3));

        // tag 2 is the oldest, gets replaced and its insertion order restarts
        cache.access(set0(5));
        let set = cache.set(0);
        assert_eq!(set[1].tag, 5);
        assert_eq!((set[1].age, set[1].insertion_order), (0, 0));
        assert_eq!((set[0].age, set[0].insertion_order), (1, 4));
    }

    #[test]
    fn test_victim_tie_break() {
        let line = |age, insertion_order| CacheLine {
            tag: 0,
            valid: true,
            age,
            insertion_order,
        };
        assert_eq!(select_victim(&[line(3, 1), line(3, 5), line(0, 9)]), 1);
        assert_eq!(select_victim(&[line(3, 5), line(3, 1), line(0, 9)]), 0);
        // age wins over insertion order
        assert_eq!(select_victim(&[line(1, 9), line(2, 0)]), 1);
        // full tie keeps the lowest way
        assert_eq!(select_victim(&[line(2, 2), line(2, 2)]), 0);
    }

    #[test]
    fn test_direct_mapped_swaps() {
        // a direct-mapped set of one line just swaps tags
        let geometry = CacheGeometry::new(16, 1, 16).unwrap();
        let mut cache = AgingCache::new(geometry, TagMatch::ValidOnly);
        assert!(cache.access(0x10).as_miss().is_some());
        let (_, kind) = cache.access(0x20).into_miss().unwrap();
        assert_eq!(kind, MissKind::Eviction { victim_tag: 1 });
        assert!(cache.access(0x20).as_hit().is_some());
    }

    #[test]
    fn test_tag_zero_on_cold_cache() {
        let mut cache = two_by_two();
        assert!(cache.access(0x00).as_miss().is_some());

        let geometry = CacheGeometry::new(64, 2, 16).unwrap();
        let mut legacy = AgingCache::new(geometry, TagMatch::IgnoreValid);
        // the zeroed line answers for tag 0 even though nothing was filled
        assert!(legacy.access(0x00).as_hit().is_some());
        assert!(!legacy.set(0)[0].valid);
        assert_eq!(legacy.tag_match(), TagMatch::IgnoreValid);
    }
}
