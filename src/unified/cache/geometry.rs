use serde::Serialize;

use super::{decode_addr, get_bit_lens, is_power_of_two, GeometryError};

/// upper bound on `total_sets * associativity`, the line array is allocated up front
pub const MAX_LINES: u64 = 1 << 26;

/// the derived shape of a set-associative cache
///
/// - built once from (capacity, associativity, line size) and never changed.
/// - `total_sets * associativity` is the number of lines the cache allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    pub capacity_bytes: u64,
    pub line_size: u64,
    pub associativity: u64,
    pub total_sets: u64,
    pub set_index_bits: u32,
    pub block_offset_bits: u32,
    pub combined_shift: u32,
}

impl CacheGeometry {
    pub fn new(
        capacity_bytes: u64,
        associativity: u64,
        line_size: u64,
    ) -> Result<Self, GeometryError> {
        if !is_power_of_two(capacity_bytes) {
            return Err(GeometryError::NotPowerOfTwo {
                field: "cache size",
                value: capacity_bytes,
            });
        }
        if !is_power_of_two(line_size) {
            return Err(GeometryError::NotPowerOfTwo {
                field: "line size",
                value: line_size,
            });
        }
        // direct mapped is always fine
        if associativity != 1 && !is_power_of_two(associativity) {
            return Err(GeometryError::NotPowerOfTwo {
                field: "associativity",
                value: associativity,
            });
        }
        let total_sets = (capacity_bytes / line_size) / associativity;
        if total_sets == 0 {
            return Err(GeometryError::TooSmall {
                capacity: capacity_bytes,
                line_size,
                associativity,
            });
        }
        let lines = total_sets * associativity;
        if lines > MAX_LINES || usize::try_from(lines).is_err() {
            return Err(GeometryError::TooManyLines {
                lines,
                max: MAX_LINES,
            });
        }
        let set_index_bits = get_bit_lens(total_sets);
        let block_offset_bits = get_bit_lens(line_size);
        let geometry = CacheGeometry {
            capacity_bytes,
            line_size,
            associativity,
            total_sets,
            set_index_bits,
            block_offset_bits,
            combined_shift: set_index_bits + block_offset_bits,
        };
        tracing::info!(
            sets = geometry.total_sets,
            set_bits = geometry.set_index_bits,
            block_bits = geometry.block_offset_bits,
            shift = geometry.combined_shift,
            "cache geometry"
        );
        Ok(geometry)
    }

    pub fn from_kb(
        capacity_kb: u64,
        associativity: u64,
        line_size: u64,
    ) -> Result<Self, GeometryError> {
        let capacity_bytes = capacity_kb
            .checked_mul(1024)
            .ok_or(GeometryError::CapacityOverflow { capacity_kb })?;
        Self::new(capacity_bytes, associativity, line_size)
    }

    pub fn total_lines(&self) -> u64 {
        self.total_sets * self.associativity
    }

    /// (tag, set index) of `addr`
    pub fn decode(&self, addr: u64) -> (u64, u64) {
        decode_addr(addr, self.combined_shift, self.block_offset_bits)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_geometry_invariants() {
        for (size_kb, assoc, line) in [(1, 1, 16), (32, 4, 64), (512, 4, 128), (8, 8, 32)] {
            let g = CacheGeometry::from_kb(size_kb, assoc, line).unwrap();
            assert_eq!(g.total_sets * g.associativity, g.total_lines());
            assert_eq!(g.total_lines() * g.line_size, size_kb * 1024);
            assert_eq!(1u64 << g.set_index_bits, g.total_sets);
            assert_eq!(1u64 << g.block_offset_bits, g.line_size);
            assert_eq!(g.combined_shift, g.set_index_bits + g.block_offset_bits);
        }
    }

    #[test]
    fn test_small_geometry() {
        let g = CacheGeometry::new(64, 2, 16).unwrap();
        assert_eq!(g.total_sets, 2);
        assert_eq!(g.set_index_bits, 1);
        assert_eq!(g.block_offset_bits, 4);
        assert_eq!(g.combined_shift, 5);
    }

    #[test]
    fn test_fully_associative() {
        let g = CacheGeometry::new(256, 16, 16).unwrap();
        assert_eq!(g.total_sets, 1);
        assert_eq!(g.set_index_bits, 0);
        assert_eq!(g.decode(0xabcd), (0xabcd >> 4, 0));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        // 24 is even, so a parity check would have let it through
        assert_eq!(
            CacheGeometry::new(1024, 4, 24),
            Err(GeometryError::NotPowerOfTwo {
                field: "line size",
                value: 24
            })
        );
        assert_eq!(
            CacheGeometry::new(1024, 6, 16),
            Err(GeometryError::NotPowerOfTwo {
                field: "associativity",
                value: 6
            })
        );
        assert_eq!(
            CacheGeometry::from_kb(3, 2, 16),
            Err(GeometryError::NotPowerOfTwo {
                field: "cache size",
                value: 3 * 1024
            })
        );
        assert!(CacheGeometry::new(0, 1, 16).is_err());
        assert!(CacheGeometry::new(1024, 0, 16).is_err());
    }

    #[test]
    fn test_rejects_too_many_lines() {
        // 1 TB of one byte lines
        assert_eq!(
            CacheGeometry::from_kb(1 << 30, 1, 1),
            Err(GeometryError::TooManyLines {
                lines: 1 << 40,
                max: MAX_LINES
            })
        );
        // exactly at the limit is still fine
        let g = CacheGeometry::new(MAX_LINES * 16, 4, 16).unwrap();
        assert_eq!(g.total_lines(), MAX_LINES);
    }

    #[test]
    fn test_capacity_overflow() {
        assert_eq!(
            CacheGeometry::from_kb(1 << 60, 1, 64),
            Err(GeometryError::CapacityOverflow {
                capacity_kb: 1 << 60
            })
        );
    }

    #[test]
    fn test_rejects_too_small() {
        assert!(matches!(
            CacheGeometry::new(64, 8, 16),
            Err(GeometryError::TooSmall { .. })
        ));
    }
}
