use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod aging_cache;
mod geometry;
mod line;

pub use aging_cache::AgingCache;
pub use geometry::{CacheGeometry, MAX_LINES};
pub use line::CacheLine;

/// Get the len in bits of a power-of-two value.
pub(self) fn get_bit_lens(size: u64) -> u32 {
    let mut len = 0;
    let mut temp = size;
    while temp > 1 {
        temp /= 2;
        len += 1;
    }
    len
}

pub(self) fn is_power_of_two(value: u64) -> bool {
    value > 0 && (value & (value - 1)) == 0
}

/// return the tag and the index of the set
///
/// the set index is what remains after the tag bits are subtracted back out,
/// shifted down past the block offset.
pub fn decode_addr(addr: u64, combined_shift: u32, block_offset_bits: u32) -> (u64, u64) {
    let tag = addr.checked_shr(combined_shift).unwrap_or(0);
    let tag_bits = tag.checked_shl(combined_shift).unwrap_or(0);
    let set_index = (addr - tag_bits)
        .checked_shr(block_offset_bits)
        .unwrap_or(0);
    (tag, set_index)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{field} must be a power of 2, got {value}")]
    NotPowerOfTwo { field: &'static str, value: u64 },
    #[error(
        "a {capacity} byte cache cannot hold one set of {associativity} lines of {line_size} bytes"
    )]
    TooSmall {
        capacity: u64,
        line_size: u64,
        associativity: u64,
    },
    #[error("a {capacity_kb} KB cache does not fit in 64 bits of bytes")]
    CapacityOverflow { capacity_kb: u64 },
    #[error("{lines} lines is more than the simulator can hold (at most {max})")]
    TooManyLines { lines: u64, max: u64 },
}

/// how the hit scan compares a tag against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    /// only valid lines can hit
    #[default]
    ValidOnly,
    /// compare tags only; a never-filled line (tag 0) answers a tag-0 lookup
    IgnoreValid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissKind {
    /// an invalid line in the set took the tag
    ColdFill,
    /// a valid line was overwritten
    Eviction { victim_tag: u64 },
}

#[derive(Debug, EnumAsInner)]
pub enum AccessResult {
    Hit(u64),
    Miss(u64, MissKind),
}
