//! Cluster hits table.
//!
//! Missile racks and multi-trooper squads roll 2d6 against the column for
//! their size to find how many of their shots connect.

/// Sizes with their own column.
pub const COLUMNS: [u32; 9] = [2, 3, 4, 5, 6, 10, 15, 18, 20];

/// Hits per column, rows are 2d6 results 2 through 12.
const TABLE: [[u32; 11]; 9] = [
    [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
    [1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3],
    [1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4],
    [1, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5],
    [2, 2, 3, 3, 4, 4, 4, 5, 5, 6, 6],
    [3, 3, 4, 6, 6, 6, 6, 8, 8, 10, 10],
    [5, 5, 6, 9, 9, 9, 9, 12, 12, 15, 15],
    [6, 6, 8, 11, 11, 11, 11, 14, 14, 18, 18],
    [6, 6, 9, 12, 12, 12, 12, 16, 16, 20, 20],
];

/// Shots out of `size` that hit on a 2d6 `roll`.
///
/// Sizes without a column scale the 20 column proportionally, rounding up.
#[must_use]
pub fn hits(size: u32, roll: u8) -> u32 {
    if size <= 1 {
        return size;
    }
    let row = usize::from(roll.clamp(2, 12) - 2);
    if let Some(column) = COLUMNS.iter().position(|&c| c == size) {
        return TABLE[column][row];
    }
    let base = TABLE[COLUMNS.len() - 1][row];
    (size * base).div_ceil(20).clamp(1, size)
}

/// Split `total` damage into groups of at most `group` points.
#[must_use]
pub fn groups(total: u32, group: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }
    let group = group.max(1);
    let mut out = vec![group; (total / group) as usize];
    if total % group > 0 {
        out.push(total % group);
    }
    out
}
