//! Recursive bitonic compare-exchange kernel
//!
//! Pure functions over integer ranges. Nothing here knows about threads:
//! the distributor guarantees that concurrently running tasks never touch
//! overlapping ranges, so each worker calls these on its own exclusive slice.
//!
//! Recursion depth is bounded by `log2(count)`.

use super::task::Direction;

/// Merge a bitonic slice into `direction` order
pub fn merge_slice(values: &mut [i32], direction: Direction) {
    let count = values.len();
    if count <= 1 {
        return;
    }
    let half = count / 2;

    let (low, high) = values.split_at_mut(half);
    for (a, b) in low.iter_mut().zip(high.iter_mut()) {
        if direction.out_of_order(*a, *b) {
            std::mem::swap(a, b);
        }
    }

    merge_slice(low, direction);
    merge_slice(&mut high[..half], direction);
}

/// Bitonic-sort a slice into `direction` order
///
/// The left half is sorted ascending and the right half descending, which
/// makes the whole slice bitonic before the final merge.
pub fn sort_slice(values: &mut [i32], direction: Direction) {
    let count = values.len();
    if count <= 1 {
        return;
    }
    let half = count / 2;

    {
        let (low, high) = values.split_at_mut(half);
        sort_slice(low, Direction::Ascending);
        sort_slice(&mut high[..half], Direction::Descending);
    }

    merge_slice(&mut values[..half * 2], direction);
}

/// Merge `count` elements starting at `start`
///
/// Panics if the range is out of bounds.
pub fn merge(values: &mut [i32], start: usize, count: usize, direction: Direction) {
    if count <= 1 {
        return;
    }
    merge_slice(&mut values[start..start + count], direction);
}

/// Sort `count` elements starting at `start`
///
/// Panics if the range is out of bounds.
pub fn sort(values: &mut [i32], start: usize, count: usize, direction: Direction) {
    if count <= 1 {
        return;
    }
    sort_slice(&mut values[start..start + count], direction);
}

/// Index of the first adjacent pair that violates `direction`
pub fn first_disorder(values: &[i32], direction: Direction) -> Option<usize> {
    values
        .windows(2)
        .position(|w| direction.out_of_order(w[0], w[1]))
}

/// True if every adjacent pair respects `direction`
pub fn is_ordered(values: &[i32], direction: Direction) -> bool {
    first_disorder(values, direction).is_none()
}
