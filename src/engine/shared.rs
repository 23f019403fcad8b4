//! Array handle shared by the distributor and all workers
//!
//! During a phase each task owns a disjoint index range of the array. The
//! handle hands out `&mut [i32]` views of those ranges without a lock; the
//! coordination mutex around claim/complete/publish orders every write of one
//! phase before every read of the next.

use std::cell::UnsafeCell;
use std::ops::Range;

pub struct SharedArray {
    cells: Vec<UnsafeCell<i32>>,
}

// SAFETY: cells are only accessed through `range_mut`, whose callers
// guarantee that ranges in use at the same time are disjoint.
unsafe impl Sync for SharedArray {}

impl SharedArray {
    /// Take ownership of the values
    ///
    /// `UnsafeCell<i32>` has the layout of `i32`, so the collect reuses the
    /// allocation of `values` instead of copying into a second buffer.
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            cells: values.into_iter().map(UnsafeCell::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Exclusive view of `range`
    ///
    /// Panics if the range is out of bounds.
    ///
    /// # Safety
    ///
    /// No other live reference (from this or any other thread) may overlap
    /// `range` while the returned slice is in use.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn range_mut(&self, range: Range<usize>) -> &mut [i32] {
        let cells = &self.cells[range];
        // UnsafeCell<i32> has the same layout as i32.
        let ptr = UnsafeCell::raw_get(cells.as_ptr());
        std::slice::from_raw_parts_mut(ptr, cells.len())
    }

    /// Give the values back
    pub fn into_vec(self) -> Vec<i32> {
        self.cells
            .into_iter()
            .map(UnsafeCell::into_inner)
            .collect()
    }
}

impl std::fmt::Debug for SharedArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedArray")
            .field("len", &self.len())
            .finish()
    }
}
