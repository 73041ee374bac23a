//! Sentinel linear search used by list removal.

use std::mem;

/// Returns the index of the first element equal to `target`.
///
/// The last slot is temporarily overwritten with `target` so the scan loop
/// only compares elements and needs no end-of-slice check. The slot is
/// restored before returning; the slice is unchanged on exit.
pub fn sentinel_linear_search<T>(items: &mut [T], target: &T) -> Option<usize>
where
    T: PartialEq + Clone,
{
    let last = items.len().checked_sub(1)?;

    let saved = mem::replace(&mut items[last], target.clone());
    let mut i = 0;
    while items[i] != *target {
        i += 1;
    }
    items[last] = saved;

    if i < last || items[last] == *target {
        Some(i)
    } else {
        None
    }
}
