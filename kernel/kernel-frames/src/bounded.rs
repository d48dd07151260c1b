use core::fmt;
use core::ops::{Index, IndexMut};

/// Error returned when pushing into a full [`BoundedVec`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("fixed-capacity container is full ({capacity} entries)")]
pub struct CapacityExceeded {
    /// The capacity that was exhausted.
    pub capacity: usize,
}

/// A vector with a fixed, compile-time capacity and no heap allocation.
///
/// Kernel data structures that hold "a few of something" (registered frame
/// pools, registered address ranges) must not allocate and must fail loudly
/// instead of growing. `BoundedVec` stores up to `N` elements inline and
/// returns [`CapacityExceeded`] from [`push`](Self::push) once full.
pub struct BoundedVec<T, const N: usize> {
    items: [Option<T>; N],
    len: usize,
}

impl<T, const N: usize> BoundedVec<T, N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: [const { None }; N],
            len: 0,
        }
    }

    /// Append `value`, returning its index.
    pub fn push(&mut self, value: T) -> Result<usize, CapacityExceeded> {
        if self.len == N {
            return Err(CapacityExceeded { capacity: N });
        }
        let index = self.len;
        self.items[index] = Some(value);
        self.len += 1;
        Ok(index)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index).and_then(Option::as_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items[..self.len].iter_mut().filter_map(Option::as_mut)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for BoundedVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Panics on out-of-bounds indices, like slice indexing.
impl<T, const N: usize> Index<usize> for BoundedVec<T, N> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!("index {index} out of bounds (len {})", self.len),
        }
    }
}

impl<T, const N: usize> IndexMut<usize> for BoundedVec<T, N> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index {index} out of bounds (len {len})"),
        }
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for BoundedVec<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_until_full() {
        let mut v: BoundedVec<u32, 3> = BoundedVec::new();
        assert!(v.is_empty());
        assert_eq!(v.push(10), Ok(0));
        assert_eq!(v.push(20), Ok(1));
        assert_eq!(v.push(30), Ok(2));
        assert_eq!(v.push(40), Err(CapacityExceeded { capacity: 3 }));
        assert_eq!(v.len(), 3);
        assert_eq!(v[1], 20);
        assert_eq!(v.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let mut v: BoundedVec<u32, 2> = BoundedVec::new();
        v.push(1).unwrap();
        assert_eq!(v.get(0), Some(&1));
        assert_eq!(v.get(1), None);
        assert_eq!(v.get(5), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn indexing_past_len_panics() {
        let v: BoundedVec<u32, 2> = BoundedVec::new();
        let _ = v[0];
    }
}
