//! GrowableArray: contiguous resizable array grown with realloc
//!
//! The array keeps its capacity and length in the struct next to the owning
//! buffer pointer. Growth goes through `realloc`, which lets the allocator
//! extend the block in place when it can.
//!
//! Growth policy: an append grows when `len + 1 >= capacity`, and every
//! growth picks `2 * capacity + increment` (or just `increment` for the first
//! allocation). A bulk reserve of `k` elements is therefore satisfied by a
//! single reallocation, and repeated appends see capacities 1, 3, 7, 15, ...
//!
//! Appends grow one element early (`len + 1 >= capacity`), while
//! `reserve(k)` grows only when `len + k > capacity`: a reserve that exactly
//! fits leaves the buffer alone.

use crate::error::{PrimkitError, Result};
use crate::error_recovery::fatal_error;
use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

/// Contiguous growable array with explicit capacity/length bookkeeping
///
/// Allocation failure on the infallible methods (`push`, `reserve`, ...) is
/// fatal; use the `try_` variants to get [`PrimkitError::OutOfMemory`] back
/// instead.
///
/// # Examples
///
/// ```rust
/// use primkit::GrowableArray;
///
/// let mut arr = GrowableArray::new();
/// arr.push(42);
/// arr.push(84);
/// assert_eq!(arr.len(), 2);
/// assert_eq!(arr[0], 42);
/// assert_eq!(arr.pop(), Some(84));
/// ```
pub struct GrowableArray<T> {
    ptr: Option<NonNull<T>>,
    len: usize,
    cap: usize,
}

impl<T> GrowableArray<T> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// Create a new empty array without allocating
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: None,
            len: 0,
            cap: 0,
        }
    }

    /// Create an array with room for exactly `cap` elements
    pub fn with_capacity(cap: usize) -> Self {
        match Self::try_with_capacity(cap) {
            Ok(arr) => arr,
            Err(e) => fatal_error(&e),
        }
    }

    /// Fallible form of [`with_capacity`](Self::with_capacity)
    pub fn try_with_capacity(cap: usize) -> Result<Self> {
        let mut arr = Self::new();
        if cap > 0 {
            arr.realloc_exact(cap)?;
        }
        Ok(arr)
    }

    /// Create an array of `len` copies of `value`
    pub fn filled(len: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut arr = Self::with_capacity(len);
        for _ in 0..len {
            // SAFETY: capacity is exactly `len`, so every write is in bounds.
            unsafe { ptr::write(arr.as_mut_ptr().add(arr.len), value.clone()) };
            arr.len += 1;
        }
        arr
    }

    /// Number of elements in use
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the array is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the buffer can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Raw pointer to the buffer, null when nothing is allocated
    ///
    /// The pointer is invalidated by any call that grows the array.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => ptr::null(),
        }
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        match self.ptr {
            Some(ptr) => ptr.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    /// View the elements in use as a slice
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            // SAFETY: the first `len` elements are initialized.
            Some(ptr) if self.len > 0 => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.len) },
            _ => &[],
        }
    }

    /// View the elements in use as a mutable slice
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.ptr {
            // SAFETY: the first `len` elements are initialized.
            Some(ptr) if self.len > 0 => unsafe {
                slice::from_raw_parts_mut(ptr.as_ptr(), self.len)
            },
            _ => &mut [],
        }
    }

    /// Append an element, growing first when `len + 1 >= capacity`
    #[inline]
    pub fn push(&mut self, value: T) {
        if let Err(e) = self.try_push(value) {
            fatal_error(&e);
        }
    }

    /// Fallible form of [`push`](Self::push)
    pub fn try_push(&mut self, value: T) -> Result<()> {
        if self.needs_grow(1) {
            self.grow(1)?;
        }
        // SAFETY: growth guarantees `len < cap`.
        unsafe { ptr::write(self.as_mut_ptr().add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Ensure room for at least `additional` more elements
    ///
    /// Length is unchanged. Growth happens only when `len + additional`
    /// exceeds the capacity (an exact fit is left alone, unlike the
    /// `len + 1 >= capacity` trigger of [`push`](Self::push)); the new
    /// capacity is then `2 * capacity + additional`.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            fatal_error(&e);
        }
    }

    /// Fallible form of [`reserve`](Self::reserve)
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or_else(|| PrimkitError::out_of_memory(usize::MAX))?;
        if required <= self.cap {
            return Ok(());
        }
        self.grow(additional)
    }

    /// Append `n` default elements and return them as a mutable slice
    pub fn add(&mut self, n: usize) -> &mut [T]
    where
        T: Default,
    {
        self.reserve(n);
        let start = self.len;
        for _ in 0..n {
            // SAFETY: capacity for `n` more elements was reserved above.
            unsafe { ptr::write(self.as_mut_ptr().add(self.len), T::default()) };
            self.len += 1;
        }
        &mut self.as_mut_slice()[start..]
    }

    /// Append clones of every element in `items`
    pub fn extend_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.reserve(items.len());
        for item in items {
            // SAFETY: capacity for `items.len()` more elements was reserved above.
            unsafe { ptr::write(self.as_mut_ptr().add(self.len), item.clone()) };
            self.len += 1;
        }
    }

    /// Remove and return the last element, or `None` when empty
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            // SAFETY: the element at the old `len - 1` is initialized and is
            // no longer counted as part of the array.
            Some(unsafe { ptr::read(self.as_ptr().add(self.len)) })
        }
    }

    /// Remove the element at `index`, moving the last element into its place
    pub fn swap_remove(&mut self, index: usize) -> Result<T> {
        crate::error::check_bounds(index, self.len)?;

        let last = self.len - 1;
        // SAFETY: both `index` and `last` are below `len`; the slot at `last`
        // is logically removed before anything else can observe it.
        unsafe {
            let base = self.as_mut_ptr();
            let value = ptr::read(base.add(index));
            if index != last {
                ptr::copy_nonoverlapping(base.add(last), base.add(index), 1);
            }
            self.len = last;
            Ok(value)
        }
    }

    /// Drop every element; the buffer is kept for reuse
    pub fn clear(&mut self) {
        let len = self.len;
        if len == 0 {
            return;
        }
        // Length goes to zero first so a panicking destructor cannot cause a double drop.
        self.len = 0;
        // SAFETY: the buffer is allocated and its first `len` elements were initialized.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), len));
        }
    }

    /// Shrink the buffer to exactly `len` elements
    ///
    /// This is the only operation that lowers capacity.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.len == self.cap {
            return Ok(());
        }
        if self.len == 0 {
            self.release();
            return Ok(());
        }
        self.realloc_exact(self.len)
    }

    #[inline]
    fn needs_grow(&self, increment: usize) -> bool {
        self.ptr.is_none() || self.len.saturating_add(increment) >= self.cap
    }

    /// Grow by the doubling-plus-increment policy
    fn grow(&mut self, increment: usize) -> Result<()> {
        let new_cap = if self.cap == 0 {
            increment.max(1)
        } else {
            self.cap
                .checked_mul(2)
                .and_then(|c| c.checked_add(increment))
                .ok_or_else(|| PrimkitError::out_of_memory(usize::MAX))?
        };
        log::trace!(
            "GrowableArray<{}>: growing {} -> {} elements",
            std::any::type_name::<T>(),
            self.cap,
            new_cap
        );
        self.realloc_exact(new_cap)
    }

    /// Move the buffer to an allocation of exactly `new_cap` elements
    fn realloc_exact(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap >= self.len);

        if Self::IS_ZST {
            self.ptr = Some(NonNull::dangling());
            self.cap = new_cap;
            return Ok(());
        }

        let new_layout = Layout::array::<T>(new_cap)
            .map_err(|_| PrimkitError::out_of_memory(new_cap.saturating_mul(mem::size_of::<T>())))?;

        let new_ptr = match self.ptr {
            Some(ptr) if self.cap > 0 => {
                // SAFETY: `ptr` was allocated with the layout of `cap` elements,
                // which is known to be valid because it was created before.
                unsafe {
                    let old_layout = Layout::array::<T>(self.cap).unwrap_unchecked();
                    alloc::realloc(ptr.as_ptr() as *mut u8, old_layout, new_layout.size()) as *mut T
                }
            }
            // SAFETY: `new_layout` has a non-zero size here.
            _ => unsafe { alloc::alloc(new_layout) as *mut T },
        };

        let ptr = NonNull::new(new_ptr)
            .ok_or_else(|| PrimkitError::out_of_memory(new_layout.size()))?;
        self.ptr = Some(ptr);
        self.cap = new_cap;
        Ok(())
    }

    /// Free the buffer; callers must have dropped the elements already
    fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            if !Self::IS_ZST && self.cap > 0 {
                // SAFETY: `ptr` was allocated with the layout of `cap` elements.
                unsafe {
                    let layout = Layout::array::<T>(self.cap).unwrap_unchecked();
                    alloc::dealloc(ptr.as_ptr() as *mut u8, layout);
                }
            }
        }
        self.cap = 0;
    }
}

impl<T> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for GrowableArray<T> {
    fn drop(&mut self) {
        self.clear();
        self.release();
    }
}

impl<T> Deref for GrowableArray<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for GrowableArray<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T> Index<usize> for GrowableArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for GrowableArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.as_mut_slice()[index]
    }
}

impl<'a, T> IntoIterator for &'a GrowableArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for GrowableArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for GrowableArray<T> {}

impl<T: Clone> Clone for GrowableArray<T> {
    fn clone(&self) -> Self {
        let mut arr = Self::with_capacity(self.len);
        arr.extend_from_slice(self.as_slice());
        arr
    }
}

// SAFETY: GrowableArray<T> owns its elements exactly like Vec<T>.
unsafe impl<T: Send> Send for GrowableArray<T> {}

// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for GrowableArray<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new() {
        let arr: GrowableArray<i32> = GrowableArray::new();
        assert_eq!(arr.len(), 0);
        assert_eq!(arr.capacity(), 0);
        assert!(arr.is_empty());
        assert!(arr.as_ptr().is_null());
    }

    #[test]
    fn test_with_capacity() {
        let arr: GrowableArray<i32> = GrowableArray::with_capacity(10);
        assert_eq!(arr.len(), 0);
        assert_eq!(arr.capacity(), 10);

        let empty: GrowableArray<i32> = GrowableArray::try_with_capacity(0).unwrap();
        assert_eq!(empty.capacity(), 0);
        assert!(empty.as_ptr().is_null());
    }

    #[test]
    fn test_push_pop() {
        let mut arr = GrowableArray::new();
        arr.push(1);
        arr.push(2);
        arr.push(3);

        assert_eq!(arr.len(), 3);
        assert_eq!(arr.pop(), Some(3));
        assert_eq!(arr.pop(), Some(2));
        assert_eq!(arr.len(), 1);
        assert_eq!(arr.pop(), Some(1));
        assert_eq!(arr.pop(), None);
    }

    #[test]
    fn test_growth_sequence() {
        let mut arr = GrowableArray::new();
        let mut caps = vec![arr.capacity()];
        for i in 0..8 {
            arr.push(i);
            if *caps.last().unwrap() != arr.capacity() {
                caps.push(arr.capacity());
            }
        }
        assert_eq!(caps, vec![0, 1, 3, 7, 15]);
    }

    #[test]
    fn test_reserve_single_reallocation() {
        let mut arr: GrowableArray<u64> = GrowableArray::new();
        arr.reserve(100);
        assert_eq!(arr.capacity(), 100);
        assert_eq!(arr.len(), 0);

        // Already satisfied
        arr.reserve(50);
        assert_eq!(arr.capacity(), 100);

        arr.push(1);
        arr.reserve(200);
        assert_eq!(arr.capacity(), 2 * 100 + 200);
        assert_eq!(arr.as_slice(), &[1]);
    }

    #[test]
    fn test_reserve_exact_fit_vs_push_trigger() {
        let mut arr: GrowableArray<u32> = GrowableArray::with_capacity(4);
        arr.extend_from_slice(&[1, 2, 3]);
        assert_eq!(arr.capacity(), 4);

        // len + 1 == cap: reserve leaves the buffer alone
        arr.reserve(1);
        assert_eq!(arr.capacity(), 4);

        // the same condition makes push grow
        arr.push(4);
        assert_eq!(arr.capacity(), 2 * 4 + 1);
        assert_eq!(arr.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_try_reserve_overflow() {
        let mut arr: GrowableArray<u64> = GrowableArray::new();
        arr.push(7);
        let err = arr.try_reserve(usize::MAX).unwrap_err();
        assert_eq!(err.category(), "memory");
        assert_eq!(arr.as_slice(), &[7]);
    }

    #[test]
    fn test_filled() {
        let arr = GrowableArray::filled(5, 42u8);
        assert_eq!(arr.len(), 5);
        assert_eq!(arr.capacity(), 5);
        assert!(arr.iter().all(|&v| v == 42));
    }

    #[test]
    fn test_add() {
        let mut arr: GrowableArray<u32> = GrowableArray::new();
        arr.push(9);
        let tail = arr.add(3);
        assert_eq!(tail.len(), 3);
        tail[0] = 1;
        tail[2] = 3;
        assert_eq!(arr.as_slice(), &[9, 1, 0, 3]);
    }

    #[test]
    fn test_swap_remove() {
        let mut arr = GrowableArray::new();
        arr.extend_from_slice(&[10, 20, 30, 40]);

        assert_eq!(arr.swap_remove(1).unwrap(), 20);
        assert_eq!(arr.as_slice(), &[10, 40, 30]);

        assert_eq!(arr.swap_remove(2).unwrap(), 30);
        assert_eq!(arr.as_slice(), &[10, 40]);

        assert!(arr.swap_remove(2).is_err());
    }

    #[test]
    fn test_clear_keeps_buffer() {
        let mut arr = GrowableArray::new();
        for i in 0..10 {
            arr.push(i);
        }
        let cap = arr.capacity();
        let ptr = arr.as_ptr();

        arr.clear();
        assert!(arr.is_empty());
        assert_eq!(arr.capacity(), cap);
        assert_eq!(arr.as_ptr(), ptr);
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut arr = GrowableArray::with_capacity(100);
        arr.push(1);
        arr.push(2);
        arr.push(3);

        arr.shrink_to_fit().unwrap();
        assert_eq!(arr.capacity(), 3);
        assert_eq!(arr.as_slice(), &[1, 2, 3]);

        let mut empty: GrowableArray<i32> = GrowableArray::with_capacity(50);
        empty.shrink_to_fit().unwrap();
        assert_eq!(empty.capacity(), 0);
        assert!(empty.as_ptr().is_null());
    }

    #[test]
    fn test_index_and_deref() {
        let mut arr = GrowableArray::new();
        arr.push(42);
        arr.push(84);
        arr[0] = 100;

        let slice: &[i32] = &arr;
        assert_eq!(slice, &[100, 84]);
        assert_eq!(arr.last(), Some(&84));
    }

    #[test]
    #[should_panic]
    fn test_index_bounds() {
        let arr: GrowableArray<i32> = GrowableArray::new();
        let _ = arr[0];
    }

    #[test]
    fn test_clone_and_eq() {
        let mut arr = GrowableArray::new();
        arr.extend_from_slice(&["a".to_string(), "b".to_string()]);
        let cloned = arr.clone();
        assert_eq!(arr, cloned);

        arr.push("c".to_string());
        assert_ne!(arr, cloned);
        assert_eq!(format!("{:?}", cloned), r#"["a", "b"]"#);
    }

    #[test]
    fn test_drop_elements() {
        #[derive(Clone)]
        struct DropCounter(Arc<AtomicUsize>);

        impl Drop for DropCounter {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut arr = GrowableArray::new();
            for _ in 0..5 {
                arr.push(DropCounter(counter.clone()));
            }

            drop(arr.swap_remove(0).unwrap());
            assert_eq!(counter.load(Ordering::SeqCst), 1);

            drop(arr.pop());
            assert_eq!(counter.load(Ordering::SeqCst), 2);

            arr.clear();
            assert_eq!(counter.load(Ordering::SeqCst), 5);

            arr.push(DropCounter(counter.clone()));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_zero_sized_elements() {
        let mut arr = GrowableArray::new();
        for _ in 0..1000 {
            arr.push(());
        }
        assert_eq!(arr.len(), 1000);
        assert_eq!(arr.pop(), Some(()));
        arr.shrink_to_fit().unwrap();
        assert_eq!(arr.capacity(), 999);
    }

    #[test]
    fn test_large_growth() {
        let mut arr = GrowableArray::new();
        for i in 0..10_000u64 {
            arr.push(i);
            assert!(arr.len() <= arr.capacity());
        }
        assert_eq!(arr.len(), 10_000);
        assert_eq!(arr[9_999], 9_999);
        assert!(arr.iter().enumerate().all(|(i, &v)| v == i as u64));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<GrowableArray<i32>>();
        assert_sync::<GrowableArray<i32>>();
    }
}
