//! Container types
//!
//! - **`GrowableArray<T>`** - contiguous array grown with realloc, used as the
//!   backing store of the hash index buckets and the worker pool job queue

mod growable_array;

pub use growable_array::GrowableArray;
