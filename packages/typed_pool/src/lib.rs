#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A thread-safe object pool that hands out values of one caller-defined type, amortizing
//! construction cost when the same kind of object is needed over and over.
//!
//! The main type is [`Pool`]. It is created with a constructor, which is called whenever the
//! pool has nothing cached, and optionally a releaser, which resets items as they are handed
//! back so that no state leaks from one user of an item to the next.
//!
//! # Features
//!
//! - **Statically typed**: [`Pool<T>`] only ever hands out `T`.
//! - **Never empty**: [`Pool::get()`] falls back to the constructor when nothing is cached.
//! - **Reset on release**: an optional releaser runs on every item in [`Pool::put()`].
//! - **Concurrent**: the backing store is sharded per thread, so uncontended threads do not
//!   wait for each other.
//! - **Shrinks when idle**: [`Pool::sweep()`] drops items that have not been reused since the
//!   previous sweep.
//!
//! # Example
//!
//! ```rust
//! use typed_pool::Pool;
//!
//! let pool = Pool::new(|| String::from("seed"));
//!
//! let mut buffer = pool.get();
//! assert_eq!(buffer, "seed");
//!
//! buffer.clear();
//! buffer.push_str("hello, world!");
//! pool.put(buffer);
//!
//! // Without a releaser, items are reused exactly as handed back.
//! assert_eq!(pool.get(), "hello, world!");
//! ```
//!
//! # Backing store
//!
//! [`Pool`] is a typed wrapper around [`RawPool`], a store of [`OpaqueValue`]s that places no
//! constraint on the types put into it. The pool checks the type of every value it takes out
//! of the store. Finding a value of another type means the store was corrupted, which
//! [`Pool::get()`] treats as a fatal error and [`Pool::try_get()`] reports as
//! [`Error::CorruptPool`].

mod builder;
mod error;
mod opaque;
mod pool;
mod raw;

pub use builder::*;
pub use error::*;
pub use opaque::*;
pub use pool::*;
pub use raw::*;
