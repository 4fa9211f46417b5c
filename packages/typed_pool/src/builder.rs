use std::any::{Any, type_name};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::pool::Releaser;
use crate::{Pool, RawPool, RawPoolBuilder};

/// Builder for creating an instance of [`Pool`].
///
/// The constructor is mandatory, whereas other settings are optional.
///
/// # Examples
///
/// ```
/// use typed_pool::Pool;
///
/// // Pool without a releaser.
/// let pool = Pool::builder().constructor(String::new).build();
///
/// // Pool that clears strings before reusing them.
/// let pool = Pool::builder()
///     .constructor(String::new)
///     .releaser(String::clear)
///     .build();
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred between threads,
/// allowing pool configuration to happen on different threads than where the pool is used.
/// However, it is not thread-safe ([`Sync`]).
#[must_use]
pub struct PoolBuilder<T> {
    store: Option<RawPoolBuilder>,
    release: Option<Releaser<T>>,
    shard_count: Option<NonZero<usize>>,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> PoolBuilder<T>
where
    T: Any + Send,
{
    pub(crate) fn new() -> Self {
        Self {
            store: None,
            release: None,
            shard_count: None,
            _not_sync: PhantomData,
        }
    }

    /// Sets the function that creates a new item whenever the pool has nothing cached.
    pub fn constructor<C>(mut self, constructor: C) -> Self
    where
        C: Fn() -> T + Send + Sync + 'static,
    {
        self.store = Some(RawPool::builder().fallback(constructor));
        self
    }

    /// Sets the function that resets every item handed back to the pool, before any other
    /// caller can receive it.
    pub fn releaser<R>(mut self, releaser: R) -> Self
    where
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        self.release = Some(Box::new(releaser));
        self
    }

    /// Sets the number of shards the backing store is split into.
    ///
    /// Defaults to the available parallelism of the process.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZero;
    ///
    /// use typed_pool::Pool;
    ///
    /// let pool = Pool::builder()
    ///     .constructor(|| [0_u8; 64])
    ///     .shards(NonZero::new(1).unwrap())
    ///     .build();
    /// ```
    pub fn shards(mut self, count: NonZero<usize>) -> Self {
        self.shard_count = Some(count);
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if no constructor has been set using [`constructor`](Self::constructor).
    #[must_use]
    pub fn build(self) -> Pool<T> {
        let mut store = self
            .store
            .expect("constructor must be set using .constructor() before calling .build()");

        if let Some(count) = self.shard_count {
            store = store.shards(count);
        }

        Pool::new_inner(store.build(), self.release)
    }
}

impl<T> fmt::Debug for PoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("has_constructor", &self.store.is_some())
            .field("has_releaser", &self.release.is_some())
            .field("shard_count", &self.shard_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(PoolBuilder<u32>: Send, fmt::Debug);
    assert_not_impl_any!(PoolBuilder<u32>: Sync);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = PoolBuilder::<u32>::new();

        assert!(builder.store.is_none());
        assert!(builder.release.is_none());
        assert!(builder.shard_count.is_none());
    }

    #[test]
    fn constructor_is_used_by_built_pool() {
        let pool = PoolBuilder::new().constructor(|| 17_u32).build();

        assert_eq!(pool.get(), 17);
    }

    #[test]
    fn releaser_is_used_by_built_pool() {
        let pool = PoolBuilder::new()
            .constructor(|| 17_u32)
            .releaser(|value: &mut u32| *value = 3)
            .build();

        pool.put(100);
        assert_eq!(pool.get(), 3);
    }

    #[test]
    fn shards_sets_shard_count() {
        let builder = PoolBuilder::new().constructor(|| 0_u8).shards(nz!(6));
        assert_eq!(builder.shard_count, Some(nz!(6)));

        let pool = builder.build();
        assert!(format!("{pool:?}").contains("shard_count: 6"));
    }

    #[test]
    #[should_panic(expected = "constructor must be set")]
    fn build_without_constructor_panics() {
        let _pool = PoolBuilder::<u8>::new().releaser(|_| {}).build();
    }
}
