use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;

use tracing::error;

use crate::{Error, PoolBuilder, RawPool, Result};

pub(crate) type Releaser<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// A thread-safe pool of reusable items of type `T`.
///
/// Items are taken out with [`get()`][Self::get] and handed back with [`put()`][Self::put].
/// When the pool has nothing cached, `get()` calls the constructor the pool was created with.
///
/// A pool may optionally have a releaser, which [`put()`][Self::put] calls on every item before
/// it becomes available to other callers. Use it to clear buffers, reset flags or erase any
/// state that must not leak to the next user of the item.
///
/// There is no bound on the number of cached items. Cached items may be dropped by
/// [`sweep()`][Self::sweep], after which `get()` transparently constructs new ones.
///
/// # Thread safety
///
/// The pool can be shared between threads (e.g. via `Arc` or a `static`) and used concurrently.
/// No ordering is guaranteed: an item put by one thread may be returned to any other thread, or
/// not at all.
///
/// # Example
///
/// ```rust
/// use typed_pool::Pool;
///
/// let pool = Pool::with_releaser(|| String::from("seed"), String::clear);
///
/// // The pool is empty, so the constructor is called.
/// let mut buffer = pool.get();
/// assert_eq!(buffer, "seed");
///
/// buffer.push_str(", grown");
///
/// // The releaser clears the buffer before it is reused.
/// pool.put(buffer);
///
/// let buffer = pool.get();
/// assert!(buffer.is_empty());
/// ```
pub struct Pool<T> {
    store: RawPool,
    release: Option<Releaser<T>>,

    _item: PhantomData<fn() -> T>,
}

impl<T> Pool<T>
where
    T: Any + Send,
{
    /// Creates a pool that calls `constructor` whenever it needs a new item.
    ///
    /// Items are cached as handed back, without being reset.
    ///
    /// # Example
    ///
    /// ```rust
    /// use typed_pool::Pool;
    ///
    /// let pool = Pool::new(|| vec![0_u8; 1024]);
    ///
    /// let buffer = pool.get();
    /// assert_eq!(buffer.len(), 1024);
    /// pool.put(buffer);
    /// ```
    #[must_use]
    pub fn new<C>(constructor: C) -> Self
    where
        C: Fn() -> T + Send + Sync + 'static,
    {
        Self::builder().constructor(constructor).build()
    }

    /// Creates a pool that calls `constructor` whenever it needs a new item and `releaser` on
    /// every item handed back to it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use typed_pool::Pool;
    ///
    /// let pool = Pool::with_releaser(Vec::<u32>::new, Vec::clear);
    ///
    /// let mut items = pool.get();
    /// items.extend([1, 2, 3]);
    /// pool.put(items);
    ///
    /// assert!(pool.get().is_empty());
    /// ```
    #[must_use]
    pub fn with_releaser<C, R>(constructor: C, releaser: R) -> Self
    where
        C: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        Self::builder()
            .constructor(constructor)
            .releaser(releaser)
            .build()
    }

    /// Returns a builder for creating a [`Pool`] with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::num::NonZero;
    ///
    /// use typed_pool::Pool;
    ///
    /// let pool = Pool::builder()
    ///     .constructor(|| 0_u64)
    ///     .releaser(|value: &mut u64| *value = 0)
    ///     .shards(NonZero::new(2).unwrap())
    ///     .build();
    /// ```
    pub fn builder() -> PoolBuilder<T> {
        PoolBuilder::new()
    }

    pub(crate) fn new_inner(store: RawPool, release: Option<Releaser<T>>) -> Self {
        Self {
            store,
            release,
            _item: PhantomData,
        }
    }

    /// Takes a cached item out of the pool or constructs a new one if none is cached.
    ///
    /// No releaser is called here; items were already reset when they were put.
    ///
    /// # Panics
    ///
    /// Panics with a "corrupt pool" message if the backing store contains a value that is not
    /// a `T`. This cannot happen through the public API of this type. Use
    /// [`try_get()`][Self::try_get] to receive this condition as an error instead.
    #[must_use]
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(item) => item,
            Err(e) => panic!("{e}"),
        }
    }

    /// Takes a cached item out of the pool or constructs a new one if none is cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptPool`] if the backing store yielded a value that is not a `T`.
    /// The offending value is dropped.
    pub fn try_get(&self) -> Result<T> {
        self.store.get().downcast::<T>().map_err(|found| {
            let expected = type_name::<T>();
            let actual = found.type_name();

            error!(expected, actual, "pool contains a value of the wrong type");

            Error::CorruptPool { expected, actual }
        })
    }

    /// Hands an item back to the pool for reuse.
    ///
    /// If the pool has a releaser, it is called on the item first.
    pub fn put(&self, mut item: T) {
        if let Some(release) = &self.release {
            release(&mut item);
        }

        self.store.put(item);
    }

    /// Ages the cached items by one generation, dropping items that have not been reused
    /// since the previous sweep.
    ///
    /// Call this periodically (or when memory is tight) to let an idle pool shrink.
    ///
    /// # Example
    ///
    /// ```rust
    /// use typed_pool::Pool;
    ///
    /// let pool = Pool::new(|| 0_u32);
    /// pool.put(42);
    ///
    /// pool.sweep();
    /// pool.sweep();
    ///
    /// // The cached item is gone, so a new one is constructed.
    /// assert_eq!(pool.get(), 0);
    /// ```
    pub fn sweep(&self) {
        self.store.sweep();
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("store", &self.store)
            .field("has_releaser", &self.release.is_some())
            .finish_non_exhaustive()
    }
}
