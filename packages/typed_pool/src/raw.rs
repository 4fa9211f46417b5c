use std::any::{Any, type_name};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::num::NonZero;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use new_zealand::nz;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::OpaqueValue;

type Fallback = Box<dyn Fn() -> OpaqueValue + Send + Sync>;

// Threads are assigned home shards round-robin, in the order they first touch any pool.
static NEXT_HOME_HINT: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static HOME_HINT: usize = NEXT_HOME_HINT.fetch_add(1, Ordering::Relaxed);
}

#[cfg_attr(test, mutants::skip)] // Any shard is correct, so mutations here only cost performance.
fn home_hint() -> usize {
    // TLS is unavailable while thread-local destructors run. Any shard is correct, just slower.
    HOME_HINT.try_with(|hint| *hint).unwrap_or_default()
}

fn default_shard_count() -> NonZero<usize> {
    thread::available_parallelism().unwrap_or(nz!(1_usize))
}

#[derive(Debug, Default)]
struct Shard {
    /// Entries put since the last sweep. The owning threads push and pop here.
    primary: Mutex<Vec<OpaqueValue>>,

    /// Entries that survived one sweep without being reused. Dropped by the next sweep.
    victim: Mutex<Vec<OpaqueValue>>,
}

/// A thread-safe store of values of any type, with a fallback that constructs a new value
/// whenever the store has nothing cached.
///
/// This is the untyped backing store of [`Pool`][crate::Pool]. It places no constraint on what
/// is put into it, so two unrelated callers sharing one `RawPool` may receive each other's
/// values. Use [`Pool`][crate::Pool] unless you need to do the type checking yourself.
///
/// # Retention
///
/// Cached values are kept until [`sweep()`][Self::sweep] is called twice without them being
/// taken out in between. No bound is placed on the number of cached values.
///
/// # Ordering
///
/// No ordering is guaranteed between threads. On a single thread with no other activity, the
/// most recently put value is the next one returned.
///
/// # Thread safety
///
/// The store is split into shards, with each thread preferring its own home shard. When the
/// home shard is empty, [`get()`][Self::get] takes values from other shards that are not
/// currently busy, without waiting for them.
///
/// # Example
///
/// ```rust
/// use typed_pool::RawPool;
///
/// let pool = RawPool::new(|| String::from("fresh"));
///
/// let value = pool.get().downcast::<String>().unwrap();
/// assert_eq!(value, "fresh");
///
/// pool.put(String::from("reused"));
///
/// let value = pool.get().downcast::<String>().unwrap();
/// assert_eq!(value, "reused");
/// ```
pub struct RawPool {
    shards: Box<[Shard]>,
    shard_count: NonZero<usize>,
    fallback: Fallback,
}

impl RawPool {
    /// Creates a store whose fallback is `fallback`, with the default number of shards.
    #[must_use]
    pub fn new<V, F>(fallback: F) -> Self
    where
        V: Any + Send,
        F: Fn() -> V + Send + Sync + 'static,
    {
        Self::builder().fallback(fallback).build()
    }

    /// Returns a builder for creating a [`RawPool`] with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::num::NonZero;
    ///
    /// use typed_pool::RawPool;
    ///
    /// let pool = RawPool::builder()
    ///     .fallback(Vec::<u8>::new)
    ///     .shards(NonZero::new(4).unwrap())
    ///     .build();
    /// ```
    pub fn builder() -> RawPoolBuilder {
        RawPoolBuilder::new()
    }

    fn new_inner(fallback: Fallback, shard_count: NonZero<usize>) -> Self {
        let shards = (0..shard_count.get()).map(|_| Shard::default()).collect();

        Self {
            shards,
            shard_count,
            fallback,
        }
    }

    /// Number of shards the store is split into.
    #[must_use]
    pub fn shard_count(&self) -> NonZero<usize> {
        self.shard_count
    }

    /// Takes a cached value out of the store or, if none is available, calls the fallback to
    /// construct a new one.
    ///
    /// The fallback runs on the calling thread, with no lock held.
    #[must_use]
    pub fn get(&self) -> OpaqueValue {
        let (home, others) = self.shards_by_affinity();

        let cached = home.primary.lock().pop();
        if let Some(value) = cached {
            return value;
        }

        for shard in others.clone() {
            if let Some(value) = shard.primary.try_lock().and_then(|mut primary| primary.pop()) {
                trace!(type_name = value.type_name(), "took cached value from another shard");
                return value;
            }
        }

        let cached = home.victim.lock().pop();
        if let Some(value) = cached {
            return value;
        }

        for shard in others {
            if let Some(value) = shard.victim.try_lock().and_then(|mut victim| victim.pop()) {
                return value;
            }
        }

        let value = (self.fallback)();
        trace!(
            type_name = value.type_name(),
            "nothing cached, constructed new value"
        );
        value
    }

    /// Places a value into the store for reuse by a future [`get()`][Self::get].
    pub fn put<V>(&self, value: V)
    where
        V: Any + Send,
    {
        self.put_opaque(OpaqueValue::new(value));
    }

    /// Places an already type-erased value into the store.
    pub fn put_opaque(&self, value: OpaqueValue) {
        let (home, _) = self.shards_by_affinity();
        home.primary.lock().push(value);
    }

    /// Ages the cached values by one generation.
    ///
    /// Values that were already aged by the previous sweep are dropped. Values put since the
    /// previous sweep remain available to [`get()`][Self::get] until the next sweep.
    pub fn sweep(&self) {
        let mut demoted: usize = 0;
        let mut dropped: usize = 0;

        for shard in &self.shards {
            // Lock order is always primary before victim.
            let expired = {
                let mut primary = shard.primary.lock();
                let mut victim = shard.victim.lock();

                demoted = demoted.saturating_add(primary.len());
                mem::replace(&mut *victim, mem::take(&mut *primary))
            };

            // Values are dropped outside the locks, as their destructors may be arbitrary code.
            dropped = dropped.saturating_add(expired.len());
            drop(expired);
        }

        debug!(demoted, dropped, "swept pool");
    }

    /// The calling thread's home shard, followed by all the others.
    fn shards_by_affinity(&self) -> (&Shard, impl Iterator<Item = &Shard> + Clone) {
        let home_index = home_hint() % self.shard_count;

        let (before, from_home) = self.shards.split_at(home_index);
        let (home, after) = from_home
            .split_first()
            .expect("home index is always reduced modulo the shard count");

        (home, after.iter().chain(before))
    }
}

impl fmt::Debug for RawPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("shard_count", &self.shard_count)
            .finish_non_exhaustive()
    }
}

/// Builder for creating an instance of [`RawPool`].
///
/// The fallback is mandatory, whereas other settings are optional.
///
/// # Examples
///
/// ```
/// use typed_pool::RawPool;
///
/// let pool = RawPool::builder().fallback(|| 0_u64).build();
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) but not thread-safe ([`Sync`]).
#[must_use]
pub struct RawPoolBuilder {
    fallback: Option<Fallback>,
    shard_count: Option<NonZero<usize>>,

    _not_sync: PhantomData<Cell<()>>,
}

impl RawPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            fallback: None,
            shard_count: None,
            _not_sync: PhantomData,
        }
    }

    /// Sets the function that constructs a new value whenever the store has nothing cached.
    pub fn fallback<V, F>(mut self, fallback: F) -> Self
    where
        V: Any + Send,
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(move || OpaqueValue::new(fallback())));
        self
    }

    /// Sets the number of shards the store is split into.
    ///
    /// Defaults to the available parallelism of the process.
    pub fn shards(mut self, count: NonZero<usize>) -> Self {
        self.shard_count = Some(count);
        self
    }

    /// Builds the store with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if no fallback has been set using [`fallback`](Self::fallback).
    #[must_use]
    pub fn build(self) -> RawPool {
        let fallback = self
            .fallback
            .expect("fallback must be set using .fallback() before calling .build()");

        RawPool::new_inner(
            fallback,
            self.shard_count.unwrap_or_else(default_shard_count),
        )
    }
}

impl fmt::Debug for RawPoolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("has_fallback", &self.fallback.is_some())
            .field("shard_count", &self.shard_count)
            .finish_non_exhaustive()
    }
}
