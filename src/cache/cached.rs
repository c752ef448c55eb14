//! The caching wrapper.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, SubsecRound};

use crate::cache::store;
use crate::cache::{
    fingerprint, CacheConfig, CacheEntry, CacheError, CacheInventory, Cacheable, CachedCallError,
    Clock, Fingerprint, Reachback, ReachbackError, SystemClock, ToCallArgs,
};
use crate::Operation;

/// Persists an operation's results on disk and serves them back.
///
/// Each call is fingerprinted from the operation name and its arguments. If
/// the newest stored result for that fingerprint was written at or after the
/// reachback cutoff it is loaded and returned without running the operation.
/// Otherwise the operation runs and its result is stored under a new
/// timestamped file. In single-version mode older files for the fingerprint
/// are then deleted; in hoard mode they are kept.
///
/// Absent results (`None`) are returned but never stored.
///
/// # Examples
///
/// ```rust
/// use steadfast::{from_fn, Cache, CacheConfig, Operation};
/// use std::cell::Cell;
///
/// let dir = tempfile::tempdir().unwrap();
/// let calls = Cell::new(0);
/// let square = from_fn("square", |(x,): &(i64,)| {
///     calls.set(calls.get() + 1);
///     Ok::<_, String>(x * x)
/// });
///
/// let config = CacheConfig::new().with_dir(dir.path());
/// let mut cached = Cache::new(square, config).unwrap();
///
/// assert_eq!(cached.call(&(12,)).unwrap(), 144);
/// assert_eq!(cached.call(&(12,)).unwrap(), 144);
/// assert_eq!(calls.get(), 1);
/// ```
pub struct Cache<Op, C = SystemClock> {
    inner: Op,
    name: String,
    dir: PathBuf,
    reachback: Reachback,
    hoard: bool,
    inventory: CacheInventory,
    clock: C,
}

impl<Op> Cache<Op> {
    /// Wrap `inner`, indexing the results already stored for it.
    ///
    /// # Errors
    ///
    /// Fails if the reachback is malformed, the operation name cannot be
    /// used in a file name, or the storage directory cannot be scanned.
    pub fn new<Args>(inner: Op, config: CacheConfig) -> Result<Self, CacheError>
    where
        Op: Operation<Args>,
    {
        Self::with_clock(inner, config, SystemClock)
    }
}

impl<Op, C: Clock> Cache<Op, C> {
    /// Like [`new`](Cache::new), reading the time from `clock`.
    pub fn with_clock<Args>(inner: Op, config: CacheConfig, clock: C) -> Result<Self, CacheError>
    where
        Op: Operation<Args>,
    {
        let name = inner.name().to_string();
        store::check_operation_name(&name)?;
        let reachback = Reachback::parse(config.reachback())?;
        let inventory = CacheInventory::scan(config.dir(), &name)?;

        Ok(Self {
            inner,
            name,
            dir: config.dir().to_path_buf(),
            reachback,
            hoard: config.hoard(),
            inventory,
            clock,
        })
    }

    /// Replace the freshness window.
    ///
    /// # Errors
    ///
    /// Returns the parse error and keeps the old window if `spec` is malformed.
    pub fn set_reachback(&mut self, spec: &str) -> Result<(), ReachbackError> {
        self.reachback = Reachback::parse(spec)?;
        Ok(())
    }

    /// The current freshness window.
    pub fn reachback(&self) -> &Reachback {
        &self.reachback
    }

    /// The name used in file names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns true if every stored result is kept.
    pub fn is_hoarding(&self) -> bool {
        self.hoard
    }

    /// Read-only view of the stored results.
    pub fn inventory(&self) -> &CacheInventory {
        &self.inventory
    }

    /// Rebuild the inventory from the storage directory, picking up files
    /// written or removed by other processes.
    pub fn rescan(&mut self) -> Result<(), CacheError> {
        self.inventory = CacheInventory::scan(&self.dir, &self.name)?;
        Ok(())
    }

    /// Get a reference to the wrapped operation.
    pub fn inner(&self) -> &Op {
        &self.inner
    }

    /// Unwrap the inner operation.
    pub fn into_inner(self) -> Op {
        self.inner
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now().trunc_subsecs(0)
    }

    /// Serve a stored result or run the operation and store its result.
    pub fn execute<Args>(&mut self, args: &Args) -> Result<Op::Output, CachedCallError<Op::Error>>
    where
        Op: Operation<Args>,
        Op::Output: Cacheable,
        Args: ToCallArgs,
    {
        let fp = fingerprint(&self.name, &args.to_call_args());
        let cutoff = self.reachback.cutoff(self.now())?;

        if let Some(entry) = self.inventory.newest(&fp) {
            if entry.created_at >= cutoff {
                tracing::debug!(
                    operation = %self.name,
                    fingerprint = %fp,
                    path = %entry.path.display(),
                    "cache hit"
                );
                return store::read(&entry.path).map_err(CachedCallError::Storage);
            }
            tracing::debug!(
                operation = %self.name,
                fingerprint = %fp,
                created_at = %entry.created_at,
                cutoff = %cutoff,
                "cached result older than reachback"
            );
        } else {
            tracing::debug!(operation = %self.name, fingerprint = %fp, "cache miss");
        }

        let result = self.inner.call(args).map_err(CachedCallError::Operation)?;
        if result.is_absent() {
            tracing::warn!(operation = %self.name, fingerprint = %fp, "operation returned no result, not caching");
            return Ok(result);
        }

        self.store(fp, &result)?;
        Ok(result)
    }

    fn store<T: Cacheable>(&mut self, fp: Fingerprint, value: &T) -> Result<(), CacheError> {
        let created_at = self.now();
        let path = store::write(&self.dir, &self.name, &fp, created_at, value)?;
        tracing::info!(operation = %self.name, path = %path.display(), "stored result");

        if !self.hoard {
            for stale in self.inventory.take(&fp) {
                if stale.path != path {
                    store::remove_stale(&stale.path);
                }
            }
        }

        self.inventory.insert(CacheEntry {
            fingerprint: fp,
            created_at,
            path,
        });
        Ok(())
    }
}

impl<Op: fmt::Debug, C> fmt::Debug for Cache<Op, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("inner", &self.inner)
            .field("dir", &self.dir)
            .field("reachback", &self.reachback)
            .field("hoard", &self.hoard)
            .field("entries", &self.inventory.len())
            .finish_non_exhaustive()
    }
}

impl<Args, Op, C> Operation<Args> for Cache<Op, C>
where
    Op: Operation<Args>,
    Op::Output: Cacheable,
    Args: ToCallArgs,
    C: Clock,
{
    type Output = Op::Output;
    type Error = CachedCallError<Op::Error>;

    fn name(&self) -> &str {
        &self.name
    }

    fn call(&mut self, args: &Args) -> Result<Self::Output, Self::Error> {
        self.execute(args)
    }
}
