//! Query Cache
//!
//! Keyed cache of entity reads with per-entity staleness windows, plus the
//! invalidation rules applied after each kind of write.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use leptos::prelude::*;

use crate::error::{ApiError, ApiResult};
use crate::session::now_ms;

const SECOND_MS: f64 = 1000.0;
const MINUTE_MS: f64 = 60.0 * SECOND_MS;

/// Longest wait between read retries
const MAX_RETRY_DELAY_MS: u32 = 30_000;

/// Cached read identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TableGroups,
    /// Items of one table group
    YarnItems(u32),
    WhatsAppGroups,
    BroadcastHistory,
    Homepage,
}

impl QueryKey {
    /// How long a cached read is served without refetching
    pub fn stale_ms(&self) -> f64 {
        match self {
            QueryKey::YarnItems(_) => MINUTE_MS,
            QueryKey::TableGroups => 2.0 * MINUTE_MS,
            QueryKey::BroadcastHistory => 30.0 * SECOND_MS,
            QueryKey::WhatsAppGroups | QueryKey::Homepage => 5.0 * MINUTE_MS,
        }
    }

    /// Automatic retries for a failed read
    pub fn retries(&self) -> u32 {
        match self {
            QueryKey::Homepage => 3,
            _ => 1,
        }
    }
}

/// A successful write, used to decide which reads went stale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    CreateTable,
    UpdateTable { table_id: u32 },
    DeleteTable { table_id: u32 },
    ReorderTables,
    CreateItems { table_id: u32 },
    UpdateItem { table_id: u32 },
    DeleteItem { table_id: u32 },
    ReorderItems { table_id: u32 },
    CreateWhatsAppGroup,
    UpdateWhatsAppGroup,
    DeleteWhatsAppGroup,
    SendBroadcast,
}

impl Mutation {
    /// Reads that may be stale after this write succeeds
    pub fn invalidates(&self) -> Vec<QueryKey> {
        use QueryKey::*;
        match *self {
            Mutation::CreateTable | Mutation::UpdateTable { .. } | Mutation::ReorderTables => {
                vec![TableGroups, Homepage]
            }
            Mutation::DeleteTable { table_id } => vec![TableGroups, YarnItems(table_id), Homepage],
            // Item counts on the table list change with creates and deletes
            Mutation::CreateItems { table_id } | Mutation::DeleteItem { table_id } => {
                vec![YarnItems(table_id), TableGroups, Homepage]
            }
            Mutation::UpdateItem { table_id } | Mutation::ReorderItems { table_id } => {
                vec![YarnItems(table_id), Homepage]
            }
            Mutation::CreateWhatsAppGroup
            | Mutation::UpdateWhatsAppGroup
            | Mutation::DeleteWhatsAppGroup => vec![WhatsAppGroups],
            Mutation::SendBroadcast => vec![BroadcastHistory],
        }
    }
}

/// Delay before retry number `attempt` (0-based): 1s, 2s, 4s ... capped
pub fn retry_delay_ms(attempt: u32) -> u32 {
    let factor = 1u32 << attempt.min(5);
    (1000 * factor).min(MAX_RETRY_DELAY_MS)
}

struct CacheEntry {
    value: Rc<dyn Any>,
    fetched_at_ms: f64,
}

/// Cache state a read was started under
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Generation {
    epoch: u64,
    key: u64,
}

/// Timestamped values by key; callers pass the clock in.
///
/// Every removal bumps the key's generation and every clear bumps the
/// epoch, so a read started before an invalidation cannot store its result.
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    generations: HashMap<QueryKey, u64>,
    epoch: u64,
}

impl QueryCache {
    pub fn generation(&self, key: &QueryKey) -> Generation {
        Generation { epoch: self.epoch, key: self.generations.get(key).copied().unwrap_or(0) }
    }

    /// Store a read started at `started`; returns false and stores nothing
    /// when the key was invalidated since
    pub fn put<T: 'static>(&mut self, key: QueryKey, value: T, now_ms: f64, started: Generation) -> bool {
        if self.generation(&key) != started {
            return false;
        }
        self.entries.insert(key, CacheEntry { value: Rc::new(value), fetched_at_ms: now_ms });
        true
    }

    /// Cached value if still inside its staleness window
    pub fn get_fresh<T: Clone + 'static>(&self, key: &QueryKey, now_ms: f64) -> Option<T> {
        let entry = self.entries.get(key)?;
        if now_ms - entry.fetched_at_ms >= key.stale_ms() {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    pub fn remove(&mut self, key: &QueryKey) {
        self.entries.remove(key);
        *self.generations.entry(*key).or_insert(0) += 1;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.epoch += 1;
    }
}

/// Reactive query client shared through context.
///
/// Views read [`version`](Self::version) inside an effect and refetch when
/// it changes; writes bump the versions of the keys they invalidate.
#[derive(Clone, Copy)]
pub struct QueryClient {
    versions: RwSignal<HashMap<QueryKey, u32>>,
    cache: StoredValue<QueryCache, LocalStorage>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self {
            versions: RwSignal::new(HashMap::new()),
            cache: StoredValue::new_local(QueryCache::default()),
        }
    }

    /// Subscribe to invalidations of `key`
    pub fn version(&self, key: QueryKey) -> u32 {
        self.versions.with(|v| v.get(&key).copied().unwrap_or(0))
    }

    /// No invalidation of `key` happened since `version` was read.
    /// Reads check this before publishing what they fetched.
    pub fn is_current(&self, key: QueryKey, version: u32) -> bool {
        self.versions
            .try_with_untracked(|v| v.get(&key).copied().unwrap_or(0) == version)
            .unwrap_or(false)
    }

    pub fn invalidate(&self, key: QueryKey) {
        self.cache.update_value(|c| c.remove(&key));
        self.versions.update(|v| *v.entry(key).or_insert(0) += 1);
    }

    pub fn invalidate_after(&self, mutation: Mutation) {
        for key in mutation.invalidates() {
            self.invalidate(key);
        }
    }

    /// Forget everything, e.g. on logout
    pub fn clear(&self) {
        self.cache.update_value(|c| c.clear());
        self.versions.update(|v| v.values_mut().for_each(|n| *n += 1));
    }

    /// Serve `key` from cache when fresh, else run `fetcher` with retries
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ApiResult<T>
    where
        T: Clone + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        if let Some(hit) = self.cache.with_value(|c| c.get_fresh::<T>(&key, now_ms())) {
            return Ok(hit);
        }

        let started = self.cache.with_value(|c| c.generation(&key));
        let value = fetch_with_retry(key.retries(), &fetcher).await?;
        let stored = self
            .cache
            .try_update_value(|c| c.put(key, value.clone(), now_ms(), started))
            .unwrap_or(false);
        if !stored {
            log::debug!("{key:?} invalidated during fetch, result not cached");
        }
        Ok(value)
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the query client from context
pub fn use_query_client() -> QueryClient {
    expect_context::<QueryClient>()
}

async fn fetch_with_retry<T, F, Fut>(retries: u32, fetcher: &F) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && e.is_retryable() => {
                let delay = retry_delay_ms(attempt);
                log::warn!("read failed ({e}), retrying in {delay}ms");
                gloo_timers::future::TimeoutFuture::new(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Unwrap a read for display, logging auth failures distinctly
pub fn report_read_error(what: &str, err: &ApiError) -> String {
    if err.is_auth() {
        log::info!("{what}: session expired");
    } else {
        log::error!("{what}: {err}");
    }
    err.to_string()
}
