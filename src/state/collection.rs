//! Cached entity list shared by the domain stores.
//!
//! DESIGN
//! ======
//! Two independent guards protect a collection:
//! - A write gate (`tokio::sync::Mutex`) held by a mutating action for its
//!   whole read-modify-write, network round-trip included. Two creates,
//!   updates, or cancels on the same collection therefore never interleave.
//! - A monotonic sequence shared by fetch tickets and local changes. A fetch
//!   result lands only if no newer fetch has landed. Local changes made while
//!   a fetch is outstanding are logged with their sequence number and
//!   replayed on top of the fetched list, so a fetch overtaken by a create or
//!   a cancel keeps both the server rows and the local change.
//!
//! The change log is only kept while a fetch is outstanding and is dropped
//! once none remains. Fetches do not take the write gate; readers never block
//! on the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::error::ClientError;
use crate::net::api::{ApiClient, ApiRequest};

/// Entities addressable by a numeric id, unique within a collection.
pub trait Keyed {
    fn key(&self) -> i64;
}

/// Proof that a fetch was started; redeem with [`Collection::finish_fetch`].
///
/// Dropping an unredeemed ticket (a cancelled fetch future) still clears the
/// loading flag.
#[derive(Debug)]
#[must_use]
pub struct FetchTicket<'a> {
    seq: u64,
    in_flight: &'a AtomicUsize,
}

impl Drop for FetchTicket<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Position and value of an entry taken out by [`Collection::take`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removed<T> {
    pub index: usize,
    pub item: T,
}

type Change<T> = Arc<dyn Fn(&mut Vec<T>) + Send + Sync>;

struct Inner<T> {
    items: Vec<T>,
    /// Ticket of the newest fetch that landed.
    fetched: u64,
    /// Local changes made while a fetch was outstanding, oldest first.
    log: Vec<(u64, Change<T>)>,
}

pub struct Collection<T> {
    inner: RwLock<Inner<T>>,
    writes: Mutex<()>,
    sequence: AtomicU64,
    in_flight: AtomicUsize,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner { items: Vec::new(), fetched: 0, log: Vec::new() }),
            writes: Mutex::new(()),
            sequence: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }
}

fn position<T: Keyed>(items: &[T], id: i64) -> Option<usize> {
    items.iter().position(|item| item.key() == id)
}

impl<T: Clone + Keyed + Send + Sync + 'static> Collection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<T> {
        self.inner.read().await.items.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.items.is_empty()
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.inner.read().await.items.iter().find(|item| item.key() == id).cloned()
    }

    /// True while at least one fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    // -------------------------------------------------------------------------
    // FETCH
    // -------------------------------------------------------------------------

    pub fn begin_fetch(&self) -> FetchTicket<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        FetchTicket { seq: self.next_sequence(), in_flight: &self.in_flight }
    }

    /// Replace the contents wholesale, then replay local changes made after
    /// the ticket was issued. A result older than the newest landed fetch is
    /// discarded. Returns whether the result was applied.
    pub async fn finish_fetch(&self, ticket: FetchTicket<'_>, items: Vec<T>) -> bool {
        let mut inner = self.inner.write().await;
        let seq = ticket.seq;
        drop(ticket);

        let applied = if seq < inner.fetched {
            tracing::debug!(ticket = seq, fetched = inner.fetched, "discarding stale fetch result");
            false
        } else {
            let Inner { items: current, fetched, log } = &mut *inner;
            *current = items;
            *fetched = seq;
            let mut replayed = 0_usize;
            for (_, change) in log.iter().filter(|(at, _)| *at > seq) {
                change(&mut *current);
                replayed += 1;
            }
            if replayed > 0 {
                tracing::debug!(ticket = seq, replayed, "replayed local changes over fetch result");
            }
            true
        };

        if self.in_flight.load(Ordering::SeqCst) == 0 {
            inner.log.clear();
        }
        applied
    }

    // -------------------------------------------------------------------------
    // MUTATION
    // -------------------------------------------------------------------------

    /// Acquire the write gate. Hold it across the backend call of a mutating action.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    /// Apply a local change. `change` may run again later, on top of the
    /// result of a fetch that was outstanding when it was first applied.
    pub async fn mutate(&self, change: impl Fn(&mut Vec<T>) + Send + Sync + 'static) {
        self.record(|_| (), change).await;
    }

    /// Read `inspect` and apply `change` under one write lock.
    async fn record<R>(
        &self,
        inspect: impl FnOnce(&[T]) -> R,
        change: impl Fn(&mut Vec<T>) + Send + Sync + 'static,
    ) -> R {
        let change: Change<T> = Arc::new(change);
        let mut inner = self.inner.write().await;
        let seq = self.next_sequence();
        let result = inspect(&inner.items);
        change(&mut inner.items);
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            inner.log.push((seq, change));
        }
        result
    }

    /// Empty the collection.
    pub async fn clear(&self) {
        self.mutate(Vec::clear).await;
    }

    /// Replace the entry with `item`'s id. Returns whether one was found.
    pub async fn replace(&self, item: T) -> bool {
        let id = item.key();
        self.record(
            |items| position(items, id).is_some(),
            move |items| {
                if let Some(index) = position(items, id) {
                    items[index] = item.clone();
                }
            },
        )
        .await
    }

    /// Replace the entry with `item`'s id, or append it.
    pub async fn upsert(&self, item: T) {
        self.mutate(move |items| match position(items, item.key()) {
            Some(index) => items[index] = item.clone(),
            None => items.push(item.clone()),
        })
        .await;
    }

    /// Insert at the front unless an entry with the same id exists.
    pub async fn prepend(&self, item: T) {
        self.mutate(move |items| {
            if position(items, item.key()).is_none() {
                items.insert(0, item.clone());
            }
        })
        .await;
    }

    /// Remove the entry with `id`, remembering where it was.
    pub async fn take(&self, id: i64) -> Option<Removed<T>> {
        self.record(
            |items| position(items, id).map(|index| Removed { index, item: items[index].clone() }),
            move |items| items.retain(|item| item.key() != id),
        )
        .await
    }

    /// Put a taken entry back at its old position (clamped), unless an entry
    /// with the same id has reappeared in the meantime.
    pub async fn restore(&self, removed: Removed<T>) {
        self.mutate(move |items| {
            if position(items, removed.item.key()).is_some() {
                return;
            }
            let index = removed.index.min(items.len());
            items.insert(index, removed.item.clone());
        })
        .await;
    }

    pub async fn remove(&self, id: i64) -> bool {
        self.take(id).await.is_some()
    }
}

/// Fetch `request` into `target` under a sequence ticket.
///
/// `extract` maps the decoded body (page envelope or bare list) to items.
/// Returns the collection as it stands once the result has landed, local
/// changes made during the request included. On failure the collection is
/// reset to empty (local changes made during the request are kept) and the
/// error is logged and returned.
pub(crate) async fn fetch_into<T, R>(
    api: &ApiClient,
    target: &Collection<T>,
    request: ApiRequest,
    what: &'static str,
    extract: impl FnOnce(R) -> Vec<T>,
) -> Result<Vec<T>, ClientError>
where
    T: Clone + Keyed + Send + Sync + 'static,
    R: DeserializeOwned,
{
    let ticket = target.begin_fetch();
    match api.send_json::<R>(request).await {
        Ok(body) => {
            if !target.finish_fetch(ticket, extract(body)).await {
                tracing::debug!(what, "fetch overtaken by a newer fetch");
            }
            Ok(target.items().await)
        }
        Err(e) => {
            tracing::error!(error = %e, what, "fetch failed");
            target.finish_fetch(ticket, Vec::new()).await;
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "collection_test.rs"]
mod tests;
