//! Node advisory lock (component F).
//!
//! A time-bounded, annotation-based mutex held on a node object in the
//! orchestrator's API, so two scheduler instances don't commit conflicting
//! reservations to the same node between scoring and bind. Grounded on the
//! original `nodelock` package: a single RFC-3339 timestamp annotation,
//! reclaimed once older than [`crate::config::LockConfig::expiry`].

use crate::config::LockConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The orchestrator collaborator this module needs: read and
/// conditionally-update a node's annotation map. Implemented by the real
/// client elsewhere; tests use an in-memory fake.
#[async_trait]
pub trait NodeApiClient: Send + Sync {
    /// Fetch a node's current annotations.
    async fn get_annotations(&self, node_id: &str) -> Result<HashMap<String, String>>;

    /// Apply a compare-and-swap style update: succeeds only if the node's
    /// annotations still match `expected` at write time, returning
    /// [`Error::LockContention`] otherwise.
    async fn update_annotations(
        &self,
        node_id: &str,
        expected: &HashMap<String, String>,
        next: HashMap<String, String>,
    ) -> Result<()>;
}

/// Set the lock annotation on `node_id` to the current time.
///
/// Fails fast with [`Error::LockContention`] if the annotation is already
/// present, regardless of its age — expiry is `acquire`'s concern, not
/// `set`'s. On update failure, retries up to `config.max_retries` times,
/// refetching the node and reapplying a fresh timestamp each time, waiting
/// `config.retry_delay` between attempts. Matches the original `SetNodeLock`.
pub async fn set(client: &dyn NodeApiClient, config: &LockConfig, node_id: &str) -> Result<()> {
    let current = client.get_annotations(node_id).await?;
    if current.contains_key(&config.annotation_key) {
        return Err(Error::LockContention {
            node_id: node_id.to_string(),
            reason: "already locked".to_string(),
        });
    }

    let mut next = current.clone();
    next.insert(config.annotation_key.clone(), Utc::now().to_rfc3339());
    if client.update_annotations(node_id, &current, next).await.is_ok() {
        info!(node_id, "node lock set");
        return Ok(());
    }

    retry_update(client, config, node_id, |c| {
        let mut next = c.clone();
        next.insert(config.annotation_key.clone(), Utc::now().to_rfc3339());
        next
    })
    .await?;
    info!(node_id, "node lock set after retry");
    Ok(())
}

/// Remove the lock annotation from `node_id`, if present.
///
/// Succeeds silently if the annotation is absent. On update failure, retries
/// with the same discipline as [`set`]. Matches the original
/// `ReleaseNodeLock`.
pub async fn release(client: &dyn NodeApiClient, config: &LockConfig, node_id: &str) -> Result<()> {
    let current = client.get_annotations(node_id).await?;
    if !current.contains_key(&config.annotation_key) {
        debug!(node_id, "node lock not set");
        return Ok(());
    }

    let mut next = current.clone();
    next.remove(&config.annotation_key);
    if client.update_annotations(node_id, &current, next).await.is_ok() {
        info!(node_id, "node lock released");
        return Ok(());
    }

    retry_update(client, config, node_id, |c| {
        let mut next = c.clone();
        next.remove(&config.annotation_key);
        next
    })
    .await?;
    info!(node_id, "node lock released after retry");
    Ok(())
}

/// Attempt to acquire the lock (`tryLock`): fetch the node, and
///
/// 1. If unlocked, [`set`] it.
/// 2. If locked with an unparsable timestamp, propagate the parse error.
/// 3. If the lock is older than `config.expiry`, [`release`] it and [`set`]
///    it again.
/// 4. Otherwise fail with [`Error::LockContention`] — no retry, the caller
///    decides whether to wait and try again.
///
/// Matches the original `LockNode`.
pub async fn acquire(client: &dyn NodeApiClient, config: &LockConfig, node_id: &str) -> Result<()> {
    let current = client.get_annotations(node_id).await?;
    let Some(raw) = current.get(&config.annotation_key) else {
        return set(client, config, node_id).await;
    };

    let held_since = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| Error::TimestampParse {
            node_id: node_id.to_string(),
            source,
        })?;

    if is_expired(held_since, config) {
        warn!(node_id, "node lock expired, reclaiming");
        release(client, config, node_id).await?;
        set(client, config, node_id).await
    } else {
        Err(Error::LockContention {
            node_id: node_id.to_string(),
            reason: "recently locked".to_string(),
        })
    }
}

/// Refetch-and-reapply retry loop shared by [`set`] and [`release`]'s
/// update-failure path: up to `config.max_retries` attempts, sleeping
/// `config.retry_delay` before each refetch.
async fn retry_update(
    client: &dyn NodeApiClient,
    config: &LockConfig,
    node_id: &str,
    mutate: impl Fn(&HashMap<String, String>) -> HashMap<String, String>,
) -> Result<()> {
    for attempt in 0..config.max_retries {
        tokio::time::sleep(config.retry_delay).await;
        let current = match client.get_annotations(node_id).await {
            Ok(c) => c,
            Err(_) => continue,
        };
        let next = mutate(&current);
        if client.update_annotations(node_id, &current, next).await.is_ok() {
            return Ok(());
        }
        debug!(node_id, attempt, "lock update retry failed");
    }

    Err(Error::LockRetryExhausted {
        node_id: node_id.to_string(),
        attempts: config.max_retries,
    })
}

fn is_expired(held_since: DateTime<Utc>, config: &LockConfig) -> bool {
    let age = Utc::now().signed_duration_since(held_since);
    match chrono::Duration::from_std(config.expiry) {
        Ok(expiry) => age > expiry,
        Err(_) => true,
    }
}
