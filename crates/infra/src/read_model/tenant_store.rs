//! Keyed read-model storage partitioned by tenant.
//!
//! The balance, part, and alert-queue projections all sit on this trait so
//! a persistent backend can replace the in-memory one without touching
//! projection code. Everything stored here is derived from the event log
//! and can be rebuilt; `clear_tenant` drops a tenant's records ahead of a
//! rebuild.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use fleetstock_core::TenantId;

pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V>;
    fn upsert(&self, tenant_id: TenantId, key: K, value: V);
    fn list(&self, tenant_id: TenantId) -> Vec<V>;
    fn clear_tenant(&self, tenant_id: TenantId);
}

impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    S: TenantStore<K, V> + ?Sized,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        (**self).upsert(tenant_id, key, value)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        (**self).list(tenant_id)
    }

    fn clear_tenant(&self, tenant_id: TenantId) {
        (**self).clear_tenant(tenant_id)
    }
}

/// Process-local backend keeping one map per tenant.
///
/// A poisoned lock degrades reads to empty results instead of panicking;
/// the projection rebuilds from the log on restart either way.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    shards: RwLock<HashMap<TenantId, HashMap<K, V>>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        let shards = self.shards.read().ok()?;
        shards.get(&tenant_id)?.get(key).cloned()
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        if let Ok(mut shards) = self.shards.write() {
            shards.entry(tenant_id).or_default().insert(key, value);
        }
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        let Ok(shards) = self.shards.read() else {
            return Vec::new();
        };
        shards
            .get(&tenant_id)
            .map(|shard| shard.values().cloned().collect())
            .unwrap_or_default()
    }

    fn clear_tenant(&self, tenant_id: TenantId) {
        if let Ok(mut shards) = self.shards.write() {
            shards.remove(&tenant_id);
        }
    }
}
