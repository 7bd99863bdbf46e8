//! Session-scoped engine registry
//!
//! Each run claims a session id and a pair of regression engines keyed
//! at `2n` and `2n + 1`, one per concurrent branch. The orchestrator
//! releases the pair on every exit path; stages never release engines
//! themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::numeric::regression::RegressionEngine;

pub type SharedEngine = Arc<Mutex<RegressionEngine>>;

/// Engines claimed for one run
#[derive(Debug, Clone)]
pub struct EnginePair {
    pub session_id: i64,
    pub products_engine: SharedEngine,
    pub services_engine: SharedEngine,
}

#[derive(Debug, Clone)]
pub struct EngineRegistry {
    next_session_id: Arc<AtomicI64>,
    engines: Arc<RwLock<HashMap<i64, SharedEngine>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            next_session_id: Arc::new(AtomicI64::new(1)),
            engines: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Claims the next session id.
    pub fn allocate_session_id(&self) -> i64 {
        self.next_session_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Registers fresh engines for a session under keys `2n` and `2n + 1`.
    pub async fn register_pair(&self, session_id: i64) -> EnginePair {
        let products_engine: SharedEngine = Arc::new(Mutex::new(RegressionEngine::new()));
        let services_engine: SharedEngine = Arc::new(Mutex::new(RegressionEngine::new()));

        let mut engines = self.engines.write().await;
        engines.insert(session_id * 2, products_engine.clone());
        engines.insert(session_id * 2 + 1, services_engine.clone());

        EnginePair {
            session_id,
            products_engine,
            services_engine,
        }
    }

    /// Drops both engine slots for a session. Safe to call for sessions
    /// that were never registered or were already released.
    pub async fn release_pair(&self, session_id: i64) {
        let mut engines = self.engines.write().await;
        engines.remove(&(session_id * 2));
        engines.remove(&(session_id * 2 + 1));
    }

    pub async fn contains(&self, session_id: i64) -> bool {
        let engines = self.engines.read().await;
        engines.contains_key(&(session_id * 2)) || engines.contains_key(&(session_id * 2 + 1))
    }

    /// Number of registered engine slots across all live sessions.
    pub async fn engine_count(&self) -> usize {
        self.engines.read().await.len()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_ids_start_at_one_and_increment() {
        let registry = EngineRegistry::new();
        assert_eq!(registry.allocate_session_id(), 1);
        assert_eq!(registry.allocate_session_id(), 2);
        assert_eq!(registry.allocate_session_id(), 3);
    }

    #[tokio::test]
    async fn test_register_claims_adjacent_even_odd_slots() {
        let registry = EngineRegistry::new();
        let pair = registry.register_pair(5).await;

        assert_eq!(pair.session_id, 5);
        assert!(registry.contains(5).await);
        assert_eq!(registry.engine_count().await, 2);

        let engines = registry.engines.read().await;
        assert!(engines.contains_key(&10));
        assert!(engines.contains_key(&11));
    }

    #[tokio::test]
    async fn test_sessions_do_not_collide() {
        let registry = EngineRegistry::new();
        registry.register_pair(1).await;
        registry.register_pair(2).await;

        assert_eq!(registry.engine_count().await, 4);

        registry.release_pair(1).await;
        assert!(!registry.contains(1).await);
        assert!(registry.contains(2).await);
        assert_eq!(registry.engine_count().await, 2);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let registry = EngineRegistry::new();
        registry.register_pair(1).await;

        registry.release_pair(1).await;
        registry.release_pair(1).await;
        registry.release_pair(99).await;

        assert_eq!(registry.engine_count().await, 0);
    }

    #[tokio::test]
    async fn test_branch_engines_are_distinct() {
        let registry = EngineRegistry::new();
        let pair = registry.register_pair(1).await;
        assert!(!Arc::ptr_eq(&pair.products_engine, &pair.services_engine));
    }
}
