//! # dockapi Deadline Manager
//!
//! File: gateway/src/common/deadline.rs
//!
//! ## Overview
//!
//! Every engine call runs inside a `DeadlineScope`: a bounded-duration
//! cancellation context with an absolute expiry. The ceiling depends on the
//! operation class:
//!
//! | Class | Operations | Default ceiling |
//! |---|---|---|
//! | `Control` | listing, inspection, start/stop/kill/pause/rename/resize/wait, ... | 5 s |
//! | `Export` | container and image tarball export | 50 s |
//! | `Logs` | log retrieval (fully buffered) | 5 s |
//!
//! ## Architecture
//!
//! - `DeadlineManager` is cloned into the router state and opens scopes.
//! - `DeadlineScope::run` races the engine future against the expiry with
//!   `tokio::time::timeout_at`; expiry drops the engine future and yields
//!   `EngineFailure::Timeout`.
//! - Caller disconnects need no extra wiring: hyper drops the handler future,
//!   which drops both the scope and the in-flight engine future.
//! - Release is tied to `Drop`, so a scope is released exactly once on every
//!   exit path, unwinding included. `ScopeLedger` counts acquisitions and
//!   releases so leaks are observable.
//!
use crate::common::engine::{EngineFailure, EngineResult};
use crate::core::config::DeadlineConfig;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Operation classes with distinct deadline ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Control,
    Export,
    Logs,
}

/// Ceiling per operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    control: Duration,
    export: Duration,
    logs: Duration,
}

impl DeadlinePolicy {
    #[must_use]
    pub fn new(control: Duration, export: Duration, logs: Duration) -> Self {
        Self {
            control,
            export,
            logs,
        }
    }

    #[must_use]
    pub fn from_config(config: &DeadlineConfig) -> Self {
        Self::new(
            Duration::from_secs(config.default_secs),
            Duration::from_secs(config.export_secs),
            Duration::from_secs(config.logs_secs),
        )
    }

    #[must_use]
    pub fn ceiling(&self, class: OperationClass) -> Duration {
        match class {
            OperationClass::Control => self.control,
            OperationClass::Export => self.export,
            OperationClass::Logs => self.logs,
        }
    }
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self::from_config(&DeadlineConfig::default())
    }
}

/// Acquisition/release counters for deadline scopes.
#[derive(Debug, Default)]
pub struct ScopeLedger {
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl ScopeLedger {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Scopes currently alive.
    pub fn live(&self) -> usize {
        self.opened().saturating_sub(self.released())
    }
}

/// Opens deadline scopes according to a `DeadlinePolicy`.
#[derive(Debug, Clone)]
pub struct DeadlineManager {
    policy: DeadlinePolicy,
    ledger: Arc<ScopeLedger>,
}

impl DeadlineManager {
    #[must_use]
    pub fn new(policy: DeadlinePolicy) -> Self {
        Self {
            policy,
            ledger: Arc::new(ScopeLedger::default()),
        }
    }

    /// Opens a scope whose expiry is now + the ceiling of `class`.
    pub fn open(&self, class: OperationClass) -> DeadlineScope {
        let ceiling = self.policy.ceiling(class);
        self.ledger.opened.fetch_add(1, Ordering::SeqCst);
        trace!(?class, ?ceiling, "Deadline scope opened");
        DeadlineScope {
            class,
            ceiling,
            expires_at: Instant::now() + ceiling,
            ledger: Arc::clone(&self.ledger),
        }
    }

    pub fn policy(&self) -> &DeadlinePolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &ScopeLedger {
        &self.ledger
    }
}

/// A live deadline scope. Released when dropped.
#[derive(Debug)]
pub struct DeadlineScope {
    class: OperationClass,
    ceiling: Duration,
    expires_at: Instant,
    ledger: Arc<ScopeLedger>,
}

impl DeadlineScope {
    pub fn class(&self) -> OperationClass {
        self.class
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// # Bounded Call (`run`)
    ///
    /// Runs one engine call bounded by this scope.
    ///
    /// ## Arguments
    ///
    /// * `call` - The adapter future. It is dropped, cancelling the request,
    ///   when the scope expires first.
    ///
    /// ## Errors
    ///
    /// * `EngineFailure::Timeout` carrying the class ceiling when the scope
    ///   expires. An already expired scope fails without polling `call`.
    /// * Whatever `call` itself returns.
    pub async fn run<F, T>(&self, call: F) -> EngineResult<T>
    where
        F: Future<Output = EngineResult<T>>,
    {
        // Expiry is absolute; a second call in the same scope gets what is left.
        if self.is_expired() {
            return Err(EngineFailure::Timeout(self.ceiling));
        }
        match tokio::time::timeout_at(self.expires_at, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(EngineFailure::Timeout(self.ceiling)),
        }
    }
}

impl Drop for DeadlineScope {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
        trace!(class = ?self.class, "Deadline scope released");
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn short_manager() -> DeadlineManager {
        DeadlineManager::new(DeadlinePolicy::new(
            Duration::from_millis(30),
            Duration::from_millis(60),
            Duration::from_millis(30),
        ))
    }

    #[test]
    fn test_default_policy_table() {
        let policy = DeadlinePolicy::default();
        assert_eq!(policy.ceiling(OperationClass::Control), Duration::from_secs(5));
        assert_eq!(policy.ceiling(OperationClass::Export), Duration::from_secs(50));
        assert_eq!(policy.ceiling(OperationClass::Logs), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_returns_outcome_within_deadline() {
        let manager = short_manager();
        let scope = manager.open(OperationClass::Control);
        let outcome = scope.run(async { Ok::<_, EngineFailure>(42) }).await;
        assert_eq!(outcome, Ok(42));
    }

    #[tokio::test]
    async fn test_run_times_out_slow_call() {
        let manager = short_manager();
        let scope = manager.open(OperationClass::Control);
        let outcome = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, EngineFailure>(())
            })
            .await;
        assert_eq!(outcome, Err(EngineFailure::Timeout(Duration::from_millis(30))));
    }

    #[tokio::test]
    async fn test_expired_scope_never_polls_call() {
        let manager = short_manager();
        let scope = manager.open(OperationClass::Logs);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(scope.is_expired());

        let polled = std::sync::atomic::AtomicBool::new(false);
        let outcome = scope
            .run(async {
                polled.store(true, Ordering::SeqCst);
                Ok::<_, EngineFailure>(())
            })
            .await;
        assert!(matches!(outcome, Err(EngineFailure::Timeout(_))));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_ledger_balances_on_every_path() {
        let manager = short_manager();

        {
            let scope = manager.open(OperationClass::Control);
            let _ = scope.run(async { Ok::<_, EngineFailure>(()) }).await;
        }
        {
            let scope = manager.open(OperationClass::Export);
            let _ = scope
                .run(async { Err::<(), _>(EngineFailure::Transport("refused".into())) })
                .await;
        }

        let task_manager = manager.clone();
        let joined = tokio::spawn(async move {
            let _scope = task_manager.open(OperationClass::Control);
            panic!("simulated handler fault");
        })
        .await;
        assert!(joined.is_err());

        assert_eq!(manager.ledger().opened(), 3);
        assert_eq!(manager.ledger().released(), 3);
        assert_eq!(manager.ledger().live(), 0);
    }
}
