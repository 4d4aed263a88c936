use crate::{StageError, StageResult};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Where a store is in its life. Transitions only go forward: `Active -> Completing -> Completed`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LifecycleState {
    /// Accepting operations.
    Active,
    /// Completion was requested. New operations are refused while in-flight ones drain.
    Completing,
    /// Every operation fails with `StoreClosed`.
    Completed,
}

#[derive(Debug)]
struct Counters {
    state: LifecycleState,
    in_flight: usize,
}

#[derive(Debug)]
struct Shared {
    counters: Mutex<Counters>,
    sender: watch::Sender<LifecycleState>,
}

/// Tracks in-flight operations and drives the completion state machine of a store.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    shared: Arc<Shared>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(LifecycleState::Active);

        Self {
            shared: Arc::new(Shared {
                counters: Mutex::new(Counters {
                    state: LifecycleState::Active,
                    in_flight: 0,
                }),
                sender,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.shared
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, counters: &mut Counters, state: LifecycleState) {
        counters.state = state;
        self.shared.sender.send_replace(state);
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Register an operation. The store cannot complete until the returned guard is dropped.
    pub fn begin_operation(&self) -> StageResult<OperationGuard> {
        let mut counters = self.lock();
        if counters.state != LifecycleState::Active {
            return Err(StageError::StoreClosed);
        }
        counters.in_flight += 1;

        Ok(OperationGuard {
            lifecycle: self.clone(),
        })
    }

    fn end_operation(&self) {
        let mut counters = self.lock();
        counters.in_flight -= 1;
        if counters.in_flight == 0 && counters.state == LifecycleState::Completing {
            self.transition(&mut counters, LifecycleState::Completed);
        }
    }

    /// Stop accepting operations and complete once in-flight ones finish. Returns `true` only for the call that started
    /// completion.
    pub fn request_completion(&self) -> bool {
        let mut counters = self.lock();
        if counters.state != LifecycleState::Active {
            return false;
        }

        let next = if counters.in_flight == 0 {
            LifecycleState::Completed
        } else {
            LifecycleState::Completing
        };
        self.transition(&mut counters, next);

        true
    }

    /// Resolves once the store is `Completed`. Any number of tasks may wait.
    pub async fn completion(&self) {
        let mut receiver = self.shared.sender.subscribe();
        loop {
            if *receiver.borrow_and_update() == LifecycleState::Completed {
                return;
            }
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Marks one in-flight store operation.
#[derive(Debug)]
pub struct OperationGuard {
    lifecycle: Lifecycle,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.lifecycle.end_operation();
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn completes_immediately_when_idle() {
        let lifecycle = Lifecycle::new();

        assert!(lifecycle.request_completion());
        assert_eq!(lifecycle.state(), LifecycleState::Completed);
        assert!(!lifecycle.request_completion());
        assert!(matches!(lifecycle.begin_operation(), Err(StageError::StoreClosed)));
    }

    #[test]
    fn completion_waits_for_in_flight_operations() {
        let lifecycle = Lifecycle::new();
        let a = lifecycle.begin_operation().unwrap();
        let b = lifecycle.begin_operation().unwrap();

        assert!(lifecycle.request_completion());
        assert_eq!(lifecycle.state(), LifecycleState::Completing);
        assert!(lifecycle.begin_operation().is_err());

        drop(a);
        assert_eq!(lifecycle.state(), LifecycleState::Completing);
        drop(b);
        assert_eq!(lifecycle.state(), LifecycleState::Completed);
    }

    #[tokio::test]
    async fn every_waiter_observes_completion() {
        let lifecycle = Lifecycle::new();
        let guard = lifecycle.begin_operation().unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let lifecycle = lifecycle.clone();
                tokio::spawn(async move { lifecycle.completion().await })
            })
            .collect();

        lifecycle.request_completion();
        tokio::task::yield_now().await;
        drop(guard);

        for waiter in waiters {
            waiter.await.unwrap();
        }
        lifecycle.completion().await;
    }
}
