use crate::{StageResult, StashConfig};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

type Create<R> = Box<dyn Fn() -> R + Send + Sync>;
type Reset<R> = Box<dyn Fn(&mut R) + Send + Sync>;
type Discard<R> = Box<dyn Fn(R) + Send + Sync>;

/// A pool of reusable resources, such as chunk storage.
///
/// Released resources go through the `reset` action and are kept idle for the next `acquire`, up to
/// `StashConfig::retained_limit`. Beyond that they go to the `discard` action (dropped by default). `acquire` and `release`
/// each take the internal mutex once, so a resource is never both idle and checked out.
pub struct ResourceStash<R> {
    idle: Mutex<Vec<R>>,
    create: Create<R>,
    reset: Reset<R>,
    discard: Option<Discard<R>>,
    retained_limit: usize,
    num_created: AtomicUsize,
    num_discarded: AtomicUsize,
}

impl<R> ResourceStash<R> {
    pub fn new(
        config: &StashConfig,
        create: impl Fn() -> R + Send + Sync + 'static,
        reset: impl Fn(&mut R) + Send + Sync + 'static,
    ) -> StageResult<Self> {
        config.validate()?;

        let stash = Self {
            idle: Mutex::new(Vec::with_capacity(config.capacity)),
            create: Box::new(create),
            reset: Box::new(reset),
            discard: None,
            retained_limit: config.retained_limit(),
            num_created: AtomicUsize::new(0),
            num_discarded: AtomicUsize::new(0),
        };

        if config.prefill {
            let resources: Vec<R> = (0..config.capacity).map(|_| stash.create_one()).collect();
            stash.lock_idle().extend(resources);
            tracing::debug!(count = config.capacity, "prefilled resource stash");
        }

        Ok(stash)
    }

    /// Called with resources released while the stash is full, instead of dropping them.
    pub fn with_discard(mut self, discard: impl Fn(R) + Send + Sync + 'static) -> Self {
        self.discard = Some(Box::new(discard));
        self
    }

    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<R>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_one(&self) -> R {
        self.num_created.fetch_add(1, Ordering::Relaxed);
        (self.create)()
    }

    /// Take an idle resource, or create one if there are none.
    pub fn acquire(&self) -> R {
        let reused = self.lock_idle().pop();
        match reused {
            Some(resource) => resource,
            None => self.create_one(),
        }
    }

    /// Reset `resource` and keep it for reuse, or discard it if the stash is full.
    pub fn release(&self, mut resource: R) {
        (self.reset)(&mut resource);

        let overflow = {
            let mut idle = self.lock_idle();
            if idle.len() < self.retained_limit {
                idle.push(resource);
                None
            } else {
                Some(resource)
            }
        };

        if let Some(resource) = overflow {
            self.num_discarded.fetch_add(1, Ordering::Relaxed);
            if let Some(discard) = &self.discard {
                discard(resource);
            }
        }
    }

    /// Apply the reset action without returning the resource to the stash.
    pub fn reset(&self, resource: &mut R) {
        (self.reset)(resource)
    }

    pub fn retained_limit(&self) -> usize {
        self.retained_limit
    }

    pub fn num_idle(&self) -> usize {
        self.lock_idle().len()
    }

    /// Total resources ever created by this stash.
    pub fn num_created(&self) -> usize {
        self.num_created.load(Ordering::Relaxed)
    }

    pub fn num_discarded(&self) -> usize {
        self.num_discarded.load(Ordering::Relaxed)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
