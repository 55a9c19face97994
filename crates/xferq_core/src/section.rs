//! Critical-section strategy for queue state.
//!
//! All queue and active-slot mutation happens inside a short, bounded
//! section; completions always run after the guard has been dropped, so a
//! completion is free to call straight back into the engine without
//! deadlocking.
//!
//! Two flavors are offered, chosen by [`SectionKind`] when the queue is
//! built: a scheduler-level mutex for ordinary threads, and a busy-wait
//! lock for contexts that must never park (interrupt-style executors,
//! latency-critical poll loops).

/// Mutual-exclusion strategy for the queue's internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionKind {
    /// Scheduler-level lock; contended callers park. The usual choice.
    #[default]
    Task,
    /// Busy-wait lock; contended callers spin. Safe where parking is not,
    /// at the cost of burning cycles under contention. Sections are held
    /// only for pointer and counter updates, so spins stay short.
    Interrupt,
}

/// State cell guarded by the strategy chosen at construction.
pub(crate) enum SectionLock<T> {
    Task(parking_lot::Mutex<T>),
    Interrupt(spin::Mutex<T>),
}

impl<T> SectionLock<T> {
    pub(crate) fn new(kind: SectionKind, value: T) -> Self {
        match kind {
            SectionKind::Task => Self::Task(parking_lot::Mutex::new(value)),
            SectionKind::Interrupt => Self::Interrupt(spin::Mutex::new(value)),
        }
    }

    /// Runs `f` with the state locked. The closure must stay short and
    /// must not invoke completions.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        match self {
            Self::Task(mutex) => f(&mut mutex.lock()),
            Self::Interrupt(mutex) => f(&mut mutex.lock()),
        }
    }
}
