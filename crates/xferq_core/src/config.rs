//! Queue configuration.

use crate::section::SectionKind;

/// Configuration for building a [`TransferQueue`](crate::TransferQueue).
#[derive(Debug, Clone)]
pub struct Config {
    /// Critical-section strategy guarding queue state.
    pub section: SectionKind,

    /// Transfer slots to preallocate.
    ///
    /// Submissions are allocation-free while spare slots remain; the slot
    /// arena grows on demand past this count, since queue depth is the
    /// caller's flow-control problem, not the engine's.
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            section: SectionKind::Task,
            initial_capacity: 16,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the critical-section strategy.
    #[must_use]
    pub const fn section(mut self, kind: SectionKind) -> Self {
        self.section = kind;
        self
    }

    /// Sets the number of preallocated transfer slots.
    #[must_use]
    pub const fn initial_capacity(mut self, slots: usize) -> Self {
        self.initial_capacity = slots;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.section, SectionKind::Task);
        assert_eq!(config.initial_capacity, 16);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .section(SectionKind::Interrupt)
            .initial_capacity(64);
        assert_eq!(config.section, SectionKind::Interrupt);
        assert_eq!(config.initial_capacity, 64);
    }
}
