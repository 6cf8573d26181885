use log::LevelFilter;

/// Configuration for a [`PathFinder`](crate::PathFinder).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FinderConfig {
    /// Most verbose diagnostic the finder emits. Events above this level are
    /// dropped before they reach the `log` facade.
    pub log_level: LevelFilter,
    /// Search steps run for each incremental job per [`tick`](crate::PathFinder::tick).
    /// Values below 1 are treated as 1.
    pub steps_per_tick: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Warn,
            steps_per_tick: 1,
        }
    }
}

impl FinderConfig {
    /// Set the diagnostic threshold.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Set how many steps each incremental job runs per tick.
    pub fn with_steps_per_tick(mut self, steps: usize) -> Self {
        self.steps_per_tick = steps;
        self
    }
}
