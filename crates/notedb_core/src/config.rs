//! Database configuration.

/// Default number of change events retained for [`crate::ChangeFeed::poll`].
pub const DEFAULT_CHANGE_HISTORY: usize = 10_000;

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chunk size for lazy collection views. `None` reads one page.
    pub batch_size: Option<usize>,

    /// Number of change events kept for polling.
    pub change_history: usize,

    /// Whether to install the built-in HTML engine.
    ///
    /// Without it, note titles and headlines cannot be derived from the
    /// body and attachments stay inline.
    pub markup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: None,
            change_history: DEFAULT_CHANGE_HISTORY,
            markup: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk size for lazy views.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets how many change events are kept for polling.
    #[must_use]
    pub const fn change_history(mut self, events: usize) -> Self {
        self.change_history = events;
        self
    }

    /// Sets whether the built-in HTML engine is installed.
    #[must_use]
    pub const fn markup(mut self, enabled: bool) -> Self {
        self.markup = enabled;
        self
    }
}
