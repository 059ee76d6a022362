//! Buffer configuration.

/// Options controlling what a [`ParagraphBuffer`](crate::ParagraphBuffer) does after each
/// commit.
///
/// ```rust
/// use paragraph_index::SyncOptions;
///
/// let options = SyncOptions::default().verify_invariants(true).style_pass(false);
/// assert!(options.verifies_invariants());
/// assert!(!options.runs_style_pass());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    verify_invariants: bool,
    style_pass: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            verify_invariants: cfg!(debug_assertions),
            style_pass: true,
        }
    }
}

impl SyncOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the table against the buffer after every commit.
    pub fn verify_invariants(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    /// Ask the observer for paragraph styles after every commit.
    pub fn style_pass(mut self, enabled: bool) -> Self {
        self.style_pass = enabled;
        self
    }

    /// Whether invariants are checked after commits
    pub fn verifies_invariants(&self) -> bool {
        self.verify_invariants
    }

    /// Whether the style pass runs after commits
    pub fn runs_style_pass(&self) -> bool {
        self.style_pass
    }
}
