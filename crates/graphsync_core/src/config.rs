//! Assembler configuration.

/// Configuration shared by every assembler of an
/// [`AssemblerContext`](crate::AssemblerContext).
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum nesting depth of one translation (`None` = unbounded).
    ///
    /// Cyclic graphs recurse without end unless a limit is set.
    pub max_depth: Option<usize>,

    /// Whether converter-less bindings must have assignable field types.
    pub strict_types: bool,

    /// Whether instances passed to an assembler must match its types.
    pub check_instance_types: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            strict_types: true,
            check_instance_types: true,
        }
    }
}

impl AssemblerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nesting depth limit.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Removes the nesting depth limit.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.max_depth = None;
        self
    }

    /// Sets whether field types are checked when pipes are built.
    #[must_use]
    pub const fn strict_types(mut self, value: bool) -> Self {
        self.strict_types = value;
        self
    }

    /// Sets whether instance types are checked on each call.
    #[must_use]
    pub const fn check_instance_types(mut self, value: bool) -> Self {
        self.check_instance_types = value;
        self
    }
}
