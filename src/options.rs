//! Configuration options for Dson readers and writers.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{to_vec_with_options, DsonOptions, DsonValue, DsonObject};
//!
//! let options = DsonOptions::new()
//!     .with_recursion_limit(16)
//!     .with_buffer_capacity(1024);
//!
//! let values: Vec<DsonValue> = vec![DsonValue::Object(DsonObject::new())];
//! let bytes = to_vec_with_options(&values, options).unwrap();
//! assert_eq!(bytes.len(), 5);
//! ```

/// Default ceiling on simultaneously open containers.
pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// Configuration shared by every reader and writer.
///
/// # Examples
///
/// ```rust
/// use dson::DsonOptions;
///
/// let options = DsonOptions::new();
/// assert_eq!(options.recursion_limit, 64);
/// assert!(!options.auto_close);
///
/// let options = DsonOptions::new()
///     .with_recursion_limit(8)
///     .with_auto_close(true);
/// assert_eq!(options.recursion_limit, 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DsonOptions {
    /// Maximum number of containers open at the same time, on both encode and decode.
    pub recursion_limit: usize,
    /// When set, closing a writer flushes and drops its sink, and closing a
    /// reader releases its source.
    pub auto_close: bool,
    /// Initial capacity of the binary writer's staging buffer.
    pub buffer_capacity: usize,
}

impl Default for DsonOptions {
    fn default() -> Self {
        DsonOptions {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            auto_close: false,
            buffer_capacity: 256,
        }
    }
}

impl DsonOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum container nesting depth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonOptions;
    ///
    /// let options = DsonOptions::new().with_recursion_limit(2);
    /// assert_eq!(options.recursion_limit, 2);
    /// ```
    #[must_use]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Sets whether `close()` also closes the backing sink or source.
    #[must_use]
    pub fn with_auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = auto_close;
        self
    }

    /// Sets the initial capacity of the binary writer's staging buffer.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}
