/// Cache trait for storing and retrieving string values by key.
///
/// Implementations should handle errors gracefully without panicking.
/// The source-tree search keeps file contents in one, keyed by path.
pub trait Cache {
    /// Retrieves a cached value for the given key.
    ///
    /// # Arguments
    /// * `key` - The cache key to look up, usually a file path
    ///
    /// # Returns
    /// * `Some(String)` - The cached value if found
    /// * `None` - If the key was never stored
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value in the cache for the given key.
    ///
    /// # Arguments
    /// * `key` - The cache key to store under
    /// * `value` - The contents to remember
    ///
    /// # Notes
    /// Storing replaces any earlier value. Failures are logged, never returned.
    fn set(&self, key: &str, value: &str);
}
