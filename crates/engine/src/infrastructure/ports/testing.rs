//! Testability port for injecting randomness.

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Fill a fresh buffer of `len` random bytes.
    fn bytes(&self, len: usize) -> Vec<u8>;
}
