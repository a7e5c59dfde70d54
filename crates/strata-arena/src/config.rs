//! Arena configuration parameters.

use strata_core::ArenaError;

/// Configuration for an arena.
///
/// Controls the fixed capacity of the backing buffer. Validated at
/// construction; arenas never grow afterwards.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Size of the arena's byte buffer.
    ///
    /// Must be non-zero and no larger than `max_capacity`.
    pub capacity: u32,

    /// Upper bound accepted for `capacity`.
    ///
    /// Default: 1 GiB. Guards against accidental `u32::MAX` sized
    /// allocations from miscomputed sizes.
    pub max_capacity: u32,
}

impl ArenaConfig {
    /// Default capacity: 64 KiB.
    pub const DEFAULT_CAPACITY: u32 = 64 * 1024;

    /// Default maximum capacity: 1 GiB.
    pub const DEFAULT_MAX_CAPACITY: u32 = 1 << 30;

    /// Create a config for the given capacity, other values defaulted.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            max_capacity: Self::DEFAULT_MAX_CAPACITY,
        }
    }

    /// Check the config, returning [`ArenaError::InvalidConfig`] on failure.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "capacity must be non-zero".to_string(),
            });
        }
        if self.capacity > self.max_capacity {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "capacity {} exceeds max_capacity {}",
                    self.capacity, self.max_capacity
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
