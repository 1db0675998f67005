//! Arena configuration parameters.

use crate::error::ArenaError;

/// How the size of the next block is chosen when no existing block can
/// serve a request.
///
/// The first block always has exactly
/// [`ArenaConfig::initial_block_size`] bytes. The policy decides what the
/// running block size becomes after each block it sizes. Requests larger
/// than the running size get a dedicated block and leave it unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Every block is exactly the initial size.
    #[default]
    Fixed,
    /// Each block is `increment` bytes larger than the previous one.
    Linear {
        /// Bytes added to the running block size per new block.
        increment: usize,
    },
    /// Each block is twice the size of the previous one.
    Exponential,
}

impl GrowthPolicy {
    /// Running block size after a block of `current` bytes was created.
    ///
    /// Saturates instead of overflowing; a saturated size simply fails to
    /// allocate later.
    pub fn advance(&self, current: usize) -> usize {
        match self {
            Self::Fixed => current,
            Self::Linear { increment } => current.saturating_add(*increment),
            Self::Exponential => current.saturating_mul(2),
        }
    }
}

/// Configuration for the arena allocator.
///
/// Validated by [`Arena::with_config`](crate::Arena::with_config); all
/// values are immutable after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the first block in bytes.
    ///
    /// Default: 1MB. Must be non-zero.
    pub initial_block_size: usize,

    /// Rule for sizing later blocks.
    ///
    /// Default: [`GrowthPolicy::Fixed`].
    pub growth: GrowthPolicy,

    /// Upper bound on backing memory held by the arena, in bytes.
    ///
    /// Default: unlimited. When set it must be at least
    /// `initial_block_size`.
    pub memory_limit: Option<usize>,
}

impl ArenaConfig {
    /// Default first block size: 1MB.
    pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

    /// Create a config with the given first block size and default policy.
    pub fn new(initial_block_size: usize) -> Self {
        Self {
            initial_block_size,
            growth: GrowthPolicy::default(),
            memory_limit: None,
        }
    }

    /// Set the growth policy.
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Cap the backing memory the arena may hold.
    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = Some(limit);
        self
    }

    /// Check the config for values the arena cannot work with.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.initial_block_size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "initial_block_size must be non-zero".into(),
            });
        }
        if self.initial_block_size > isize::MAX as usize {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_block_size {} exceeds isize::MAX",
                    self.initial_block_size
                ),
            });
        }
        if let GrowthPolicy::Linear { increment: 0 } = self.growth {
            return Err(ArenaError::InvalidConfig {
                reason: "linear growth increment must be non-zero".into(),
            });
        }
        if let Some(limit) = self.memory_limit {
            if limit < self.initial_block_size {
                return Err(ArenaError::InvalidConfig {
                    reason: format!(
                        "memory_limit {limit} is smaller than initial_block_size {}",
                        self.initial_block_size
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
