//! Buffer pool configuration

use serde::{Deserialize, Serialize};

use crate::error::{HelianthusError, Result};

/// Buffer size used by the manager's default pool
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Configuration for buffer pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferPoolConfig {
    /// Size of each buffer in bytes
    pub buffer_size: usize,
    /// Number of buffers allocated up front
    pub initial_pool_size: usize,
    /// Maximum number of pool-tracked buffers
    pub max_pool_size: usize,
    /// Number of buffers added per growth step
    pub grow_step: usize,
    /// Zero-fill buffers when they are recycled
    pub enable_zero_init: bool,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            initial_pool_size: 32,
            max_pool_size: 1024,
            grow_step: 8,
            enable_zero_init: false,
        }
    }
}

impl BufferPoolConfig {
    /// Create a configuration for a given buffer size
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            ..Default::default()
        }
    }

    /// Set initial pool size
    pub fn with_initial_pool_size(mut self, count: usize) -> Self {
        self.initial_pool_size = count;
        self
    }

    /// Set maximum pool size
    pub fn with_max_pool_size(mut self, count: usize) -> Self {
        self.max_pool_size = count;
        self
    }

    /// Set growth step
    pub fn with_grow_step(mut self, step: usize) -> Self {
        self.grow_step = step;
        self
    }

    /// Enable or disable zero-fill on recycle
    pub fn with_zero_init(mut self, enable: bool) -> Self {
        self.enable_zero_init = enable;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(HelianthusError::invalid_parameter(
                "buffer_size",
                "Buffer size cannot be zero",
            ));
        }

        if self.max_pool_size == 0 {
            return Err(HelianthusError::invalid_parameter(
                "max_pool_size",
                "Max pool size cannot be zero",
            ));
        }

        if self.initial_pool_size > self.max_pool_size {
            return Err(HelianthusError::invalid_parameter(
                "initial_pool_size",
                "Initial pool size cannot exceed max pool size",
            ));
        }

        if self.grow_step == 0 {
            return Err(HelianthusError::invalid_parameter(
                "grow_step",
                "Grow step cannot be zero",
            ));
        }

        Ok(())
    }

    /// Memory held by a fully grown pool
    pub fn max_memory(&self) -> usize {
        self.buffer_size * self.max_pool_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BufferPoolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(BufferPoolConfig::new(0).validate().is_err());

        let config = BufferPoolConfig::new(1024)
            .with_initial_pool_size(8)
            .with_max_pool_size(4);
        assert!(config.validate().is_err());

        let config = BufferPoolConfig::new(1024).with_grow_step(0);
        assert!(config.validate().is_err());
    }
}
