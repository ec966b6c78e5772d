//! Configuration for the skip list index

/// Tunable parameters for a [`crate::SkipList`].
///
/// `max_height` and `branching_factor` are ordinary runtime fields rather
/// than compile-time constants, so a process can tune them without a
/// recompile, matching the rest of this crate family's `Config`-struct
/// convention.
///
/// # Example
///
/// ```
/// use pskiplist::Config;
///
/// let config = Config {
///     max_height: 12,
///     branching_factor: 4,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum height `H` a node may reach. Must be `>= 1`.
    pub max_height: u8,

    /// Branching factor `B` controlling the random-height distribution.
    /// Each level promotion happens with probability `1/B`. Must be `> 1`.
    pub branching_factor: u32,

    /// Initial capacity reserved in the backing pool for node allocations.
    pub pool_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_height: 8,
            branching_factor: 4,
            pool_capacity: 1 << 20,
        }
    }
}

impl Config {
    /// Validates the configuration: `branching_factor > 1`, `max_height >= 1`.
    pub(crate) fn validate(&self) {
        assert!(self.max_height >= 1, "max_height must be >= 1");
        assert!(self.branching_factor > 1, "branching_factor must be > 1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_documented_values() {
        let config = Config::default();
        assert_eq!(config.max_height, 8);
        assert_eq!(config.branching_factor, 4);
    }

    #[test]
    #[should_panic(expected = "branching_factor must be > 1")]
    fn validate_rejects_branching_factor_of_one() {
        let config = Config {
            branching_factor: 1,
            ..Default::default()
        };
        config.validate();
    }

    #[test]
    #[should_panic(expected = "max_height must be >= 1")]
    fn validate_rejects_zero_height() {
        let config = Config {
            max_height: 0,
            ..Default::default()
        };
        config.validate();
    }
}
