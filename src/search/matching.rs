//! Positionwise agreement between configurations.

use crate::schema::Configuration;

/// True iff at least one configuration in `others` agrees with
/// `configuration` on `m` or more positions.
///
/// The escalation loop uses this to keep only those higher-strength
/// configurations that still cover one of the selected seeds at threshold
/// `strength - 1`.
pub fn has_m_match(configuration: &Configuration, others: &[Configuration], m: usize) -> bool {
    for other in others {
        let mut matched = 0;
        for (a, b) in configuration.0.iter().zip(&other.0) {
            if a == b {
                matched += 1;
            }
            if matched >= m {
                return true;
            }
        }
    }
    false
}
