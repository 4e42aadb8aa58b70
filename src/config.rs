//! Runtime configuration read from the environment
//!
//! | variable                | default | meaning                                 |
//! |-------------------------|---------|-----------------------------------------|
//! | `BITDIFF_CONTEXT_LINES` | 3       | unchanged lines around each hunk change |
//! | `BITDIFF_SNIFF_BYTES`   | 8192    | prefix inspected by the binary sniffer  |
//! | `BITDIFF_LOG`           | `warn`  | `tracing` filter used by the binary     |

use crate::artifacts::classify::sniff::DEFAULT_SNIFF_LIMIT;
use crate::artifacts::diff::hunk::DEFAULT_CONTEXT_LINES;
use std::str::FromStr;
use tracing::warn;

pub const CONTEXT_LINES_VAR: &str = "BITDIFF_CONTEXT_LINES";
pub const SNIFF_BYTES_VAR: &str = "BITDIFF_SNIFF_BYTES";
pub const LOG_VAR: &str = "BITDIFF_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub context_lines: usize,
    pub sniff_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            context_lines: DEFAULT_CONTEXT_LINES,
            sniff_limit: DEFAULT_SNIFF_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let context_lines = parse_or(
            CONTEXT_LINES_VAR,
            lookup(CONTEXT_LINES_VAR),
            defaults.context_lines,
        );
        let sniff_limit = parse_or(SNIFF_BYTES_VAR, lookup(SNIFF_BYTES_VAR), defaults.sniff_limit);

        Config {
            context_lines,
            sniff_limit: sniff_limit.max(1),
        }
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, %default, "invalid setting, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn valid_values_override_defaults() {
        let config = config_from(&[(CONTEXT_LINES_VAR, "5"), (SNIFF_BYTES_VAR, " 1024 ")]);

        assert_eq!(config.context_lines, 5);
        assert_eq!(config.sniff_limit, 1024);
    }

    #[rstest]
    #[case("three")]
    #[case("-1")]
    #[case("")]
    fn invalid_values_fall_back(#[case] raw: &str) {
        let config = config_from(&[(CONTEXT_LINES_VAR, raw)]);

        assert_eq!(config.context_lines, DEFAULT_CONTEXT_LINES);
    }
}
