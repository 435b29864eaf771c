use derive_more::{Error, From};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

#[cfg(test)]
use proptest::prelude::*;

/// How long the engine may think about a move.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum Limits {
    /// Unlimited search, the engine decides.
    None,

    /// The maximum number of plies to search.
    Depth(u8),

    /// The maximum amount of time to spend searching.
    #[serde(with = "humantime_serde")]
    Time(
        #[cfg_attr(test, strategy((0u64..3_600_000).prop_map(Duration::from_millis)))] Duration,
    ),
}

impl Default for Limits {
    fn default() -> Self {
        Limits::Time(Duration::from_secs(1))
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ron::ser::to_string(self).map_err(|_| fmt::Error)?)
    }
}

/// The reason why parsing [`Limits`] failed.
#[derive(Debug, derive_more::Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse search limits")]
pub struct ParseLimitsError(ron::de::SpannedError);

impl FromStr for Limits {
    type Err = ParseLimitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}
