use std::fmt;
use std::str::FromStr;

/// Governs how many items must be available before a take is
/// satisfied, and what a take returns when its timeout expires.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Policy {
    /// Satisfied as soon as any item is available. Returns up to the
    /// requested count.
    Partial,
    /// Waits for the full requested count. When the timeout expires,
    /// whatever is available is returned instead.
    #[default]
    PartialOnTimeout,
    /// Waits for the full requested count. When the timeout expires
    /// without it, nothing is taken.
    AllOrNothing,
}

impl Policy {
    /// The canonical token for this policy, as accepted by
    /// [Policy::from_str].
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Partial => "partial",
            Policy::PartialOnTimeout => "partial_on_timeout",
            Policy::AllOrNothing => "all_or_nothing",
        }
    }

    /// The number of items a blocked taker registers as its demand.
    pub(crate) fn demand(self, count: usize) -> usize {
        match self {
            Policy::Partial => 1,
            Policy::PartialOnTimeout | Policy::AllOrNothing => count,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a [Policy] from an unrecognized token.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unrecognized policy `{0}`")]
pub struct InvalidPolicy(pub String);

impl FromStr for Policy {
    type Err = InvalidPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partial" => Ok(Policy::Partial),
            "partial_on_timeout" => Ok(Policy::PartialOnTimeout),
            "all_or_nothing" => Ok(Policy::AllOrNothing),
            _ => Err(InvalidPolicy(s.to_owned())),
        }
    }
}
