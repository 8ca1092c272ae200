//! Classify connector error codes as transient (worth retrying) or not.

use std::collections::BTreeSet;

/// Server error codes that indicate a temporary condition during connection
/// establishment (database starting up, failover in progress, resource
/// governance limits).
pub const DEFAULT_TRANSIENT_CODES: &[u32] = &[
    4060, 4221, 10928, 10929, 40143, 40197, 40501, 40540, 40613, 42108, 42109, 49918, 49919,
    49920,
];

/// Decides whether an error code is transient.
///
/// Implementations must be pure: the same code always yields the same answer,
/// and unknown codes are simply not transient.
pub trait TransientErrorLookup: Send + Sync {
    fn is_transient_error(&self, code: u32) -> bool;
}

impl<F> TransientErrorLookup for F
where
    F: Fn(u32) -> bool + Send + Sync,
{
    fn is_transient_error(&self, code: u32) -> bool {
        self(code)
    }
}

/// Built-in table of transient codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransientErrorLookup;

impl TransientErrorLookup for DefaultTransientErrorLookup {
    fn is_transient_error(&self, code: u32) -> bool {
        DEFAULT_TRANSIENT_CODES.contains(&code)
    }
}

/// Lookup over an explicit set of codes (e.g. defaults plus configured extras).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSetLookup {
    codes: BTreeSet<u32>,
}

impl CodeSetLookup {
    pub fn new(codes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// The default table extended with `extra`.
    pub fn with_defaults(extra: impl IntoIterator<Item = u32>) -> Self {
        Self::new(DEFAULT_TRANSIENT_CODES.iter().copied().chain(extra))
    }

    pub fn codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.codes.iter().copied()
    }
}

impl TransientErrorLookup for CodeSetLookup {
    fn is_transient_error(&self, code: u32) -> bool {
        self.codes.contains(&code)
    }
}
