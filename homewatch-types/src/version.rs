//! Version tag carried by serialized samples.

use std::fmt;

use crate::SCHEMA_VERSION;

/// `major.minor` version of the sample format.
///
/// Readers accept any minor version of their own major version. A sample
/// file without a version tag is read as [`SchemaVersion::current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub const fn current() -> Self {
        Self::new(SCHEMA_VERSION, 0)
    }

    /// Same major version as this library.
    pub fn is_compatible(&self) -> bool {
        self.major == SCHEMA_VERSION
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
