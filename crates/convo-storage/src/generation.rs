use std::fmt;

/// Per-key version token used for compare-and-swap writes.
///
/// `ABSENT` (0) stands for "no object". Every successful write moves the
/// key to exactly the next generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(i64);

impl Generation {
    pub const ABSENT: Generation = Generation(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_absent(self) -> bool {
        self.0 == 0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Generation {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
