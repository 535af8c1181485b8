//! Strongly-typed index newtypes.
//!
//! Keeps vertical layer indices and horizontal data-column indices apart.

use std::fmt;

/// Macro to generate index newtypes with common functionality.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Create a new index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// First index (0).
            pub const ZERO: Self = Self(0);
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }
    };
}

define_index!(
    /// Vertical layer index into the depth dimension of a field.
    ///
    /// Indices follow the dataset's own ordering: ROMS output stores the
    /// bottom layer at index 0, other sources store the surface first.
    ///
    /// ```
    /// use envfield::types::LevelIndex;
    ///
    /// let level = LevelIndex::new(5);
    /// assert_eq!(level.get(), 5);
    /// ```
    LevelIndex,
    "L"
);

define_index!(
    /// Horizontal data-column index (a grid node or cell centre).
    ///
    /// ```
    /// use envfield::types::NodeIndex;
    ///
    /// let node = NodeIndex::new(12);
    /// assert_eq!(usize::from(node), 12);
    /// ```
    NodeIndex,
    "N"
);

impl LevelIndex {
    /// Resolve a signed layer position against a layer count.
    ///
    /// Negative positions count from the end (`-1` is the last layer).
    /// Returns `None` when the position falls outside `[0, n_levels)`.
    pub fn resolve(position: isize, n_levels: usize) -> Option<Self> {
        let n = n_levels as isize;
        let idx = if position < 0 { n + position } else { position };
        (0..n).contains(&idx).then_some(Self(idx as usize))
    }
}
