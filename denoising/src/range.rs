use std::fmt;
use std::ops::RangeInclusive;

use crate::common::{Error, Result};
use crate::image::StackInfo;

/// How a range was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    CurrentSlice,
    AllSlices,
    Explicit,
}

/// Contiguous, ascending selection of slices of one image.
///
/// The bounds are captured when the range is built. Iterating never looks at
/// the image again, so a range goes stale if the image's slice count changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageRange {
    kind: RangeKind,
    first: usize,
    last: usize,
    slice_count: usize,
}

impl ImageRange {
    /// Just the image's current slice.
    pub fn current_slice(image: &impl StackInfo) -> Self {
        let current = image.current_slice();
        Self {
            kind: RangeKind::CurrentSlice,
            first: current,
            last: current,
            slice_count: image.slice_count(),
        }
    }

    /// Every slice of the image.
    pub fn all_slices(image: &impl StackInfo) -> Self {
        let slice_count = image.slice_count();
        Self {
            kind: RangeKind::AllSlices,
            first: 0,
            last: slice_count.saturating_sub(1),
            slice_count,
        }
    }

    /// Slices `first..=last`.
    pub fn explicit(image: &impl StackInfo, first: usize, last: usize) -> Result<Self> {
        let slice_count = image.slice_count();
        if first > last || last >= slice_count {
            return Err(Error::InvalidRange {
                first,
                last,
                slice_count,
            });
        }
        Ok(Self {
            kind: RangeKind::Explicit,
            first,
            last,
            slice_count,
        })
    }

    pub fn kind(&self) -> RangeKind {
        self.kind
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// Slice count of the image the range was built from.
    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Checks the range still fits an image with `slice_count` slices.
    pub fn validate_against(&self, slice_count: usize) -> Result<()> {
        if slice_count != self.slice_count || self.last >= slice_count {
            return Err(Error::InvalidRange {
                first: self.first,
                last: self.last,
                slice_count,
            });
        }
        Ok(())
    }
}

impl IntoIterator for &ImageRange {
    type Item = usize;
    type IntoIter = RangeInclusive<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ImageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "slice {} of {}", self.first, self.slice_count)
        } else {
            write!(f, "slices {}-{} of {}", self.first, self.last, self.slice_count)
        }
    }
}
