//! `sizes`
//!
//! The square pixel sizes that icons are rendered at.

use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

/// The sizes rendered when no other sizes are requested.
pub const REFERENCE_SIZES: [u32; 4] = [16, 32, 48, 128];

/// A single square output dimension, in pixels.
///
/// A size of zero cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TargetSize(NonZeroU32);

impl TargetSize {
    /// Creates a new [`TargetSize`].
    ///
    /// # Arguments
    /// * `pixels`: The width and height of the icon.
    ///
    /// # Returns
    /// The size, or `None` if `pixels` is zero.
    pub fn new(pixels: u32) -> Option<Self> {
        NonZeroU32::new(pixels).map(TargetSize)
    }

    /// Gets the width (and height) of the icon in pixels.
    pub fn pixels(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for TargetSize {
    type Error = SizeParseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        TargetSize::new(value).ok_or(SizeParseError::ZeroSize)
    }
}

impl From<TargetSize> for u32 {
    fn from(value: TargetSize) -> Self {
        value.pixels()
    }
}

/// Errors that can occur when reading a list of sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeParseError {
    /// A size of zero pixels was requested.
    ZeroSize,
    /// An entry was not a whole number.
    NotANumber(String),
}

impl fmt::Display for SizeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeParseError::ZeroSize => write!(f, "icon sizes must be at least 1 pixel"),
            SizeParseError::NotANumber(entry) => write!(f, "`{entry}` is not a valid icon size"),
        }
    }
}

impl std::error::Error for SizeParseError {}

/// An ordered list of sizes to render.
///
/// Order only decides the order icons are produced in. Duplicates are allowed,
/// each one results in another write of the same file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSizes(Vec<TargetSize>);

impl TargetSizes {
    /// Creates a list of sizes from already validated sizes.
    pub fn new(sizes: Vec<TargetSize>) -> Self {
        TargetSizes(sizes)
    }

    /// The sizes used for browser extension style icons: 16, 32, 48 and 128.
    pub fn reference() -> Self {
        REFERENCE_SIZES
            .into_iter()
            .filter_map(TargetSize::new)
            .collect()
    }

    /// Gets the number of sizes, counting duplicates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether there are no sizes to render.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the sizes in order.
    pub fn iter(&self) -> impl Iterator<Item = TargetSize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<TargetSize> for TargetSizes {
    fn from_iter<T: IntoIterator<Item = TargetSize>>(iter: T) -> Self {
        TargetSizes(iter.into_iter().collect())
    }
}

impl TryFrom<&[u32]> for TargetSizes {
    type Error = SizeParseError;

    fn try_from(value: &[u32]) -> Result<Self, Self::Error> {
        value.iter().map(|&size| TargetSize::try_from(size)).collect()
    }
}

impl FromStr for TargetSizes {
    type Err = SizeParseError;

    /// Parses a comma separated list such as `16,32,48,128`.
    /// An empty string is an empty list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let pixels = entry
                    .parse::<u32>()
                    .map_err(|_| SizeParseError::NotANumber(entry.to_string()))?;
                TargetSize::try_from(pixels)
            })
            .collect()
    }
}
