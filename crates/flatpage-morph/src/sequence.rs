//! Morphological sequence operations
//!
//! Runs a chain of brick operations given as a string.
//!
//! # Sequence String Format
//!
//! Operations are separated by `+` and whitespace is ignored.
//! Each operation begins with a case-insensitive character:
//!
//! - `d<w>.<h>` - Dilation with w x h brick structuring element
//! - `e<w>.<h>` - Erosion with w x h brick structuring element
//! - `o<w>.<h>` - Opening with w x h brick structuring element
//! - `c<w>.<h>` - Closing with w x h brick structuring element
//!
//! # Examples
//!
//! ```
//! use flatpage_morph::sequence::{MorphSequence, morph_sequence};
//! use flatpage_core::{Pix, PixelDepth};
//!
//! let seq = MorphSequence::parse("o1.3 + c15.1").unwrap();
//! assert_eq!(seq.ops().len(), 2);
//!
//! let pix = Pix::new(100, 100, PixelDepth::Bit1).unwrap();
//! let result = morph_sequence(&pix, "d3.3 + e3.3").unwrap();
//! ```

use crate::binary::{close_brick, dilate_brick, erode_brick, open_brick};
use crate::{MorphError, MorphResult};
use flatpage_core::{Pix, PixelDepth};
use std::fmt;
use std::str::FromStr;

/// A parsed morphological operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOp {
    /// Dilation with a brick structuring element
    Dilate { width: u32, height: u32 },
    /// Erosion with a brick structuring element
    Erode { width: u32, height: u32 },
    /// Opening (erosion followed by dilation)
    Open { width: u32, height: u32 },
    /// Closing (dilation followed by erosion)
    Close { width: u32, height: u32 },
}

impl MorphOp {
    /// Get the width and height of the operation's structuring element
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            MorphOp::Dilate { width, height }
            | MorphOp::Erode { width, height }
            | MorphOp::Open { width, height }
            | MorphOp::Close { width, height } => (width, height),
        }
    }

    /// Apply this operation to a 1 bpp image
    pub fn apply(&self, pix: &Pix) -> MorphResult<Pix> {
        match *self {
            MorphOp::Dilate { width, height } => dilate_brick(pix, width, height),
            MorphOp::Erode { width, height } => erode_brick(pix, width, height),
            MorphOp::Open { width, height } => open_brick(pix, width, height),
            MorphOp::Close { width, height } => close_brick(pix, width, height),
        }
    }
}

impl fmt::Display for MorphOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            MorphOp::Dilate { .. } => 'd',
            MorphOp::Erode { .. } => 'e',
            MorphOp::Open { .. } => 'o',
            MorphOp::Close { .. } => 'c',
        };
        let (w, h) = self.dimensions();
        write!(f, "{}{}.{}", c, w, h)
    }
}

/// A parsed morphological sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphSequence {
    ops: Vec<MorphOp>,
}

impl MorphSequence {
    /// Parse a sequence string into a MorphSequence
    ///
    /// # Examples
    ///
    /// ```
    /// use flatpage_morph::sequence::MorphSequence;
    ///
    /// let seq = MorphSequence::parse("d3.3 + e5.5").unwrap();
    /// assert_eq!(seq.ops().len(), 2);
    /// ```
    pub fn parse(sequence: &str) -> MorphResult<Self> {
        if sequence.trim().is_empty() {
            return Err(MorphError::InvalidSequence("empty sequence".to_string()));
        }

        let mut ops = Vec::new();
        for (i, part) in sequence.split('+').enumerate() {
            let op_str: String = part.chars().filter(|c| !c.is_whitespace()).collect();
            if op_str.is_empty() {
                return Err(MorphError::InvalidSequence(format!(
                    "empty operation at position {}",
                    i + 1
                )));
            }
            ops.push(Self::parse_operation(&op_str)?);
        }
        Ok(MorphSequence { ops })
    }

    fn parse_operation(op_str: &str) -> MorphResult<MorphOp> {
        let mut chars = op_str.chars();
        let first = chars
            .next()
            .map(|c| c.to_ascii_lowercase())
            .ok_or_else(|| MorphError::InvalidSequence("empty operation".to_string()))?;
        let (width, height) = Self::parse_dimensions(chars.as_str())?;
        match first {
            'd' => Ok(MorphOp::Dilate { width, height }),
            'e' => Ok(MorphOp::Erode { width, height }),
            'o' => Ok(MorphOp::Open { width, height }),
            'c' => Ok(MorphOp::Close { width, height }),
            _ => Err(MorphError::InvalidSequence(format!(
                "unknown operation '{}' in '{}'",
                first, op_str
            ))),
        }
    }

    /// Parse dimensions from a string like "3.5" -> (3, 5)
    fn parse_dimensions(dim_str: &str) -> MorphResult<(u32, u32)> {
        let (w, h) = dim_str.split_once('.').ok_or_else(|| {
            MorphError::InvalidSequence(format!(
                "invalid dimensions format '{}', expected 'width.height'",
                dim_str
            ))
        })?;
        let width: u32 = w.parse().map_err(|_| {
            MorphError::InvalidSequence(format!("invalid width '{}' in '{}'", w, dim_str))
        })?;
        let height: u32 = h.parse().map_err(|_| {
            MorphError::InvalidSequence(format!("invalid height '{}' in '{}'", h, dim_str))
        })?;
        if width == 0 || height == 0 {
            return Err(MorphError::InvalidSequence(format!(
                "dimensions must be > 0, got {}x{}",
                width, height
            )));
        }
        Ok((width, height))
    }

    /// Build a sequence from already-parsed operations
    pub fn from_ops(ops: Vec<MorphOp>) -> Self {
        MorphSequence { ops }
    }

    /// Get the operations in this sequence
    pub fn ops(&self) -> &[MorphOp] {
        &self.ops
    }

    /// Get the number of operations in the sequence
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run every operation in order on a 1 bpp image
    pub fn apply(&self, pix: &Pix) -> MorphResult<Pix> {
        if pix.depth() != PixelDepth::Bit1 {
            return Err(MorphError::UnsupportedDepth {
                expected: "1-bpp binary",
                actual: pix.depth().bits(),
            });
        }
        let mut result = pix.clone();
        for op in &self.ops {
            result = op.apply(&result)?;
        }
        Ok(result)
    }
}

impl FromStr for MorphSequence {
    type Err = MorphError;

    fn from_str(s: &str) -> MorphResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MorphSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

/// Execute a binary morphological sequence on an image
///
/// # Errors
///
/// Returns an error if the sequence does not parse or `pix` is not 1 bpp.
pub fn morph_sequence(pix: &Pix, sequence: &str) -> MorphResult<Pix> {
    MorphSequence::parse(sequence)?.apply(pix)
}
