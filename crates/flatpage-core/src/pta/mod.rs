//! Pta, Ptaa - Point arrays
//!
//! Arrays of floating-point coordinate pairs. Text line centers and the
//! per-column disparity samples are collected in these before fitting.
//!
//! # Storage layout
//!
//! Points are stored as separate X and Y vectors (SoA layout).

mod lsf;

pub use lsf::{apply_linear_fit, apply_quadratic_fit};

use crate::error::{Error, Result};

/// Array of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pta {
    x: Vec<f32>,
    y: Vec<f32>,
}

impl Pta {
    /// Create a new empty Pta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Pta with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    /// Create a Pta from coordinate vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` and `y` have different lengths.
    pub fn from_vecs(x: Vec<f32>, y: Vec<f32>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::InvalidParameter(format!(
                "coordinate length mismatch: {} x values, {} y values",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y })
    }

    /// Get the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Get a point by index.
    pub fn get(&self, index: usize) -> Option<(f32, f32)> {
        Some((*self.x.get(index)?, *self.y.get(index)?))
    }

    /// Get X coordinate by index.
    pub fn get_x(&self, index: usize) -> Option<f32> {
        self.x.get(index).copied()
    }

    /// Get Y coordinate by index.
    pub fn get_y(&self, index: usize) -> Option<f32> {
        self.y.get(index).copied()
    }

    /// Add a point.
    pub fn push(&mut self, x: f32, y: f32) {
        self.x.push(x);
        self.y.push(y);
    }

    /// All X coordinates.
    #[inline]
    pub fn x_coords(&self) -> &[f32] {
        &self.x
    }

    /// All Y coordinates.
    #[inline]
    pub fn y_coords(&self) -> &[f32] {
        &self.y
    }

    /// Iterate over points.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Return a copy with x and y exchanged.
    pub fn transposed(&self) -> Pta {
        Pta {
            x: self.y.clone(),
            y: self.x.clone(),
        }
    }

    /// Range of X as `(min, max)`, or `None` if empty.
    pub fn x_range(&self) -> Option<(f32, f32)> {
        let first = *self.x.first()?;
        Some(
            self.x
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Range of Y as `(min, max)`, or `None` if empty.
    pub fn y_range(&self) -> Option<(f32, f32)> {
        let first = *self.y.first()?;
        Some(
            self.y
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

impl FromIterator<(f32, f32)> for Pta {
    fn from_iter<I: IntoIterator<Item = (f32, f32)>>(iter: I) -> Self {
        let mut pta = Pta::new();
        for (x, y) in iter {
            pta.push(x, y);
        }
        pta
    }
}

/// Array of point arrays.
#[derive(Debug, Clone, Default)]
pub struct Ptaa {
    ptas: Vec<Pta>,
}

impl Ptaa {
    /// Create a new empty Ptaa.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of point arrays.
    pub fn len(&self) -> usize {
        self.ptas.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ptas.is_empty()
    }

    /// Add a point array.
    pub fn push(&mut self, pta: Pta) {
        self.ptas.push(pta);
    }

    /// Get a point array by index.
    pub fn get(&self, index: usize) -> Option<&Pta> {
        self.ptas.get(index)
    }

    /// Iterate over the point arrays.
    pub fn iter(&self) -> std::slice::Iter<'_, Pta> {
        self.ptas.iter()
    }
}

impl FromIterator<Pta> for Ptaa {
    fn from_iter<I: IntoIterator<Item = Pta>>(iter: I) -> Self {
        Ptaa {
            ptas: iter.into_iter().collect(),
        }
    }
}
