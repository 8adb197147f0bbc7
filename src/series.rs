//! Year-indexed series of values, one per plant year.
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, Mul, Range};

/// An ordered, fixed-length sequence of values with one entry per plant year.
///
/// Index 0 is the first construction year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<f64>);

impl Series {
    /// A series of zeros
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// A series with the same value in every year
    pub fn constant(len: usize, value: f64) -> Self {
        Self(vec![value; len])
    }

    /// The number of years covered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the series covers no years
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the values
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// The values as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Sum of all values
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// The first year with a strictly positive value, if any
    pub fn first_positive(&self) -> Option<usize> {
        self.0.iter().position(|&value| value > 0.0)
    }

    /// Apply a function to each value
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self(self.0.iter().map(|&value| f(value)).collect())
    }

    /// Elementwise `min` with a scalar
    pub fn cap(&self, ceiling: f64) -> Self {
        self.map(|value| value.min(ceiling))
    }

    /// Elementwise `min` with another series of the same length
    pub fn clamp_to(&self, ceiling: &Series) -> Self {
        assert_eq!(self.len(), ceiling.len(), "Series lengths differ");
        self.zip_with(ceiling, f64::min)
    }

    /// Elementwise `max` with zero
    pub fn non_negative(&self) -> Self {
        self.map(|value| value.max(0.0))
    }

    /// Keep values within `window`, zeroing the rest
    pub fn retain_window(&self, window: Range<usize>) -> Self {
        Self(
            self.0
                .iter()
                .enumerate()
                .map(|(year, &value)| if window.contains(&year) { value } else { 0.0 })
                .collect(),
        )
    }

    /// Running total of the values
    pub fn cumulative_sum(&self) -> Self {
        Self(
            self.0
                .iter()
                .scan(0.0, |total, &value| {
                    *total += value;
                    Some(*total)
                })
                .collect(),
        )
    }

    /// Combine two series of the same length elementwise
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Series, f: F) -> Self {
        assert_eq!(self.len(), other.len(), "Series lengths differ");
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        )
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for Series {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

impl From<Series> for Vec<f64> {
    fn from(series: Series) -> Self {
        series.0
    }
}

impl FromIterator<f64> for Series {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for Series {
    type Output = f64;

    fn index(&self, year: usize) -> &f64 {
        &self.0[year]
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Add<&Series> for &Series {
    type Output = Series;

    fn add(self, rhs: &Series) -> Series {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl AddAssign<&Series> for Series {
    fn add_assign(&mut self, rhs: &Series) {
        assert_eq!(self.len(), rhs.len(), "Series lengths differ");
        for (value, other) in self.0.iter_mut().zip(rhs.0.iter()) {
            *value += other;
        }
    }
}

impl Mul<f64> for &Series {
    type Output = Series;

    fn mul(self, rhs: f64) -> Series {
        self.map(|value| value * rhs)
    }
}
