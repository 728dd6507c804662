//! Parameter grids.
//!
//! A grid is an ordered list of named axes. Its points are the Cartesian
//! product of the axis values, enumerated with the first axis outermost.

use std::fmt;

use crate::error::{SweepError, SweepResult};

/// Type of range progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    /// Uniformly spaced points
    #[default]
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

/// Generated range of axis values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    pub start: f64,
    pub end: f64,
    pub points: usize,
    pub spacing: Spacing,
}

impl RangeSpec {
    pub fn validate(&self) -> SweepResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SweepError::InvalidGrid(
                "range bounds must be finite".to_string(),
            ));
        }
        if self.points < 2 {
            return Err(SweepError::InvalidGrid(
                "range must have at least 2 points".to_string(),
            ));
        }
        if (self.start - self.end).abs() < 1e-12 {
            return Err(SweepError::InvalidGrid(
                "range start and end must be different".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate all points in the range.
    pub fn generate_points(&self) -> Vec<f64> {
        match self.spacing {
            Spacing::Linear => self.generate_linear(),
            Spacing::Logarithmic => self.generate_logarithmic(),
        }
    }

    fn generate_linear(&self) -> Vec<f64> {
        if self.points <= 1 {
            return vec![self.start];
        }

        let delta = (self.end - self.start) / (self.points - 1) as f64;
        let mut points: Vec<f64> = (0..self.points)
            .map(|i| self.start + i as f64 * delta)
            .collect();

        // Ensure exact endpoint
        points[self.points - 1] = self.end;
        points
    }

    fn generate_logarithmic(&self) -> Vec<f64> {
        if self.points <= 1 {
            return vec![self.start];
        }

        // Both bounds must be positive for a log progression
        if self.start <= 0.0 || self.end <= 0.0 {
            return self.generate_linear();
        }

        let log_start = self.start.ln();
        let log_delta = (self.end.ln() - log_start) / (self.points - 1) as f64;
        let mut points: Vec<f64> = (0..self.points)
            .map(|i| (log_start + i as f64 * log_delta).exp())
            .collect();

        points[0] = self.start;
        points[self.points - 1] = self.end;
        points
    }
}

/// One named axis of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl GridAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn from_range(name: impl Into<String>, range: &RangeSpec) -> SweepResult<Self> {
        range.validate()?;
        Ok(Self::new(name, range.generate_points()))
    }
}

/// One combination of axis values, in axis order.
pub type GridPoint = Vec<(String, f64)>;

/// Ordered set of axes swept together.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    axes: Vec<GridAxis>,
}

impl ParameterGrid {
    pub fn new(axes: Vec<GridAxis>) -> SweepResult<Self> {
        for (i, axis) in axes.iter().enumerate() {
            if axis.name.trim().is_empty() {
                return Err(SweepError::InvalidGrid("axis name is empty".to_string()));
            }
            if axis.values.is_empty() {
                return Err(SweepError::InvalidGrid(format!(
                    "axis '{}' has no values",
                    axis.name
                )));
            }
            if let Some(v) = axis.values.iter().find(|v| !v.is_finite()) {
                return Err(SweepError::InvalidGrid(format!(
                    "axis '{}' contains non-finite value {}",
                    axis.name, v
                )));
            }
            if axes[..i].iter().any(|other| other.name == axis.name) {
                return Err(SweepError::InvalidGrid(format!(
                    "axis '{}' is declared twice",
                    axis.name
                )));
            }
        }
        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[GridAxis] {
        &self.axes
    }

    /// Number of combinations. A grid without axes has exactly one (empty) point.
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate all combinations, first axis outermost.
    pub fn points(&self) -> Vec<GridPoint> {
        let total = self.len();
        let mut points = Vec::with_capacity(total);
        let mut cursor = vec![0usize; self.axes.len()];

        for _ in 0..total {
            points.push(
                self.axes
                    .iter()
                    .zip(&cursor)
                    .map(|(axis, &i)| (axis.name.clone(), axis.values[i]))
                    .collect(),
            );

            // Odometer increment, innermost axis fastest
            for (slot, axis) in cursor.iter_mut().zip(&self.axes).rev() {
                *slot += 1;
                if *slot < axis.values.len() {
                    break;
                }
                *slot = 0;
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_range_generation() {
        let range = RangeSpec {
            start: 300.0,
            end: 400.0,
            points: 5,
            spacing: Spacing::Linear,
        };

        let points = range.generate_points();
        assert_eq!(points.len(), 5);
        assert!((points[0] - 300.0).abs() < 1e-9);
        assert!((points[2] - 350.0).abs() < 1e-9);
        assert_eq!(points[4], 400.0);
    }

    #[test]
    fn logarithmic_range_generation() {
        let range = RangeSpec {
            start: 0.1,
            end: 10.0,
            points: 3,
            spacing: Spacing::Logarithmic,
        };

        let points = range.generate_points();
        assert_eq!(points, vec![0.1, points[1], 10.0]);
        assert!((points[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn logarithmic_falls_back_to_linear_for_non_positive_bounds() {
        let range = RangeSpec {
            start: 0.0,
            end: 2.0,
            points: 3,
            spacing: Spacing::Logarithmic,
        };
        assert_eq!(range.generate_points(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn reject_invalid_ranges() {
        let too_few = RangeSpec {
            start: 1.0,
            end: 2.0,
            points: 1,
            spacing: Spacing::Linear,
        };
        assert!(too_few.validate().is_err());

        let identical = RangeSpec {
            start: 1.0,
            end: 1.0,
            points: 4,
            spacing: Spacing::Linear,
        };
        assert!(identical.validate().is_err());
    }

    #[test]
    fn points_follow_declared_nesting() {
        let grid = ParameterGrid::new(vec![
            GridAxis::new("volume_m3", vec![0.5, 1.0]),
            GridAxis::new("temperature_c", vec![80.0, 100.0]),
        ])
        .unwrap();

        let points = grid.points();
        let pairs: Vec<(f64, f64)> = points.iter().map(|p| (p[0].1, p[1].1)).collect();
        assert_eq!(
            pairs,
            vec![(0.5, 80.0), (0.5, 100.0), (1.0, 80.0), (1.0, 100.0)]
        );
        assert!(points.iter().all(|p| p[0].0 == "volume_m3"));
    }

    #[test]
    fn grid_without_axes_has_one_point() {
        let grid = ParameterGrid::new(vec![]).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.points(), vec![Vec::<(String, f64)>::new()]);
    }

    #[test]
    fn reject_bad_axes() {
        assert!(ParameterGrid::new(vec![GridAxis::new("a", vec![])]).is_err());
        assert!(ParameterGrid::new(vec![GridAxis::new("a", vec![f64::NAN])]).is_err());
        assert!(
            ParameterGrid::new(vec![
                GridAxis::new("a", vec![1.0]),
                GridAxis::new("a", vec![2.0]),
            ])
            .is_err()
        );
    }
}
