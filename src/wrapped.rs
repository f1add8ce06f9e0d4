//! Arithmetic on periodic quantities such as shaft angles.

use serde::{Deserialize, Serialize};

/// Which bound, if any, [`WrappedFloat::limit_value`] clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitStatus {
    Unchanged,
    Min,
    Max,
}

/// A value kept inside the half-open interval `[lower, upper)`.
///
/// Values that leave the interval are shifted by whole periods until they
/// land back inside it, so `-π` and `π` on a `[-π, π)` interval are the same
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WrappedFloat {
    value: f32,
    lower: f32,
    upper: f32,
}

impl WrappedFloat {
    /// Inverted bounds are swapped. The bounds must not be equal.
    pub fn new(value: f32, lower: f32, upper: f32) -> Self {
        debug_assert!(lower != upper, "wrap interval must be non-empty");
        let mut wrapped = Self { value, lower, upper };
        wrapped.validate_bounds();
        wrapped.rebound();
        wrapped
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.rebound();
    }

    pub fn lower_bound(&self) -> f32 {
        self.lower
    }

    pub fn set_lower_bound(&mut self, lower: f32) {
        self.lower = lower;
        self.validate_bounds();
        self.rebound();
    }

    pub fn upper_bound(&self) -> f32 {
        self.upper
    }

    pub fn set_upper_bound(&mut self, upper: f32) {
        self.upper = upper;
        self.validate_bounds();
        self.rebound();
    }

    pub fn period(&self) -> f32 {
        self.upper - self.lower
    }

    pub fn shift_bounds(&mut self, magnitude: f32) {
        self.lower += magnitude;
        self.upper += magnitude;
        self.rebound();
    }

    pub fn shift_value(&mut self, magnitude: f32) {
        self.value += magnitude;
        self.rebound();
    }

    /// Shortest signed distance from this value to `other` (`other - self`),
    /// with `other` interpreted on the same interval.
    pub fn difference(&self, other: f32) -> f32 {
        let period = self.period();
        let forward = (other - self.value).rem_euclid(period);
        if forward > period / 2.0 {
            forward - period
        } else {
            forward
        }
    }

    pub fn difference_to(&self, other: &WrappedFloat) -> f32 {
        self.difference(other.value)
    }

    /// Clamps `value` into the wrapped range that starts at `min` and runs
    /// upward to `max`. The range may itself cross the wrap point
    /// (`min > max`). Out-of-range values snap to whichever bound is closer
    /// along the circle.
    pub fn limit_value(
        value: &WrappedFloat,
        min: &WrappedFloat,
        max: &WrappedFloat,
    ) -> (f32, LimitStatus) {
        let (v, lo, hi) = (value.value, min.value, max.value);
        if lo == hi {
            return (v, LimitStatus::Unchanged);
        }
        let outside = if lo < hi {
            v < lo || v > hi
        } else {
            v > hi && v < lo
        };
        if !outside {
            return (v, LimitStatus::Unchanged);
        }
        if value.difference(lo).abs() < value.difference(hi).abs() {
            (lo, LimitStatus::Min)
        } else {
            (hi, LimitStatus::Max)
        }
    }

    /// [`Self::limit_value`] with plain bounds rewrapped onto `value`'s interval.
    pub fn limit_value_f32(value: &WrappedFloat, min: f32, max: f32) -> (f32, LimitStatus) {
        let min = WrappedFloat::new(min, value.lower, value.upper);
        let max = WrappedFloat::new(max, value.lower, value.upper);
        Self::limit_value(value, &min, &max)
    }

    fn validate_bounds(&mut self) {
        if self.lower > self.upper {
            core::mem::swap(&mut self.lower, &mut self.upper);
        }
    }

    fn rebound(&mut self) {
        if self.value < self.lower || self.value >= self.upper {
            self.value = self.lower + (self.value - self.lower).rem_euclid(self.period());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    const EPS: f32 = 1e-4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_rebound_on_construction() {
        assert!(approx(WrappedFloat::new(12.0, -10.0, 10.0).value(), -8.0));
        assert!(approx(WrappedFloat::new(-12.0, -10.0, 10.0).value(), 8.0));
        assert!(approx(WrappedFloat::new(10.0, -10.0, 10.0).value(), -10.0));
        assert!(approx(WrappedFloat::new(45.0, -10.0, 10.0).value(), 5.0));
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let w = WrappedFloat::new(3.0, 10.0, -10.0);
        assert_eq!(w.lower_bound(), -10.0);
        assert_eq!(w.upper_bound(), 10.0);
    }

    #[test]
    fn test_difference_takes_shortest_path() {
        let w = WrappedFloat::new(9.0, -10.0, 10.0);
        assert!(approx(w.difference(-9.0), 2.0));
        assert!(approx(w.difference(5.0), -4.0));

        let angle = WrappedFloat::new(0.1, 0.0, 2.0 * PI);
        assert!(approx(angle.difference(2.0 * PI - 0.1), -0.2));
    }

    #[test]
    fn test_shift_value_and_bounds() {
        let mut w = WrappedFloat::new(5.0, 0.0, 10.0);
        w.shift_value(7.0);
        assert!(approx(w.value(), 2.0));
        w.shift_bounds(5.0);
        assert!(approx(w.value(), 12.0));
        assert!(approx(w.lower_bound(), 5.0));
    }

    #[test]
    fn test_limit_value_plain_range() {
        let v = WrappedFloat::new(5.0, -10.0, 10.0);
        assert_eq!(WrappedFloat::limit_value_f32(&v, 1.0, 4.0), (4.0, LimitStatus::Max));

        let inside = WrappedFloat::new(2.0, -10.0, 10.0);
        assert_eq!(
            WrappedFloat::limit_value_f32(&inside, 1.0, 4.0),
            (2.0, LimitStatus::Unchanged)
        );
    }

    #[test]
    fn test_limit_value_snaps_across_wrap() {
        // -9 is 3 away from 8 going down through the wrap point, 10 away from 1.
        let v = WrappedFloat::new(-9.0, -10.0, 10.0);
        assert_eq!(WrappedFloat::limit_value_f32(&v, 1.0, 8.0), (8.0, LimitStatus::Max));

        let v = WrappedFloat::new(-1.0, -10.0, 10.0);
        assert_eq!(WrappedFloat::limit_value_f32(&v, 1.0, 8.0), (1.0, LimitStatus::Min));
    }

    #[test]
    fn test_limit_value_range_crossing_wrap() {
        let v = WrappedFloat::new(9.0, -10.0, 10.0);
        assert_eq!(
            WrappedFloat::limit_value_f32(&v, 2.0, 1.0),
            (9.0, LimitStatus::Unchanged)
        );
        let v = WrappedFloat::new(1.8, -10.0, 10.0);
        assert_eq!(WrappedFloat::limit_value_f32(&v, 2.0, 1.0), (2.0, LimitStatus::Min));
    }
}
