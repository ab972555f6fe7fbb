use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;

/// Arbitrary-ish rational magnitude: `integer * 2^-exponent`. Encoded on
/// the wire as two ZigZag varints (see the codec crate); compared and
/// hashed by the `f64` the pair denotes.
#[derive(Clone, Copy, Debug)]
pub struct Number {
    pub integer: i64,
    pub exponent: i64,
}

impl Number {
    pub fn new(integer: i64, exponent: i64) -> Self {
        Number { integer, exponent }
    }

    pub fn from_i64(v: i64) -> Self {
        Number { integer: v, exponent: 0 }
    }

    pub fn as_f64(&self) -> f64 {
        (self.integer as f64) * 2f64.powf(-(self.exponent as f64))
    }

    pub fn is_finite(&self) -> bool {
        self.as_f64().is_finite()
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64() == other.as_f64()
    }
}
impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        OrderedFloat(self.as_f64()).cmp(&OrderedFloat(other.as_f64()))
    }
}
impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        OrderedFloat(self.as_f64()).hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn equality_is_by_value_not_representation() {
        assert_eq!(Number::new(2, 1), Number::new(1, 0));
        assert_eq!(Number::from_i64(5).as_f64(), 5.0);
    }

    #[test]
    fn rejects_are_caught_via_is_finite() {
        let huge = Number::new(i64::MAX, -1024);
        assert!(!huge.is_finite());
    }

    #[test]
    fn ordering_matches_magnitude() {
        assert!(Number::from_i64(1) < Number::from_i64(2));
        assert!(Number::new(3, 1) < Number::from_i64(2)); // 3/2 < 2
    }
}
