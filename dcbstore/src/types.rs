//! Core types for the `dcbstore` engine.
//!
//! Types here use smart constructors so that invalid values cannot be
//! represented after construction, following the "parse, don't validate"
//! principle.

use nutype::nutype;

/// The position of a committed event in the store's total order.
///
/// Positions are strictly positive, assigned contiguously at commit time,
/// and never reused. Position `1` is the first event ever committed.
#[nutype(
    validate(greater_or_equal = 1),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct Position(u64);

impl Position {
    /// The first valid position (1).
    ///
    /// Note: This is implemented as a function rather than a const
    /// because nutype prevents direct construction.
    pub fn first() -> Self {
        Self::try_new(1).expect("1 is always a valid position")
    }

    /// Returns the position immediately after this one.
    #[must_use]
    pub fn next(self) -> Self {
        let current: u64 = self.into();
        Self::try_new(current + 1).expect("next position should always be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn position_accepts_strictly_positive_values(v in 1u64..=u64::MAX) {
            let result = Position::try_new(v);
            prop_assert!(result.is_ok());
            let value: u64 = result.unwrap().into();
            prop_assert_eq!(value, v);
        }

        #[test]
        fn position_next_increments_by_one(v in 1u64..u64::MAX) {
            let position = Position::try_new(v).unwrap();
            let next: u64 = position.next().into();
            prop_assert_eq!(next, v + 1);
        }

        #[test]
        fn position_ordering_matches_integer_ordering(v1 in 1u64..=u64::MAX, v2 in 1u64..=u64::MAX) {
            let p1 = Position::try_new(v1).unwrap();
            let p2 = Position::try_new(v2).unwrap();

            prop_assert_eq!(p1 < p2, v1 < v2);
            prop_assert_eq!(p1 == p2, v1 == v2);
        }

        #[test]
        fn position_roundtrip_serialization(v in 1u64..=u64::MAX) {
            let position = Position::try_new(v).unwrap();
            let json = serde_json::to_string(&position).unwrap();
            let deserialized: Position = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(position, deserialized);
        }
    }

    #[test]
    fn position_rejects_zero() {
        assert!(Position::try_new(0).is_err());
    }

    #[test]
    fn position_first_is_one() {
        let value: u64 = Position::first().into();
        assert_eq!(value, 1);
    }
}
