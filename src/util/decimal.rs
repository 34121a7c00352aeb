use std::{fmt::Display, marker::PhantomData, ops::Deref};

use rust_decimal::Decimal;

use self::constraint::{GreaterEqualZero, Neg, Pos};

// These were deprecated as methods on Decimal, so re-implement them.
// Those implementations don't actually do zero checks, and can result
// in weird behaviour.
pub fn is_positive(d: &Decimal) -> bool {
    d.is_sign_positive() && !d.is_zero()
}

pub fn is_negative(d: &Decimal) -> bool {
    d.is_sign_negative() && !d.is_zero()
}

pub fn dollar_precision_str(d: &Decimal) -> String {
    format!("{:.2}", d)
}

/// Renders with at least `min_precision` decimal places, but never drops
/// significant digits.
pub fn to_string_min_precision(d: &Decimal, min_precision: u32) -> String {
    let normalized = d.normalize();
    if normalized.scale() >= min_precision {
        normalized.to_string()
    } else {
        format!("{:.*}", min_precision as usize, normalized)
    }
}

pub trait DecConstraint {
    fn is_ok(d: &Decimal) -> bool;
}

pub mod constraint {
    use rust_decimal::Decimal;

    use super::{is_negative, is_positive, DecConstraint};

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct Neg(());
    impl DecConstraint for Neg {
        fn is_ok(d: &Decimal) -> bool {
            is_negative(d)
        }
    }

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct GreaterEqualZero(());
    impl DecConstraint for GreaterEqualZero {
        fn is_ok(d: &Decimal) -> bool {
            d.is_sign_positive() || d.is_zero()
        }
    }

    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct Pos(());
    impl DecConstraint for Pos {
        fn is_ok(d: &Decimal) -> bool {
            is_positive(d)
        }
    }
}

// A constrained instance of Decimal. This can only be created through ::try_from,
// which will enforce the DecConstraint. Ledger amounts carry their sign
// guarantees in the type, so arithmetic on them cannot silently leave the
// valid range.
//
// PhantomData here is size zero, and is simply to make the compiler happy.
pub struct ConstrainedDecimal<CONSTRAINT>(Decimal, PhantomData<CONSTRAINT>);

impl<CONSTRAINT: DecConstraint> TryFrom<Decimal> for ConstrainedDecimal<CONSTRAINT> {
    type Error = String;

    fn try_from(d: Decimal) -> Result<Self, Self::Error> {
        if CONSTRAINT::is_ok(&d) {
            Ok(Self(d, PhantomData))
        } else {
            Err(format!(
                "{} does not match constraints of {}",
                d,
                std::any::type_name::<CONSTRAINT>()
            ))
        }
    }
}

impl<CONSTRAINT: DecConstraint> Deref for ConstrainedDecimal<CONSTRAINT> {
    type Target = Decimal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<CONSTRAINT: DecConstraint> Display for ConstrainedDecimal<CONSTRAINT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<CONSTRAINT: DecConstraint> std::fmt::Debug for ConstrainedDecimal<CONSTRAINT> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

impl<CONSTRAINT: DecConstraint> PartialEq for ConstrainedDecimal<CONSTRAINT> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<CONSTRAINT: DecConstraint> Eq for ConstrainedDecimal<CONSTRAINT> {}

impl<CONSTRAINT: DecConstraint> Clone for ConstrainedDecimal<CONSTRAINT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<CONSTRAINT: DecConstraint> Copy for ConstrainedDecimal<CONSTRAINT> {}

impl From<ConstrainedDecimal<Pos>> for ConstrainedDecimal<GreaterEqualZero> {
    fn from(value: ConstrainedDecimal<Pos>) -> Self {
        Self(value.0, PhantomData)
    }
}

impl ConstrainedDecimal<GreaterEqualZero> {
    pub fn zero() -> Self {
        Self(Decimal::ZERO, PhantomData)
    }

    /// Returns None if the result would be negative, or on overflow.
    pub fn checked_sub(self, rhs: Decimal) -> Option<Self> {
        Self::try_from(self.0.checked_sub(rhs)?).ok()
    }

    /// Returns None on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self(self.0.checked_add(rhs.0)?, PhantomData))
    }

    /// Returns None on overflow.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Some(Self(self.0.checked_mul(rhs.0)?, PhantomData))
    }
}

impl ConstrainedDecimal<Pos> {
    pub fn one() -> Self {
        Self(Decimal::ONE, PhantomData)
    }
}

impl ConstrainedDecimal<Neg> {
    /// The magnitude of the value, which is always positive.
    pub fn magnitude(&self) -> ConstrainedDecimal<Pos> {
        ConstrainedDecimal::<Pos>(-self.0, PhantomData)
    }
}

// Convenience aliases
pub type NegDecimal = ConstrainedDecimal<constraint::Neg>;
pub type GreaterEqualZeroDecimal = ConstrainedDecimal<constraint::GreaterEqualZero>;
pub type PosDecimal = ConstrainedDecimal<constraint::Pos>;

#[macro_export]
macro_rules! pdec {
    ($arg:literal) => {{
        use rust_decimal_macros::dec;
        $crate::util::decimal::PosDecimal::try_from(dec!($arg)).unwrap()
    }};
}

#[macro_export]
macro_rules! gezdec {
    ($arg:literal) => {{
        use rust_decimal_macros::dec;
        $crate::util::decimal::GreaterEqualZeroDecimal::try_from(dec!($arg)).unwrap()
    }};
}

#[macro_export]
macro_rules! ndec {
    ($arg:literal) => {{
        use rust_decimal_macros::dec;
        $crate::util::decimal::NegDecimal::try_from(dec!($arg)).unwrap()
    }};
}
