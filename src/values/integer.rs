use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::Tags;
use crate::validate::check_bounds;

/// Fixed-width integers, widened to `i128` for range checks.
pub trait Integer: Copy + PartialOrd + Display + Default + 'static {
    const NAME: &'static str;
    fn from_wide(value: i128) -> Option<Self>;
}

macro_rules! integer {
    ($($ty:ty),+) => {$(
        impl Integer for $ty {
            const NAME: &'static str = stringify!($ty);

            fn from_wide(value: i128) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )+};
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Parse an integer literal: optional sign, then decimal, `0x`, `0o`, `0b`,
/// or a leading `0` for octal. Underscores between digits are ignored.
pub fn parse_integer<T: Integer>(text: &str) -> Option<T> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return None;
    }
    let digits = digits.replace('_', "");
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(&digits, radix).ok()?;
    T::from_wide(if negative { -magnitude } else { magnitude })
}

pub struct IntegerCreator<T>(PhantomData<fn() -> T>);

impl<T> IntegerCreator<T> {
    pub fn new() -> Self {
        IntegerCreator(PhantomData)
    }
}

impl<T> Default for IntegerCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Integer> SetterCreator<T> for IntegerCreator<T> {
    fn create(&self, slot: Slot<T>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(IntegerSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct IntegerSetter<T: 'static> {
    slot: Slot<T>,
    tags: Tags,
}

impl<T: Integer> IntegerSetter<T> {
    fn assign(&self, value: T) -> Result<(), ScanfigError> {
        check_bounds(&value, &self.tags, T::NAME, parse_integer::<T>, |v| {
            v.to_string()
        })?;
        self.slot.store(value)
    }

    fn assign_wide(&self, value: i128, shown: impl Display) -> Result<(), ScanfigError> {
        let value = T::from_wide(value).ok_or_else(|| ScanfigError::conversion(shown, T::NAME))?;
        self.assign(value)
    }
}

impl<T: Integer> Setter for IntegerSetter<T> {
    fn render(&self) -> String {
        self.slot.get().unwrap_or_default().to_string()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let parsed =
            parse_integer::<T>(value).ok_or_else(|| ScanfigError::conversion(value, T::NAME))?;
        self.assign(parsed)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        self.assign_wide(i128::from(value), value)
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.assign_wide(i128::from(value), value)
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(ScanfigError::conversion(value, T::NAME));
        }
        self.assign_wide(value as i128, value)
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.assign_wide(i128::from(value), value)
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setter<T: Integer>(slot: &Slot<T>, tags: Tags) -> Box<dyn Setter> {
        IntegerCreator::<T>::new().create(slot.clone(), &tags)
    }

    #[test]
    fn parses_literals() {
        assert_eq!(parse_integer::<i32>("42"), Some(42));
        assert_eq!(parse_integer::<i32>("-42"), Some(-42));
        assert_eq!(parse_integer::<i32>("+7"), Some(7));
        assert_eq!(parse_integer::<i32>("0x1F"), Some(31));
        assert_eq!(parse_integer::<i32>("0o17"), Some(15));
        assert_eq!(parse_integer::<i32>("017"), Some(15));
        assert_eq!(parse_integer::<i32>("0b101"), Some(5));
        assert_eq!(parse_integer::<i32>("1_000"), Some(1000));
        assert_eq!(parse_integer::<i32>("0"), Some(0));
    }

    #[test]
    fn rejects_bad_literals() {
        assert_eq!(parse_integer::<i32>(""), None);
        assert_eq!(parse_integer::<i32>("0x"), None);
        assert_eq!(parse_integer::<i32>("--1"), None);
        assert_eq!(parse_integer::<i32>("1.5"), None);
        assert_eq!(parse_integer::<i32>("_1"), None);
        assert_eq!(parse_integer::<u8>("256"), None);
        assert_eq!(parse_integer::<u8>("-1"), None);
    }

    #[test]
    fn le_bound_keeps_prior_value_on_failure() {
        let slot = Slot::new(1i32);
        let setter = setter(&slot, Tags::new().le("8"));
        setter.set_str("8").unwrap();
        assert_eq!(slot.get(), Some(8));
        let err = setter.set_str("9").unwrap_err();
        assert!(matches!(err, ScanfigError::Validation { .. }));
        assert_eq!(slot.get(), Some(8));
    }

    #[test]
    fn malformed_bound_fails() {
        let slot = Slot::new(0u16);
        let err = setter(&slot, Tags::new().ge("lots")).set_int(3).unwrap_err();
        assert!(matches!(err, ScanfigError::InvalidConstraint { .. }));
        assert_eq!(slot.get(), Some(0));
    }

    #[test]
    fn typed_setters_check_range() {
        let slot = Slot::new(0i8);
        let setter = setter(&slot, Tags::new());
        assert!(setter.set_int(200).is_err());
        assert!(setter.set_uint(u64::MAX).is_err());
        setter.set_uint(100).unwrap();
        assert_eq!(slot.get(), Some(100));
        setter.set_float(-3.0).unwrap();
        assert_eq!(slot.get(), Some(-3));
        assert!(setter.set_float(1.5).is_err());
        assert!(setter.set_float(f64::NAN).is_err());
        setter.set_bool(true).unwrap();
        assert_eq!(slot.get(), Some(1));
    }

    #[test]
    fn unsigned_rejects_negative() {
        let slot = Slot::new(5u32);
        assert!(setter(&slot, Tags::new()).set_int(-1).is_err());
        assert_eq!(slot.get(), Some(5));
    }

    #[test]
    fn render_and_get() {
        let slot = Slot::new(-12i64);
        let setter = setter(&slot, Tags::new());
        assert_eq!(setter.render(), "-12");
        assert_eq!(setter.get().downcast_ref::<i64>(), Some(&-12));
    }
}
