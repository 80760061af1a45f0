use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::Tags;
use crate::validate::check_bounds;

pub trait Float: Copy + PartialOrd + Display + Default + FromStr + 'static {
    const NAME: &'static str;
    /// Narrow `value`, or `None` if that would lose precision.
    fn from_f64(value: f64) -> Option<Self>;
    fn to_f64(self) -> f64;
}

impl Float for f32 {
    const NAME: &'static str = "f32";

    fn from_f64(value: f64) -> Option<Self> {
        let narrowed = value as f32;
        (f64::from(narrowed) == value || value.is_nan()).then_some(narrowed)
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Float for f64 {
    const NAME: &'static str = "f64";

    fn from_f64(value: f64) -> Option<Self> {
        Some(value)
    }

    fn to_f64(self) -> f64 {
        self
    }
}

pub struct FloatCreator<T>(PhantomData<fn() -> T>);

impl<T> FloatCreator<T> {
    pub fn new() -> Self {
        FloatCreator(PhantomData)
    }
}

impl<T> Default for FloatCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> SetterCreator<T> for FloatCreator<T> {
    fn create(&self, slot: Slot<T>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(FloatSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct FloatSetter<T: 'static> {
    slot: Slot<T>,
    tags: Tags,
}

impl<T: Float> FloatSetter<T> {
    fn assign(&self, value: T) -> Result<(), ScanfigError> {
        check_bounds(
            &value,
            &self.tags,
            T::NAME,
            |text| text.trim().parse().ok(),
            |v| v.to_string(),
        )?;
        self.slot.store(value)
    }

    fn assign_f64(&self, value: f64, shown: impl Display) -> Result<(), ScanfigError> {
        let narrowed = T::from_f64(value).ok_or_else(|| ScanfigError::conversion(shown, T::NAME))?;
        self.assign(narrowed)
    }
}

impl<T: Float> Setter for FloatSetter<T> {
    fn render(&self) -> String {
        self.slot.get().unwrap_or_default().to_string()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let parsed: T = value
            .trim()
            .parse()
            .map_err(|_| ScanfigError::conversion(value, T::NAME))?;
        self.assign(parsed)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        let converted = T::from_f64(value as f64)
            .filter(|f| f.to_f64() as i64 == value)
            .ok_or_else(|| ScanfigError::conversion(value, T::NAME))?;
        self.assign(converted)
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        let converted = T::from_f64(value as f64)
            .filter(|f| f.to_f64() as u64 == value)
            .ok_or_else(|| ScanfigError::conversion(value, T::NAME))?;
        self.assign(converted)
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        self.assign_f64(value, value)
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.assign_f64(if value { 1.0 } else { 0.0 }, value)
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }
}
