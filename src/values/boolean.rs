use std::any::Any;

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::{Tags, parse_bool};

pub struct BoolCreator;

impl SetterCreator<bool> for BoolCreator {
    fn create(&self, slot: Slot<bool>, _tags: &Tags) -> Box<dyn Setter> {
        Box::new(BoolSetter(slot))
    }
}

struct BoolSetter(Slot<bool>);

impl BoolSetter {
    fn assign(&self, value: bool) -> Result<(), ScanfigError> {
        self.0.store(value)
    }
}

impl Setter for BoolSetter {
    fn render(&self) -> String {
        self.0.get().unwrap_or_default().to_string()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let parsed = parse_bool(value).ok_or_else(|| ScanfigError::conversion(value, "bool"))?;
        self.assign(parsed)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        self.assign(value != 0)
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.assign(value != 0)
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        self.assign(value != 0.0)
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.assign(value)
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.0.get().unwrap_or_default())
    }

    fn is_bool_flag(&self) -> bool {
        true
    }
}
