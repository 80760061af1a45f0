use std::any::Any;

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::{Tags, keys};
use crate::validate::check_pattern;

pub struct StringCreator;

impl SetterCreator<String> for StringCreator {
    fn create(&self, slot: Slot<String>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(StringSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct StringSetter {
    slot: Slot<String>,
    tags: Tags,
}

impl Setter for StringSetter {
    fn render(&self) -> String {
        self.slot.get().unwrap_or_default()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        check_pattern(&self.tags, keys::REGEXP, value, value)?;
        self.slot.store(value.to_string())
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string())
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string())
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string())
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string())
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }
}
