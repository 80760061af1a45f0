//! The sequence adapter: turns a creator for `T` into one for `Vec<T>`.
//!
//! `append` (default `true`) controls whether sets add elements; with
//! `append:"false"` the first successful set replaces the whole sequence and
//! later ones append. `sep` splits text input into several elements.

use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;

use crate::error::{Errors, ScanfigError};
use crate::setter::{Configurable, Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::Tags;

pub struct SequenceCreator<T: 'static> {
    inner: Arc<dyn SetterCreator<T>>,
}

impl<T: Configurable> SequenceCreator<T> {
    pub fn new(inner: Arc<dyn SetterCreator<T>>) -> Self {
        SequenceCreator { inner }
    }
}

impl<T: Configurable> SetterCreator<Vec<T>> for SequenceCreator<T> {
    fn create(&self, slot: Slot<Vec<T>>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(SequenceSetter {
            slot,
            inner: Arc::clone(&self.inner),
            append: Cell::new(tags.appends()),
            tags: tags.clone(),
        })
    }
}

struct SequenceSetter<T: 'static> {
    slot: Slot<Vec<T>>,
    inner: Arc<dyn SetterCreator<T>>,
    append: Cell<bool>,
    tags: Tags,
}

impl<T: Configurable> SequenceSetter<T> {
    fn element(
        &self,
        set: impl FnOnce(&dyn Setter) -> Result<(), ScanfigError>,
    ) -> Result<T, ScanfigError> {
        let temp = Slot::new(T::zero());
        set(self.inner.create(temp.clone(), &self.tags).as_ref())?;
        Ok(temp.replace(T::zero()).unwrap_or_else(T::zero))
    }

    fn push(&self, value: T) -> Result<(), ScanfigError> {
        let append = self.append.get();
        self.slot
            .with_mut(move |items| {
                if !append {
                    items.clear();
                }
                items.push(value);
            })
            .ok_or(ScanfigError::Unavailable { path: None })?;
        self.append.set(true);
        Ok(())
    }

    fn add(
        &self,
        set: impl FnOnce(&dyn Setter) -> Result<(), ScanfigError>,
    ) -> Result<(), ScanfigError> {
        let value = self.element(set)?;
        self.push(value)
    }
}

impl<T: Configurable> Setter for SequenceSetter<T> {
    fn render(&self) -> String {
        let len = self.slot.with_mut(|items| items.len()).unwrap_or(0);
        let plain = Tags::new();
        (0..len)
            .map(|i| {
                let item = self.slot.project(move |items: &mut Vec<T>| items.get_mut(i));
                self.inner.create(item, &plain).render()
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let Some(separator) = self.tags.separator() else {
            return self.add(|setter| setter.set_str(value));
        };
        let mut errors = Errors::new();
        for piece in value.split(separator) {
            errors.check(self.add(|setter| setter.set_str(piece)));
        }
        errors.into_result()
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        self.add(|setter| setter.set_int(value))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.add(|setter| setter.set_uint(value))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        self.add(|setter| setter.set_float(value))
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.add(|setter| setter.set_bool(value))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }

    fn is_bool_flag(&self) -> bool {
        self.inner
            .create(Slot::new(T::zero()), &self.tags)
            .is_bool_flag()
    }
}
