//! The pointer adapter: turns a creator for `T` into one for `Option<T>`.

use std::any::Any;
use std::sync::Arc;

use crate::error::ScanfigError;
use crate::setter::{Configurable, Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::Tags;

pub struct PointerCreator<T: 'static> {
    inner: Arc<dyn SetterCreator<T>>,
}

impl<T: Configurable> PointerCreator<T> {
    pub fn new(inner: Arc<dyn SetterCreator<T>>) -> Self {
        PointerCreator { inner }
    }
}

impl<T: Configurable> SetterCreator<Option<T>> for PointerCreator<T> {
    fn create(&self, slot: Slot<Option<T>>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(PointerSetter {
            slot,
            inner: Arc::clone(&self.inner),
            tags: tags.clone(),
        })
    }
}

struct PointerSetter<T: 'static> {
    slot: Slot<Option<T>>,
    inner: Arc<dyn SetterCreator<T>>,
    tags: Tags,
}

impl<T: Configurable> PointerSetter<T> {
    /// Set a fresh value through the inner setter and point at it only if
    /// that succeeded.
    fn assign(
        &self,
        set: impl FnOnce(&dyn Setter) -> Result<(), ScanfigError>,
    ) -> Result<(), ScanfigError> {
        let temp = Slot::new(T::zero());
        set(self.inner.create(temp.clone(), &self.tags).as_ref())?;
        match temp.replace(T::zero()) {
            Some(value) => self.slot.store(Some(value)),
            None => Ok(()),
        }
    }
}

impl<T: Configurable> Setter for PointerSetter<T> {
    fn render(&self) -> String {
        if !self.slot.with_mut(|value| value.is_some()).unwrap_or(false) {
            return String::new();
        }
        let target = self.slot.project(|value: &mut Option<T>| value.as_mut());
        self.inner.create(target, &self.tags).render()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        self.assign(|setter| setter.set_str(value))
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        self.assign(|setter| setter.set_int(value))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.assign(|setter| setter.set_uint(value))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        self.assign(|setter| setter.set_float(value))
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.assign(|setter| setter.set_bool(value))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().flatten())
    }

    fn is_bool_flag(&self) -> bool {
        self.inner
            .create(Slot::new(T::zero()), &self.tags)
            .is_bool_flag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setter::Registry;

    fn setter<T: Configurable>(slot: &Slot<Option<T>>, tags: Tags) -> Box<dyn Setter> {
        Registry::with_defaults().setter(slot, &tags).unwrap()
    }

    #[test]
    fn set_points_at_new_value() {
        let slot: Slot<Option<u16>> = Slot::new(None);
        setter(&slot, Tags::new()).set_str("8080").unwrap();
        assert_eq!(slot.get(), Some(Some(8080)));
    }

    #[test]
    fn failed_set_leaves_pointer_nil() {
        let slot: Slot<Option<u16>> = Slot::new(None);
        let setter = setter(&slot, Tags::new());
        assert!(setter.set_str("not a number").is_err());
        assert_eq!(slot.get(), Some(None));
    }

    #[test]
    fn failed_validation_keeps_previous_value() {
        let slot: Slot<Option<i32>> = Slot::new(Some(3));
        let setter = setter(&slot, Tags::new().le("8"));
        assert!(setter.set_int(9).is_err());
        assert_eq!(slot.get(), Some(Some(3)));
        setter.set_int(8).unwrap();
        assert_eq!(slot.get(), Some(Some(8)));
    }

    #[test]
    fn unset_pointer_renders_empty() {
        let slot: Slot<Option<String>> = Slot::new(None);
        assert_eq!(setter(&slot, Tags::new()).render(), "");
        slot.set(Some("x".into()));
        assert_eq!(setter(&slot, Tags::new()).render(), "x");
    }

    #[test]
    fn get_on_unset_is_typed_none() {
        let slot: Slot<Option<bool>> = Slot::new(None);
        let value = setter(&slot, Tags::new()).get();
        assert_eq!(value.downcast_ref::<Option<bool>>(), Some(&None));
    }

    #[test]
    fn bool_flag_passes_through() {
        let slot: Slot<Option<bool>> = Slot::new(None);
        assert!(setter(&slot, Tags::new()).is_bool_flag());
        let slot: Slot<Option<i8>> = Slot::new(None);
        assert!(!setter(&slot, Tags::new()).is_bool_flag());
    }

    #[test]
    fn unavailable_storage_is_an_error() {
        let owner: Slot<Option<Option<u16>>> = Slot::new(None);
        let slot = owner.project(|value: &mut Option<Option<u16>>| value.as_mut());
        let err = setter(&slot, Tags::new()).set_str("80").unwrap_err();
        assert!(matches!(err, ScanfigError::Unavailable { .. }), "{err}");
        assert_eq!(owner.get(), Some(None));
    }
}
