//! Types that convert and validate values themselves.
//!
//! A [`Native`] type bypasses the registry: once enabled with
//! [`native!`](crate::native), fields of that type (and `Option`s and `Vec`s
//! of it) always use its own conversion, even if a registry entry exists.

use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;

use crate::error::ScanfigError;
use crate::naming::friendly_type_name;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::Tags;

/// Conversion implemented by the destination type.
///
/// Methods run on a copy of the current value, which is only written back
/// when they succeed. Only [`set_str`](Self::set_str) is required; the
/// numeric and boolean forms go through their text representation by
/// default.
pub trait Native: Clone + Default + Display + 'static {
    fn set_str(&mut self, value: &str, tags: &Tags) -> Result<(), ScanfigError>;

    fn set_int(&mut self, value: i64, tags: &Tags) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string(), tags)
    }

    fn set_uint(&mut self, value: u64, tags: &Tags) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string(), tags)
    }

    fn set_float(&mut self, value: f64, tags: &Tags) -> Result<(), ScanfigError> {
        self.set_str(&value.to_string(), tags)
    }

    fn set_bool(&mut self, value: bool, _tags: &Tags) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, friendly_type_name::<Self>()))
    }

    /// Whether a bare command-line flag sets this value.
    fn is_bool_flag() -> bool {
        false
    }
}

pub struct NativeCreator<T>(PhantomData<fn() -> T>);

impl<T> NativeCreator<T> {
    pub fn new() -> Self {
        NativeCreator(PhantomData)
    }
}

impl<T> Default for NativeCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Native> SetterCreator<T> for NativeCreator<T> {
    fn create(&self, slot: Slot<T>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(NativeSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct NativeSetter<T: 'static> {
    slot: Slot<T>,
    tags: Tags,
}

impl<T: Native> NativeSetter<T> {
    fn update(
        &self,
        f: impl FnOnce(&mut T, &Tags) -> Result<(), ScanfigError>,
    ) -> Result<(), ScanfigError> {
        let mut value = self.slot.get().unwrap_or_default();
        f(&mut value, &self.tags)?;
        self.slot.store(value)
    }
}

impl<T: Native> Setter for NativeSetter<T> {
    fn render(&self) -> String {
        self.slot.get().unwrap_or_default().to_string()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        self.update(|v, tags| v.set_str(value, tags))
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        self.update(|v, tags| v.set_int(value, tags))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        self.update(|v, tags| v.set_uint(value, tags))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        self.update(|v, tags| v.set_float(value, tags))
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        self.update(|v, tags| v.set_bool(value, tags))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }

    fn is_bool_flag(&self) -> bool {
        T::is_bool_flag()
    }
}

/// Implement [`Configurable`](crate::Configurable) for [`Native`] types.
#[macro_export]
macro_rules! native {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Configurable for $ty {
            fn zero() -> Self {
                <$ty as ::core::default::Default>::default()
            }

            fn creator(
                _registry: &$crate::Registry,
            ) -> ::core::option::Option<::std::sync::Arc<dyn $crate::SetterCreator<Self>>> {
                ::core::option::Option::Some(::std::sync::Arc::new(
                    $crate::NativeCreator::<$ty>::new(),
                ))
            }
        }
    )+};
}
