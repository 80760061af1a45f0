//! The value-setting abstraction: [`Setter`], its factories, and the
//! type-keyed [`Registry`] that finds a factory for a field.
//!
//! Lookup goes through [`Configurable::creator`]. For a plain type it is an
//! exact registry lookup. `Option<T>` and `Vec<T>` first look themselves up,
//! then fall back to `T`'s creator wrapped in the pointer or sequence adapter,
//! so `Vec<Option<u16>>` works as soon as `u16` is registered.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::ScanfigError;
use crate::pointer::PointerCreator;
use crate::scan::{FieldInfo, Materializer, Scanner};
use crate::sequence::SequenceCreator;
use crate::slot::Slot;
use crate::types::Tags;

/// Converts, validates and stores values into one location.
///
/// Every method leaves the location untouched when it fails.
pub trait Setter {
    /// The current value as display text. Works before anything was set.
    fn render(&self) -> String;
    fn set_str(&self, value: &str) -> Result<(), ScanfigError>;
    fn set_int(&self, value: i64) -> Result<(), ScanfigError>;
    fn set_uint(&self, value: u64) -> Result<(), ScanfigError>;
    fn set_float(&self, value: f64) -> Result<(), ScanfigError>;
    fn set_bool(&self, value: bool) -> Result<(), ScanfigError>;
    /// The current value, boxed as its exact Rust type.
    fn get(&self) -> Box<dyn Any>;
    /// Whether a command-line flag for this setter may omit its value.
    fn is_bool_flag(&self) -> bool {
        false
    }
}

/// Builds setters bound to a location of type `T`.
pub trait SetterCreator<T: 'static>: Send + Sync + 'static {
    fn create(&self, slot: Slot<T>, tags: &Tags) -> Box<dyn Setter>;
}

/// Setter factories keyed by exact type.
#[derive(Clone, Default)]
pub struct Registry {
    creators: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every builtin leaf converter.
    pub fn with_defaults() -> Self {
        let mut registry = Registry::new();
        crate::values::register_defaults(&mut registry);
        registry
    }

    /// Register `creator` for `T`, replacing any earlier registration.
    pub fn add<T: 'static>(&mut self, creator: impl SetterCreator<T>) {
        let creator: Arc<dyn SetterCreator<T>> = Arc::new(creator);
        self.creators.insert(TypeId::of::<T>(), Arc::new(creator));
    }

    /// The creator registered for exactly `T`.
    pub fn creator<T: 'static>(&self) -> Option<Arc<dyn SetterCreator<T>>> {
        self.creators
            .get(&TypeId::of::<T>())?
            .downcast_ref::<Arc<dyn SetterCreator<T>>>()
            .cloned()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.creators.contains_key(&TypeId::of::<T>())
    }

    /// A setter for `slot`, if one can be found for `T`.
    pub fn setter<T: Configurable>(&self, slot: &Slot<T>, tags: &Tags) -> Option<Box<dyn Setter>> {
        T::creator(self).map(|creator| creator.create(slot.clone(), tags))
    }
}

static DEFAULT_REGISTRY: LazyLock<RwLock<Registry>> =
    LazyLock::new(|| RwLock::new(Registry::with_defaults()));

/// A snapshot of the process-wide registry.
pub fn default_registry() -> Registry {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Register `creator` for `T` in the process-wide registry.
pub fn register<T: 'static>(creator: impl SetterCreator<T>) {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add(creator);
}

/// A type that can appear as a field of a scanned record.
///
/// Leaf types only need [`zero`](Self::zero) plus a registry entry. Records get
/// their implementation from [`record!`](crate::record), self-converting types
/// from [`native!`](crate::native).
pub trait Configurable: Clone + 'static {
    /// The value a fresh location starts with.
    fn zero() -> Self;

    fn creator(registry: &Registry) -> Option<Arc<dyn SetterCreator<Self>>> {
        registry.creator::<Self>()
    }

    /// Scan into this value as a nested record. Returns `false` for types that
    /// are not records.
    #[doc(hidden)]
    fn descend(_scanner: &mut Scanner, _slot: Slot<Self>, _field: &FieldInfo) -> bool {
        false
    }

    /// How to build this value lazily once something inside it was set.
    #[doc(hidden)]
    fn materializer() -> Option<Materializer<Self>> {
        None
    }
}

impl<T: Configurable> Configurable for Option<T> {
    fn zero() -> Self {
        None
    }

    fn creator(registry: &Registry) -> Option<Arc<dyn SetterCreator<Self>>> {
        registry.creator::<Self>().or_else(|| {
            T::creator(registry)
                .map(|inner| Arc::new(PointerCreator::new(inner)) as Arc<dyn SetterCreator<Self>>)
        })
    }

    fn descend(scanner: &mut Scanner, slot: Slot<Self>, field: &FieldInfo) -> bool {
        if slot.with_mut(|value| value.is_some()).unwrap_or(false) {
            return T::descend(scanner, slot.project(|value: &mut Option<T>| value.as_mut()), field);
        }
        match T::materializer() {
            Some(materializer) => {
                scanner.defer(slot, materializer, field);
                true
            }
            None => false,
        }
    }

    fn materializer() -> Option<Materializer<Self>> {
        T::materializer().map(Materializer::wrap_some)
    }
}

impl<T: Configurable> Configurable for Vec<T> {
    fn zero() -> Self {
        Vec::new()
    }

    fn creator(registry: &Registry) -> Option<Arc<dyn SetterCreator<Self>>> {
        registry.creator::<Self>().or_else(|| {
            T::creator(registry)
                .map(|inner| Arc::new(SequenceCreator::new(inner)) as Arc<dyn SetterCreator<Self>>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Celsius, CelsiusCreator};

    fn setter_for<T: Configurable>(registry: &Registry, slot: &Slot<T>) -> Box<dyn Setter> {
        registry
            .setter(slot, &Tags::new())
            .unwrap_or_else(|| panic!("no setter for {}", std::any::type_name::<T>()))
    }

    #[test]
    fn base_type_lookup() {
        let registry = Registry::with_defaults();
        let slot = Slot::new(0i32);
        setter_for(&registry, &slot).set_str("42").unwrap();
        assert_eq!(slot.get(), Some(42));
    }

    #[test]
    fn unregistered_type_has_no_setter() {
        let registry = Registry::new();
        assert!(registry.setter(&Slot::new(0i32), &Tags::new()).is_none());
        assert!(registry.setter(&Slot::new(Vec::<Option<i32>>::new()), &Tags::new()).is_none());
    }

    #[test]
    fn sequence_of_pointers_allocates_each_element() {
        let registry = Registry::with_defaults();
        let slot: Slot<Vec<Option<i32>>> = Slot::new(Vec::new());
        let setter = setter_for(&registry, &slot);
        setter.set_str("1").unwrap();
        setter.set_str("2").unwrap();
        assert_eq!(slot.get(), Some(vec![Some(1), Some(2)]));
    }

    #[test]
    fn pointer_to_sequence_composes() {
        let registry = Registry::with_defaults();
        let slot: Slot<Option<Vec<i32>>> = Slot::new(None);
        let setter = setter_for(&registry, &slot);
        setter.set_str("1").unwrap();
        setter.set_str("2").unwrap();
        // Each set goes through a fresh temporary sequence.
        assert_eq!(slot.get(), Some(Some(vec![2])));
    }

    #[test]
    fn nested_pointers_compose() {
        let registry = Registry::with_defaults();
        let slot: Slot<Option<Option<u8>>> = Slot::new(None);
        setter_for(&registry, &slot).set_int(7).unwrap();
        assert_eq!(slot.get(), Some(Some(Some(7))));
    }

    #[test]
    fn registering_derived_type_takes_precedence() {
        let mut registry = Registry::with_defaults();
        registry.add::<Option<Celsius>>(crate::pointer::PointerCreator::<Celsius>::new(Arc::new(CelsiusCreator)));
        registry.add::<Celsius>(CelsiusCreator);
        assert!(registry.contains::<Option<Celsius>>());
        let slot: Slot<Option<Celsius>> = Slot::new(None);
        setter_for(&registry, &slot).set_str("21.5").unwrap();
        assert_eq!(slot.get(), Some(Some(Celsius(21.5))));
    }

    #[test]
    fn re_registration_replaces() {
        struct Doubling;
        struct DoublingSetter(Slot<u32>);
        impl Setter for DoublingSetter {
            fn render(&self) -> String {
                self.0.get().unwrap_or_default().to_string()
            }
            fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
                let n: u32 = value
                    .parse()
                    .map_err(|_| ScanfigError::conversion(value, "u32"))?;
                self.0.set(n * 2);
                Ok(())
            }
            fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
                self.set_str(&value.to_string())
            }
            fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
                self.set_str(&value.to_string())
            }
            fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
                Err(ScanfigError::conversion(value, "u32"))
            }
            fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
                Err(ScanfigError::conversion(value, "u32"))
            }
            fn get(&self) -> Box<dyn Any> {
                Box::new(self.0.get().unwrap_or_default())
            }
        }
        impl SetterCreator<u32> for Doubling {
            fn create(&self, slot: Slot<u32>, _tags: &Tags) -> Box<dyn Setter> {
                Box::new(DoublingSetter(slot))
            }
        }

        let mut registry = Registry::with_defaults();
        registry.add::<u32>(Doubling);
        let slot = Slot::new(0u32);
        setter_for(&registry, &slot).set_str("4").unwrap();
        assert_eq!(slot.get(), Some(8));
    }

    #[test]
    fn get_returns_typed_value() {
        let registry = Registry::with_defaults();
        let slot = Slot::new(String::from("hi"));
        let value = setter_for(&registry, &slot).get();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hi"));
    }

    #[test]
    fn default_registry_knows_builtins() {
        let registry = default_registry();
        assert!(registry.contains::<bool>());
        assert!(registry.contains::<String>());
        assert!(registry.contains::<std::time::Duration>());
        assert!(!registry.contains::<Vec<bool>>());
    }
}
