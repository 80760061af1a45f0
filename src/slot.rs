//! Shared handles to the storage a setter writes into.
//!
//! A [`Slot`] either owns its value or projects into a parent slot through a
//! lens (`|record| &mut record.field`). Projections are re-resolved on every
//! access, so a projection through an `Option` that has since become `None`
//! simply reports the location as unavailable.
//!
//! A [`relocatable`](Slot::relocatable) slot owns its value until it is moved
//! somewhere else; from then on every access goes to the new location.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::ScanfigError;

trait Access<T> {
    fn access(&self, f: &mut dyn FnMut(&mut T));
}

struct Owned<T>(RefCell<T>);

impl<T> Access<T> for Owned<T> {
    fn access(&self, f: &mut dyn FnMut(&mut T)) {
        let mut value = self.0.borrow_mut();
        f(&mut *value);
    }
}

enum Place<T: 'static> {
    Here(T),
    Moved(Slot<T>),
}

struct Movable<T: 'static>(RefCell<Place<T>>);

impl<T: 'static> Access<T> for Movable<T> {
    fn access(&self, f: &mut dyn FnMut(&mut T)) {
        let target = match &mut *self.0.borrow_mut() {
            Place::Here(value) => return f(value),
            Place::Moved(target) => target.clone(),
        };
        target.inner.access(f);
    }
}

/// The right to move a [`relocatable`](Slot::relocatable) slot's value out.
pub(crate) struct Relocation<T: 'static>(Rc<Movable<T>>);

impl<T: 'static> Relocation<T> {
    /// Move the value into `target` and forward the slot there. Returns
    /// `false`, leaving the value in place, when `target` is unavailable.
    pub(crate) fn move_to(self, target: Slot<T>) -> bool {
        if target.with_mut(|_| ()).is_none() {
            return false;
        }
        match self.0.0.replace(Place::Moved(target.clone())) {
            Place::Here(value) => target.set(value),
            Place::Moved(_) => false,
        }
    }
}

type Lens<P, T> = Box<dyn Fn(&mut P) -> Option<&mut T>>;

struct Projection<P: 'static, T> {
    parent: Slot<P>,
    lens: Lens<P, T>,
}

impl<P: 'static, T> Access<T> for Projection<P, T> {
    fn access(&self, f: &mut dyn FnMut(&mut T)) {
        self.parent.inner.access(&mut |parent: &mut P| {
            if let Some(value) = (self.lens)(parent) {
                f(value);
            }
        });
    }
}

/// A storage location for one value.
///
/// Cloning a slot clones the handle, not the value.
pub struct Slot<T: 'static> {
    inner: Rc<dyn Access<T>>,
}

impl<T: 'static> Slot<T> {
    /// A slot owning `value`.
    pub fn new(value: T) -> Self {
        Slot {
            inner: Rc::new(Owned(RefCell::new(value))),
        }
    }

    /// A slot owning `value` for now, and the handle that later moves it.
    pub(crate) fn relocatable(value: T) -> (Self, Relocation<T>) {
        let movable = Rc::new(Movable(RefCell::new(Place::Here(value))));
        let slot = Slot {
            inner: Rc::clone(&movable) as Rc<dyn Access<T>>,
        };
        (slot, Relocation(movable))
    }

    /// A slot for a field of this slot's value.
    pub fn field<U: 'static, F>(&self, lens: F) -> Slot<U>
    where
        F: Fn(&mut T) -> &mut U + 'static,
    {
        self.project(move |value: &mut T| Some(lens(value)))
    }

    /// A slot for a part of this slot's value that may not exist.
    pub fn project<U: 'static, F>(&self, lens: F) -> Slot<U>
    where
        F: Fn(&mut T) -> Option<&mut U> + 'static,
    {
        Slot {
            inner: Rc::new(Projection {
                parent: self.clone(),
                lens: Box::new(lens),
            }),
        }
    }

    /// Run `f` on the value. Returns `None` when the location is unavailable.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut out = None;
        self.inner.access(&mut |value| {
            if let Some(f) = f.take() {
                out = Some(f(value));
            }
        });
        out
    }

    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with_mut(|value| value.clone())
    }

    /// Store `value`. Returns `false` when the location is unavailable.
    pub fn set(&self, value: T) -> bool {
        self.with_mut(move |slot| *slot = value).is_some()
    }

    /// Store `value`, or fail when the location is unavailable.
    pub fn store(&self, value: T) -> Result<(), ScanfigError> {
        if self.set(value) {
            Ok(())
        } else {
            Err(ScanfigError::Unavailable { path: None })
        }
    }

    pub fn replace(&self, value: T) -> Option<T> {
        self.with_mut(move |slot| std::mem::replace(slot, value))
    }

    pub fn take(&self) -> Option<T>
    where
        T: Default,
    {
        self.with_mut(std::mem::take)
    }
}

impl<T: 'static> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Server {
        host: String,
        port: u16,
        limits: Option<Limits>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Limits {
        max: u32,
    }

    #[test]
    fn owned_slot_roundtrip() {
        let slot = Slot::new(5u16);
        assert_eq!(slot.get(), Some(5));
        assert!(slot.set(6));
        assert_eq!(slot.replace(7), Some(6));
        assert_eq!(slot.take(), Some(7));
        assert_eq!(slot.get(), Some(0));
    }

    #[test]
    fn field_projection_writes_through() {
        let server = Slot::new(Server::default());
        let port = server.field(|s: &mut Server| &mut s.port);
        let host = server.field(|s: &mut Server| &mut s.host);

        port.set(8080);
        host.set("localhost".into());

        let value = server.get().unwrap();
        assert_eq!(value.port, 8080);
        assert_eq!(value.host, "localhost");
    }

    #[test]
    fn clones_share_storage() {
        let slot = Slot::new(1i32);
        let other = slot.clone();
        other.set(2);
        assert_eq!(slot.get(), Some(2));
    }

    #[test]
    fn projection_through_none_is_unavailable() {
        let server = Slot::new(Server::default());
        let limits = server.field(|s: &mut Server| &mut s.limits);
        let max = limits.project(|l: &mut Option<Limits>| l.as_mut().map(|l| &mut l.max));

        assert_eq!(max.get(), None);
        assert!(!max.set(3));

        limits.set(Some(Limits::default()));
        assert!(max.set(3));
        assert_eq!(server.get().unwrap().limits, Some(Limits { max: 3 }));
    }

    #[test]
    fn store_reports_unavailable_location() {
        let server = Slot::new(Server::default());
        let max = server.project(|s: &mut Server| s.limits.as_mut().map(|l| &mut l.max));
        assert!(matches!(max.store(3), Err(ScanfigError::Unavailable { .. })));
        server.field(|s: &mut Server| &mut s.port).store(1).unwrap();
        assert_eq!(server.get().unwrap().port, 1);
    }

    #[test]
    fn relocated_slot_forwards_to_target() {
        let (temp, relocation) = Slot::relocatable(Limits::default());
        let max = temp.field(|l: &mut Limits| &mut l.max);
        max.set(4);

        let server = Slot::new(Server {
            limits: Some(Limits::default()),
            ..Server::default()
        });
        let target = server.project(|s: &mut Server| s.limits.as_mut());
        assert!(relocation.move_to(target));
        assert_eq!(server.get().unwrap().limits, Some(Limits { max: 4 }));

        max.set(9);
        assert_eq!(server.get().unwrap().limits, Some(Limits { max: 9 }));
        assert_eq!(temp.get(), Some(Limits { max: 9 }));
    }

    #[test]
    fn relocation_to_unavailable_target_keeps_value() {
        let (temp, relocation) = Slot::relocatable(Limits { max: 2 });
        let server = Slot::new(Server::default());
        let target = server.project(|s: &mut Server| s.limits.as_mut());
        assert!(!relocation.move_to(target));
        assert_eq!(temp.get(), Some(Limits { max: 2 }));
    }
}
