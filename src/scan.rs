//! Walking records into settings.
//!
//! A [`Record`] lists its fields through a [`Fields`] visitor. For each field
//! the [`Scanner`] either finds a setter (a leaf setting), descends into a
//! nested record, or records an unknown-type error and moves on.
//!
//! Optional nested records that are currently `None` are not allocated up
//! front. The scanner scans a zero-valued temporary instead and queues a
//! [`Deferred`] entry; after loading, the temporary is moved into the
//! `Option` only if something in it was set. Settings scanned from the
//! temporary follow it there.

use std::rc::Rc;

use tracing::trace;

use crate::error::{Errors, ScanfigError};
use crate::naming::friendly_type_name;
use crate::path::NodePath;
use crate::setter::{Configurable, Registry};
use crate::setting::{Setting, Settings};
use crate::slot::Slot;
use crate::types::{SKIP, Tags};

/// A struct-like value whose fields are settings.
///
/// `scan` visits the fields in declaration order:
///
/// ```ignore
/// impl Record for Server {
///     fn scan(fields: &mut Fields<'_, Self>) {
///         fields
///             .field("host", |s| &mut s.host)
///             .field_with("port", Tags::new().le("65535"), |s| &mut s.port)
///             .field_with("tls", Tags::new().prefix("ssl"), |s| &mut s.tls);
///     }
/// }
/// scanfig::record!(Server);
/// ```
///
/// `PartialEq` against `Default` decides whether an optional nested record
/// was touched during loading.
pub trait Record: Clone + Default + PartialEq + 'static {
    fn scan(fields: &mut Fields<'_, Self>);
}

/// Field visitor handed to [`Record::scan`].
pub struct Fields<'s, R: 'static> {
    scanner: &'s mut Scanner,
    slot: Slot<R>,
    node: NodePath,
}

impl<R: 'static> Fields<'_, R> {
    pub fn field<T, F>(&mut self, name: &str, lens: F) -> &mut Self
    where
        T: Configurable,
        F: Fn(&mut R) -> &mut T + 'static,
    {
        self.field_with(name, Tags::new(), lens)
    }

    pub fn field_with<T, F>(&mut self, name: &str, tags: Tags, lens: F) -> &mut Self
    where
        T: Configurable,
        F: Fn(&mut R) -> &mut T + 'static,
    {
        let slot = self.slot.field(lens);
        self.scanner.scan_field(&self.node, name, tags, slot);
        self
    }

    /// The node this record's settings are added under.
    pub fn node(&self) -> &NodePath {
        &self.node
    }
}

/// A field about to be scanned: its resolved name, its tags and the node it
/// belongs to.
#[doc(hidden)]
pub struct FieldInfo {
    name: String,
    tags: Tags,
    node: NodePath,
}

trait Pending {
    fn is_set(&self) -> bool;
    fn scan(&self, scanner: &mut Scanner, field: &FieldInfo);
}

struct PendingRecord<R: Record> {
    slot: Slot<R>,
}

impl<R: Record> Pending for PendingRecord<R> {
    fn is_set(&self) -> bool {
        self.slot
            .with_mut(|value| *value != R::default())
            .unwrap_or(false)
    }

    fn scan(&self, scanner: &mut Scanner, field: &FieldInfo) {
        scanner.scan_record(self.slot.clone(), field);
    }
}

/// A zero-valued temporary for a record behind one or more `None`s, and how
/// to move it into the field's storage.
#[doc(hidden)]
pub struct Materializer<T: 'static> {
    pending: Rc<dyn Pending>,
    place: Box<dyn FnOnce(Slot<T>) -> bool>,
}

impl<T: 'static> Materializer<T> {
    pub fn record() -> Self
    where
        T: Record,
    {
        let (slot, relocation) = Slot::relocatable(T::default());
        Materializer {
            pending: Rc::new(PendingRecord { slot }),
            place: Box::new(move |target| relocation.move_to(target)),
        }
    }

    /// The same temporary, placed behind one more `Some`.
    pub(crate) fn wrap_some(self) -> Materializer<Option<T>>
    where
        T: Configurable,
    {
        let Materializer { pending, place } = self;
        Materializer {
            pending,
            place: Box::new(move |target: Slot<Option<T>>| {
                target.set(Some(T::zero()))
                    && place(target.project(|value: &mut Option<T>| value.as_mut()))
            }),
        }
    }
}

/// A queued materialization, committed after loading if its temporary
/// changed.
pub(crate) struct Deferred {
    pending: Rc<dyn Pending>,
    commit: Box<dyn FnOnce() -> bool>,
}

impl Deferred {
    pub(crate) fn is_set(&self) -> bool {
        self.pending.is_set()
    }

    /// Returns `false` if the destination was no longer available.
    pub(crate) fn commit(self) -> bool {
        (self.commit)()
    }
}

/// Scan state: the settings and deferred entries produced so far, plus the
/// errors for fields that could not be handled.
#[doc(hidden)]
pub struct Scanner {
    registry: Registry,
    settings: Settings,
    deferred: Vec<Deferred>,
    errors: Errors,
}

impl Scanner {
    pub(crate) fn new(registry: Registry, settings: Settings, deferred: Vec<Deferred>) -> Self {
        Scanner {
            registry,
            settings,
            deferred,
            errors: Errors::new(),
        }
    }

    pub(crate) fn finish(self) -> (Settings, Vec<Deferred>, Errors) {
        (self.settings, self.deferred, self.errors)
    }

    pub(crate) fn scan_field<T: Configurable>(
        &mut self,
        node: &NodePath,
        name: &str,
        tags: Tags,
        slot: Slot<T>,
    ) {
        let name = tags.name_override().unwrap_or(name).to_string();
        if name == SKIP {
            trace!(node = %node, "skipping field");
            return;
        }
        let field = FieldInfo {
            name,
            tags,
            node: node.clone(),
        };

        if let Some(setter) = self.registry.setter(&slot, &field.tags) {
            let path = field.node.leaf(&field.name);
            trace!(path = %path, "registered setting");
            self.settings.add(Setting::new(
                path,
                field.tags,
                setter,
                friendly_type_name::<T>(),
            ));
            return;
        }

        if !T::descend(self, slot, &field) {
            let path = field.node.detached_leaf(&field.name);
            self.errors.push(ScanfigError::UnknownType {
                type_name: std::any::type_name::<T>().to_string(),
                path: path.to_string(),
            });
        }
    }

    /// Scan `slot` as a nested record under the node its prefix rules select.
    pub fn scan_record<R: Record>(&mut self, slot: Slot<R>, field: &FieldInfo) {
        let node = match field.tags.prefix_override() {
            Some(SKIP) => field.node.clone(),
            Some(prefix) => field.node.node(prefix),
            None => field.node.node(&field.name),
        };
        self.scan_fields(slot, node);
    }

    pub(crate) fn scan_fields<R: Record>(&mut self, slot: Slot<R>, node: NodePath) {
        let mut fields = Fields {
            scanner: self,
            slot,
            node,
        };
        R::scan(&mut fields);
    }

    pub(crate) fn defer<T: Configurable>(
        &mut self,
        slot: Slot<Option<T>>,
        materializer: Materializer<T>,
        field: &FieldInfo,
    ) {
        let Materializer { pending, place } = materializer.wrap_some();
        trace!(node = %field.node, field = %field.name, "deferring optional record");
        self.deferred.push(Deferred {
            pending: Rc::clone(&pending),
            commit: Box::new(move || place(slot)),
        });
        pending.scan(self, field);
    }
}

/// Implement [`Configurable`] for [`Record`] types.
#[macro_export]
macro_rules! record {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Configurable for $ty {
            fn zero() -> Self {
                <$ty as ::core::default::Default>::default()
            }

            fn descend(
                scanner: &mut $crate::Scanner,
                slot: $crate::Slot<Self>,
                field: &$crate::FieldInfo,
            ) -> bool {
                scanner.scan_record(slot, field);
                true
            }

            fn materializer() -> ::core::option::Option<$crate::Materializer<Self>> {
                ::core::option::Option::Some($crate::Materializer::record())
            }
        }
    )+};
}
