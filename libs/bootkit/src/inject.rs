//! Name-based reference injection.
//!
//! A component exposes named slots through [`Injectable`], usually derived with
//! `#[derive(Inject)]`. A slot is either a field of type [`Inject<T>`] or a
//! setter method taking `Arc<T>`. Definitions ask for references with
//! `{ target, slot }` pairs; [`resolve`] walks them after every enabled
//! component is constructed and before any of them starts.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;

use crate::component::{Component, Instance};
use crate::error::{InjectionError, SlotError};
use crate::lifecycle::ComponentWrapper;

/// Injection slot holding a shared reference to another component.
///
/// Empty until the orchestrator resolves references. Assigning again replaces
/// the previous reference.
pub struct Inject<T> {
    slot: ArcSwapOption<T>,
}

impl<T: Component> Inject<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Injected component, if resolved.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot.load().is_some()
    }

    pub fn set(&self, target: Arc<T>) {
        self.slot.store(Some(target));
    }

    /// Stores `target` if it is a `T`.
    ///
    /// # Errors
    /// [`SlotError::TypeMismatch`] when `target` holds another component type.
    pub fn assign(&self, target: &Instance) -> Result<(), SlotError> {
        self.set(downcast_target::<T>(target)?);
        Ok(())
    }
}

impl<T: Component> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.slot.load().is_some() { "set" } else { "empty" };
        f.debug_tuple("Inject").field(&format_args!("{}: {state}", type_name::<T>())).finish()
    }
}

fn downcast_target<T: Component>(target: &Instance) -> Result<Arc<T>, SlotError> {
    target.downcast::<T>().ok_or(SlotError::TypeMismatch {
        expected: type_name::<T>(),
        found: target.type_name(),
    })
}

/// Adapts a setter method to the slot table. Used by `#[derive(Inject)]`.
///
/// # Errors
/// [`SlotError::TypeMismatch`] when `target` is not a `T`.
pub fn call_setter<C, T: Component>(this: &C, setter: fn(&C, Arc<T>), target: &Instance) -> Result<(), SlotError> {
    setter(this, downcast_target::<T>(target)?);
    Ok(())
}

/// How a slot receives its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Field,
    Setter,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Field => "field",
            Self::Setter => "setter",
        })
    }
}

type AssignFn<C> = fn(&C, &Instance) -> Result<(), SlotError>;

struct SlotEntry<C> {
    name: &'static str,
    kind: SlotKind,
    assign: AssignFn<C>,
}

/// Named slots of a component type `C`.
pub struct SlotTable<C> {
    entries: Vec<SlotEntry<C>>,
}

impl<C> SlotTable<C> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    #[must_use]
    pub fn field(mut self, name: &'static str, assign: AssignFn<C>) -> Self {
        self.entries.push(SlotEntry {
            name,
            kind: SlotKind::Field,
            assign,
        });
        self
    }

    #[must_use]
    pub fn setter(mut self, name: &'static str, assign: AssignFn<C>) -> Self {
        self.entries.push(SlotEntry {
            name,
            kind: SlotKind::Setter,
            assign,
        });
        self
    }

    /// Slot called `name`; a field wins over a setter of the same name.
    fn find(&self, name: &str) -> Option<&SlotEntry<C>> {
        let mut candidates = self.entries.iter().filter(|e| e.name == name);
        let first = candidates.next()?;
        if first.kind == SlotKind::Field {
            return Some(first);
        }
        Some(candidates.find(|e| e.kind == SlotKind::Field).unwrap_or(first))
    }

    /// Slot names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }
}

impl<C> Default for SlotTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Components whose slots can be filled by name.
pub trait Injectable: Component + Sized {
    fn slot_table() -> SlotTable<Self>;
}

pub(crate) enum AssignFailure {
    NoSuchSlot,
    Rejected(SlotError),
}

/// Slot table with the component type erased, stored per wrapper.
pub(crate) trait Slots: Send + Sync {
    fn assign(&self, requester: &Instance, slot: &str, target: &Instance) -> Result<SlotKind, AssignFailure>;
}

impl<C: Component> Slots for SlotTable<C> {
    fn assign(&self, requester: &Instance, slot: &str, target: &Instance) -> Result<SlotKind, AssignFailure> {
        let entry = self.find(slot).ok_or(AssignFailure::NoSuchSlot)?;
        let this = requester.downcast::<C>().ok_or(AssignFailure::Rejected(SlotError::TypeMismatch {
            expected: type_name::<C>(),
            found: requester.type_name(),
        }))?;
        (entry.assign)(&this, target).map_err(AssignFailure::Rejected)?;
        Ok(entry.kind)
    }
}

/// Fulfils every injection request of every wrapper, in wrapper order and then
/// request order.
///
/// A target matches a wrapper whose definition name or id equals it; the first
/// match in order wins.
///
/// # Errors
/// The first failing request aborts resolution.
pub(crate) fn resolve(wrappers: &[ComponentWrapper]) -> Result<(), InjectionError> {
    for requester in wrappers {
        for request in &requester.definition().injections {
            let target = wrappers
                .iter()
                .find(|w| w.answers_to(&request.target))
                .ok_or_else(|| InjectionError::ReferenceNotFound {
                    requester: requester.id().to_owned(),
                    target: request.target.clone(),
                })?;

            let kind = requester
                .slots()
                .assign(requester.instance(), &request.slot, target.instance())
                .map_err(|failure| match failure {
                    AssignFailure::NoSuchSlot => InjectionError::SlotNotAccessible {
                        requester: requester.id().to_owned(),
                        slot: request.slot.clone(),
                    },
                    AssignFailure::Rejected(source) => InjectionError::SlotTypeMismatch {
                        requester: requester.id().to_owned(),
                        slot: request.slot.clone(),
                        target: request.target.clone(),
                        source,
                    },
                })?;

            debug!(
                module = %requester.id(),
                slot = %request.slot,
                target = %target.id(),
                via = %kind,
                "reference injected"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Store;

    impl Component for Store {
        fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Cache;

    impl Component for Cache {
        fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Service {
        store: Inject<Store>,
        via_setter: Mutex<Option<Arc<Store>>>,
    }

    impl Service {
        fn set_store(&self, store: Arc<Store>) {
            *self.via_setter.lock() = Some(store);
        }
    }

    impl Component for Service {
        fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Injectable for Service {
        fn slot_table() -> SlotTable<Self> {
            SlotTable::new()
                .setter("store", |this: &Self, target: &Instance| call_setter(this, Self::set_store, target))
                .field("store", |this: &Self, target: &Instance| this.store.assign(target))
                .setter("backing", |this: &Self, target: &Instance| call_setter(this, Self::set_store, target))
        }
    }

    #[test]
    fn field_wins_over_setter() {
        let service = Arc::new(Service::default());
        let requester = Instance::new(service.clone());
        let store = Arc::new(Store);
        let target = Instance::new(store.clone());

        let kind = Service::slot_table().assign(&requester, "store", &target).ok().unwrap();

        assert_eq!(kind, SlotKind::Field);
        assert!(Arc::ptr_eq(&service.store.get().unwrap(), &store));
        assert!(service.via_setter.lock().is_none());
    }

    #[test]
    fn setter_receives_reference() {
        let service = Arc::new(Service::default());
        let requester = Instance::new(service.clone());
        let target = Instance::new(Arc::new(Store));

        let kind = Service::slot_table().assign(&requester, "backing", &target).ok().unwrap();

        assert_eq!(kind, SlotKind::Setter);
        assert!(service.via_setter.lock().is_some());
        assert!(!service.store.is_set());
    }

    #[test]
    fn wrong_target_type_is_rejected() {
        let service = Arc::new(Service::default());
        let requester = Instance::new(service.clone());
        let target = Instance::new(Arc::new(Cache));

        let result = Service::slot_table().assign(&requester, "store", &target);

        assert!(matches!(result, Err(AssignFailure::Rejected(SlotError::TypeMismatch { .. }))));
        assert!(!service.store.is_set());
    }

    #[test]
    fn unknown_slot_is_reported() {
        let requester = Instance::new(Arc::new(Service::default()));
        let target = Instance::new(Arc::new(Store));

        let result = Service::slot_table().assign(&requester, "nope", &target);
        assert!(matches!(result, Err(AssignFailure::NoSuchSlot)));
    }

    #[test]
    fn reassignment_replaces_reference() {
        let slot: Inject<Store> = Inject::new();
        let first = Arc::new(Store);
        let second = Arc::new(Store);

        slot.set(first);
        slot.assign(&Instance::new(second.clone())).unwrap();

        assert!(Arc::ptr_eq(&slot.get().unwrap(), &second));
        assert!(format!("{slot:?}").contains("set"));
    }
}
