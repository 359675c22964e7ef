//! Reactive primitives of the object graph.
//!
//! Simulation modules expose their editable state as [`Property`] cells and their
//! invocable operations as [`Action`]s. The inspector never owns these; it reads,
//! writes and subscribes through the handles.
//!
//! Change notification is synchronous: every [`Property::set`] runs all listeners
//! before returning. Listeners are registered with [`Property::subscribe`], which
//! hands back an explicit [`Subscription`] that must be released with
//! [`Property::unsubscribe`] (or [`Subscription::release`]).

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Anything a [`Subscription`] can detach itself from.
trait Disconnect: Send + Sync {
    fn disconnect(&self, id: u64) -> bool;
}

/// An ordered list of listeners notified with a borrowed payload.
pub struct Signal<T: ?Sized> {
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T: ?Sized> Default for Signal<T> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T: ?Sized + 'static> Signal<T> {
    /// Registers a listener. The returned handle detaches it again.
    pub fn connect(self: &Arc<Self>, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, Arc::new(listener)));
        let source: Weak<dyn Disconnect> = Arc::downgrade(self) as Weak<dyn Disconnect>;
        Subscription { id, source }
    }

    /// Calls every listener in registration order.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being notified.
    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<Listener<T>> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(payload);
        }
    }

    /// Number of currently connected listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

impl<T: ?Sized + 'static> Disconnect for Signal<T> {
    fn disconnect(&self, id: u64) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

/// Handle to one live listener registration.
///
/// Only a weak reference to the notification source is held: releasing a
/// subscription whose source is already gone does nothing.
#[must_use = "a subscription stays live until it is released"]
pub struct Subscription {
    id: u64,
    source: Weak<dyn Disconnect>,
}

impl Subscription {
    /// Detaches the listener. Returns false if it was already gone.
    pub fn release(self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.disconnect(self.id))
    }

    /// Whether the notification source still exists.
    pub fn is_live(&self) -> bool {
        self.source.strong_count() > 0
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

struct PropertyCell<T> {
    value: RwLock<T>,
    changed: Arc<Signal<T>>,
    editable: AtomicBool,
}

/// A shared, observable value.
///
/// Cloning a property clones the handle, not the value.
pub struct Property<T> {
    cell: Arc<PropertyCell<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Creates an editable property.
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(PropertyCell {
                value: RwLock::new(value),
                changed: Arc::new(Signal::default()),
                editable: AtomicBool::new(true),
            }),
        }
    }

    /// Builder: marks the property as not editable in the inspector.
    pub fn read_only(self) -> Self {
        self.set_editable(false);
        self
    }

    /// Builder: sets the editable flag.
    pub fn with_editable(self, editable: bool) -> Self {
        self.set_editable(editable);
        self
    }

    pub fn get(&self) -> T {
        self.cell
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores a new value and notifies every subscriber before returning.
    pub fn set(&self, value: T) {
        {
            let mut slot = self
                .cell
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *slot = value.clone();
        }
        self.cell.changed.emit(&value);
    }

    /// Mutates the value in place, then notifies like [`Property::set`].
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    pub fn subscribe(&self, on_change: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.cell.changed.connect(on_change)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        subscription.release()
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.changed.listener_count()
    }

    pub fn editable(&self) -> bool {
        self.cell.editable.load(Ordering::Relaxed)
    }

    pub fn set_editable(&self, editable: bool) {
        self.cell.editable.store(editable, Ordering::Relaxed);
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.cell.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Property")
            .field("value", &*value)
            .field("editable", &self.cell.editable.load(Ordering::Relaxed))
            .finish()
    }
}

struct ActionCell {
    run: Box<dyn Fn() + Send + Sync>,
    show_in_editor: AtomicBool,
}

/// An invocable operation exposed by a simulation object.
///
/// Hidden from the inspector unless flagged with [`Action::shown_in_editor`].
#[derive(Clone)]
pub struct Action {
    cell: Arc<ActionCell>,
}

impl Action {
    pub fn new(run: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cell: Arc::new(ActionCell {
                run: Box::new(run),
                show_in_editor: AtomicBool::new(false),
            }),
        }
    }

    /// Builder: offers this action in the inspector.
    pub fn shown_in_editor(self) -> Self {
        self.cell.show_in_editor.store(true, Ordering::Relaxed);
        self
    }

    pub fn invoke(&self) {
        (self.cell.run)();
    }

    pub fn show_in_editor(&self) -> bool {
        self.cell.show_in_editor.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("show_in_editor", &self.show_in_editor())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn set_notifies_synchronously_with_new_value() {
        let speed = Property::new(1.0_f32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = speed.subscribe(move |value| sink.lock().unwrap().push(*value));

        speed.set(2.5);
        speed.update(|v| *v *= 2.0);

        assert_eq!(*seen.lock().unwrap(), vec![2.5, 5.0]);
        assert_eq!(speed.get(), 5.0);
        assert!(speed.unsubscribe(sub));
    }

    #[test]
    fn released_subscription_stops_notifications() {
        let count = Arc::new(AtomicUsize::new(0));
        let name = Property::new(String::from("a"));
        let counter = count.clone();
        let sub = name.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        name.set("b".into());
        assert_eq!(name.subscriber_count(), 1);

        assert!(sub.release());
        name.set("c".into());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(name.subscriber_count(), 0);
    }

    #[test]
    fn releasing_after_source_dropped_is_a_no_op() {
        let property = Property::new(3_i32);
        let sub = property.subscribe(|_| {});
        assert!(sub.is_live());
        drop(property);
        assert!(!sub.is_live());
        assert!(!sub.release());
    }

    #[test]
    fn listener_may_unsubscribe_during_notification() {
        let property = Property::new(0_i32);
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = slot.clone();
        let sub = property.subscribe(move |_| {
            if let Some(sub) = inner.lock().unwrap().take() {
                sub.release();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        property.set(1);
        assert_eq!(property.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_the_cell() {
        let a = Property::new(false);
        let b = a.clone().read_only();
        b.set(true);
        assert!(a.get());
        assert!(!a.editable());
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn actions_are_hidden_unless_flagged() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let reset = Action::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!reset.show_in_editor());
        let reset = reset.shown_in_editor();
        assert!(reset.show_in_editor());
        reset.invoke();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
