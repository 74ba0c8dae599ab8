use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;

use crate::session::Event;

/// Subscriber callback.
pub(crate) type Callback = Box<dyn FnMut(&Event, &Subscription) + Send>;

/// Identifier of a subscription within a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle passed to subscriber callbacks.
///
/// Lets a callback remove itself with [`Subscription::unsubscribe`]. Once unsubscribed, the
/// callback is not invoked again, including for the remaining events of the current dispatch.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Subscription identifier.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stops further event delivery to this subscriber.
    pub fn unsubscribe(&self) {
        self.active.store(false, atomic::Ordering::Release);
    }

    /// Returns `true` until unsubscribed.
    pub fn is_active(&self) -> bool {
        self.active.load(atomic::Ordering::Acquire)
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

struct Subscriber {
    subscription: Subscription,
    callback: Callback,
}

/// Ordered list of subscribers.
///
/// The list can't change while a dispatch pass is running since callbacks have no access to
/// the session. Subscribers that unsubscribe during a pass are skipped through their active flag
/// and pruned once the pass is over.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    entries: Vec<Subscriber>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        self.entries.push(Subscriber {
            subscription: Subscription {
                id,
                active: Arc::new(AtomicBool::new(true)),
            },
            callback,
        });

        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.subscription.id == id && entry.subscription.is_active())
        else {
            return false;
        };

        let entry = self.entries.remove(index);
        entry.subscription.unsubscribe();
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.subscription.is_active())
            .count()
    }

    /// Delivers events in order to every active subscriber.
    pub(crate) fn dispatch(&mut self, events: &[Event]) {
        if events.is_empty() {
            return;
        }

        for event in events {
            for entry in self.entries.iter_mut() {
                if entry.subscription.is_active() {
                    (entry.callback)(event, &entry.subscription);
                }
            }
        }

        self.entries.retain(|entry| entry.subscription.is_active());
    }
}

impl Debug for Subscribers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(
        log: &Arc<Mutex<Vec<(u8, Event)>>>,
        tag: u8,
    ) -> Box<dyn FnMut(&Event, &Subscription) + Send> {
        let log = log.clone();
        Box::new(move |event: &Event, _: &Subscription| {
            log.lock().unwrap().push((tag, event.clone()))
        })
    }

    #[test]
    fn events_reach_subscribers_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::default();
        subscribers.subscribe(recorder(&log, 1));
        subscribers.subscribe(recorder(&log, 2));

        subscribers.dispatch(&[Event::LinkEstablished, Event::LinkRecovered]);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (1, Event::LinkEstablished),
                (2, Event::LinkEstablished),
                (1, Event::LinkRecovered),
                (2, Event::LinkRecovered),
            ]
        );
    }

    #[test]
    fn unsubscribe_by_id() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::default();
        let first = subscribers.subscribe(recorder(&log, 1));
        subscribers.subscribe(recorder(&log, 2));

        assert!(subscribers.unsubscribe(first));
        assert!(!subscribers.unsubscribe(first));
        assert_eq!(subscribers.len(), 1);

        subscribers.dispatch(&[Event::LinkEstablished]);
        assert_eq!(*log.lock().unwrap(), vec![(2, Event::LinkEstablished)]);
    }

    #[test]
    fn unsubscribe_inside_callback_stops_current_pass() {
        let calls = Arc::new(Mutex::new(0));
        let mut subscribers = Subscribers::default();

        let counter = calls.clone();
        subscribers.subscribe(Box::new(move |_: &Event, subscription: &Subscription| {
            *counter.lock().unwrap() += 1;
            subscription.unsubscribe();
        }));

        subscribers.dispatch(&[
            Event::LinkEstablished,
            Event::LinkRecovered,
            Event::LinkEstablished,
        ]);

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(subscribers.len(), 0);
    }
}
