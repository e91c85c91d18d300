use crate::event::InputEvent;
use lumen_common::Size;
use std::cell::Cell;
use std::rc::Rc;

type Listener = Box<dyn FnMut(&InputEvent, Size)>;

struct Entry {
    active: Rc<Cell<bool>>,
    listener: Listener,
}

/// Fan-out point for raw input events.
///
/// Listeners receive each event together with the current viewport size and
/// stay registered until their [`Subscription`] is dropped.
pub struct EventHub {
    entries: Vec<Entry>,
    viewport: Size,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listener_count())
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(Size::default())
    }
}

impl EventHub {
    pub fn new(viewport: Size) -> Self {
        Self {
            entries: Vec::new(),
            viewport,
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&InputEvent, Size) + 'static) -> Subscription {
        self.prune();
        let active = Rc::new(Cell::new(true));
        self.entries.push(Entry {
            active: active.clone(),
            listener: Box::new(listener),
        });
        Subscription { active }
    }

    /// Deliver `event` to every live listener in subscription order.
    pub fn dispatch(&mut self, event: &InputEvent) {
        self.prune();
        tracing::trace!(?event, listeners = self.entries.len(), "dispatch input");
        let viewport = self.viewport;
        for entry in &mut self.entries {
            if entry.active.get() {
                (entry.listener)(event, viewport);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.entries.iter().filter(|e| e.active.get()).count()
    }

    fn prune(&mut self) {
        self.entries.retain(|e| e.active.get());
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[derive(Debug)]
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_pointer;
    use glam::Vec2;

    #[test]
    fn listeners_receive_events_and_viewport() {
        let mut hub = EventHub::new(Size::new(200, 100));
        let seen = Rc::new(Cell::new(Vec2::ZERO));
        let sink = seen.clone();
        let _sub = hub.subscribe(move |event, viewport| {
            if let InputEvent::PointerMove { client_x, client_y } = *event {
                sink.set(normalize_pointer(client_x, client_y, viewport));
            }
        });

        hub.dispatch(&InputEvent::PointerMove {
            client_x: 150.0,
            client_y: 25.0,
        });
        assert_eq!(seen.get(), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let mut hub = EventHub::default();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let sub = hub.subscribe(move |_, _| counter.set(counter.get() + 1));
        hub.dispatch(&InputEvent::Scroll { scroll_y: 10.0 });
        assert_eq!(hub.listener_count(), 1);

        drop(sub);
        hub.dispatch(&InputEvent::Scroll { scroll_y: 20.0 });
        assert_eq!(hits.get(), 1);
        assert_eq!(hub.listener_count(), 0);
    }
}
