use glam::Vec2;
use lumen_behaviour::SceneHandle;
use lumen_input::{InputEvent, Subscription, normalize_pointer};
use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;

/// Last pointer position in normalized device coordinates.
///
/// `None` until the first move event arrives.
#[derive(Debug)]
pub struct PointerTracker {
    ndc: Rc<Cell<Option<Vec2>>>,
    _subscription: Subscription,
}

impl PointerTracker {
    pub fn subscribe(scene: &SceneHandle) -> Self {
        let ndc = Rc::new(Cell::new(None));
        let sink = ndc.clone();
        let subscription = scene.subscribe(move |event, viewport| {
            if let InputEvent::PointerMove { client_x, client_y } = *event {
                sink.set(Some(normalize_pointer(client_x, client_y, viewport)));
            }
        });
        Self {
            ndc,
            _subscription: subscription,
        }
    }

    pub fn ndc(&self) -> Option<Vec2> {
        self.ndc.get()
    }
}

/// Last reported document scroll offset, in pixels.
#[derive(Debug)]
pub struct ScrollTracker {
    scroll_y: Rc<Cell<f32>>,
    _subscription: Subscription,
}

impl ScrollTracker {
    pub fn subscribe(scene: &SceneHandle) -> Self {
        let scroll_y = Rc::new(Cell::new(0.0));
        let sink = scroll_y.clone();
        let subscription = scene.subscribe(move |event, _| {
            if let InputEvent::Scroll { scroll_y } = *event {
                sink.set(scroll_y);
            }
        });
        Self {
            scroll_y,
            _subscription: subscription,
        }
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y.get()
    }
}

#[derive(Debug, Default)]
struct DragState {
    pressed: Cell<bool>,
    last: Cell<Option<Vec2>>,
    /// Accumulated (azimuth, polar) rotation in radians since the last take.
    pending: Cell<Vec2>,
}

/// Turns primary-button drags into orbit angles.
///
/// A drag across the full viewport height is one full turn.
#[derive(Debug)]
pub struct DragTracker {
    state: Rc<DragState>,
    _subscription: Subscription,
}

impl DragTracker {
    pub fn subscribe(scene: &SceneHandle) -> Self {
        let state = Rc::new(DragState::default());
        let sink = state.clone();
        let subscription = scene.subscribe(move |event, viewport| match *event {
            InputEvent::PointerButton { pressed } => {
                sink.pressed.set(pressed);
                if !pressed {
                    sink.last.set(None);
                }
            }
            InputEvent::PointerMove { client_x, client_y } => {
                let current = Vec2::new(client_x, client_y);
                if sink.pressed.get()
                    && let Some(last) = sink.last.get()
                {
                    let height = viewport.height.max(1) as f32;
                    let delta = (current - last) * TAU / height;
                    sink.pending.set(sink.pending.get() - delta);
                }
                sink.last.set(Some(current));
            }
            InputEvent::Scroll { .. } => {}
        });
        Self {
            state,
            _subscription: subscription,
        }
    }

    /// Drain the rotation accumulated since the previous call.
    pub fn take(&self) -> Vec2 {
        self.state.pending.replace(Vec2::ZERO)
    }

    pub fn is_dragging(&self) -> bool {
        self.state.pressed.get()
    }
}
