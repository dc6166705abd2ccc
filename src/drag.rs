//! Pointer-drag gesture recognition.
//!
//! Raw pointer down/move/up events are folded into a higher-level drag
//! session with hysteresis: a gesture only counts as a drag once the pointer
//! has either been down for 200 ms or moved 4 px from its starting point.
//! Until then the session is *pending*; releasing the pointer early cancels
//! it, which callers treat as a plain click.
//!
//! There is no global drag state. A [`Drag`] is a plain value driven by
//! whoever owns it, with behavior injected as closures via
//! [`DragCallbacks`]; hosts that need the usual "one drag at a time" rule
//! keep their sessions in a [`DragSlot`].

/// Minimum pointer-down duration before a gesture consummates (ms).
pub const CONSUMMATION_TIME_MS: f64 = 200.0;

/// Minimum travel from the starting point before a gesture consummates (px).
pub const CONSUMMATION_DISTANCE_PX: f32 = 4.0;

// ============================================================================
// Geometry + event payloads
// ============================================================================

/// A pixel position or displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };
}

/// Snapshot handed to drag callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    /// Current pointer position.
    pub pos: Point,
    /// Displacement since pointer-down.
    pub delta_from_start: Point,
    /// Displacement since the previous move (zero until consummation).
    pub delta_from_last: Point,
    pub modifiers: Modifiers,
}

// ============================================================================
// Callbacks
// ============================================================================

type EventFn = Box<dyn FnMut(&DragEvent)>;
type CancelFn = Box<dyn FnMut(Option<&DragEvent>)>;

/// Injected drag behavior. Every hook is optional; an unset hook is a no-op.
///
/// `on_cancel` receives `None` when the session is aborted programmatically
/// rather than by a pointer event.
#[derive(Default)]
pub struct DragCallbacks {
    on_consummate: Option<EventFn>,
    on_move: Option<EventFn>,
    on_up: Option<EventFn>,
    on_cancel: Option<CancelFn>,
}

impl DragCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once, on the move event that crosses a consummation threshold.
    pub fn on_consummate(mut self, f: impl FnMut(&DragEvent) + 'static) -> Self {
        self.on_consummate = Some(Box::new(f));
        self
    }

    /// Fires on every move of a consummated session, in event order.
    pub fn on_move(mut self, f: impl FnMut(&DragEvent) + 'static) -> Self {
        self.on_move = Some(Box::new(f));
        self
    }

    /// Fires on pointer-up of a consummated session.
    pub fn on_up(mut self, f: impl FnMut(&DragEvent) + 'static) -> Self {
        self.on_up = Some(Box::new(f));
        self
    }

    /// Fires when the session ends without ever consummating (a click), or
    /// on explicit [`Drag::cancel`].
    pub fn on_cancel(mut self, f: impl FnMut(Option<&DragEvent>) + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }
}

// ============================================================================
// Drag session state machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    /// Pointer is down but the gesture has not crossed a threshold yet.
    Pending,
    /// Confirmed drag; move/up callbacks are live.
    Consummated,
    /// Finished or cancelled; all further events are no-ops.
    Terminated,
}

/// One pointer gesture, from pointer-down to pointer-up or cancellation.
pub struct Drag {
    state: DragState,
    start_px: Point,
    start_time_ms: f64,
    last_px: Point,
    callbacks: DragCallbacks,
}

impl Drag {
    /// Begin a session at pointer-down.
    pub fn start(pos: Point, timestamp_ms: f64, callbacks: DragCallbacks) -> Self {
        Self {
            state: DragState::Pending,
            start_px: pos,
            start_time_ms: timestamp_ms,
            last_px: pos,
            callbacks,
        }
    }

    pub fn is_consummated(&self) -> bool {
        self.state == DragState::Consummated
    }

    pub fn is_terminated(&self) -> bool {
        self.state == DragState::Terminated
    }

    /// Feed a pointer-move event. Checks the consummation thresholds on
    /// every call while pending; the move that crosses one fires both
    /// `on_consummate` and the first `on_move`.
    pub fn pointer_move(&mut self, pos: Point, timestamp_ms: f64, modifiers: Modifiers) {
        if self.state == DragState::Terminated {
            return;
        }

        let delta_from_start = pos - self.start_px;

        if self.state == DragState::Pending {
            let elapsed = timestamp_ms - self.start_time_ms;
            if elapsed >= CONSUMMATION_TIME_MS
                || delta_from_start.length() >= CONSUMMATION_DISTANCE_PX
            {
                self.state = DragState::Consummated;
                self.last_px = self.start_px;
                let ev = DragEvent {
                    pos,
                    delta_from_start,
                    delta_from_last: Point::default(),
                    modifiers,
                };
                if let Some(cb) = self.callbacks.on_consummate.as_mut() {
                    cb(&ev);
                }
            }
        }

        if self.state == DragState::Consummated {
            let ev = DragEvent {
                pos,
                delta_from_start,
                delta_from_last: pos - self.last_px,
                modifiers,
            };
            if let Some(cb) = self.callbacks.on_move.as_mut() {
                cb(&ev);
            }
            self.last_px = pos;
        }
    }

    /// Feed the pointer-up event. A consummated session fires `on_up`; a
    /// still-pending one fires `on_cancel` (the gesture was a click).
    pub fn pointer_up(&mut self, pos: Point, _timestamp_ms: f64) {
        if self.state == DragState::Terminated {
            return;
        }
        let ev = DragEvent {
            pos,
            delta_from_start: pos - self.start_px,
            delta_from_last: pos - self.last_px,
            modifiers: Modifiers::NONE,
        };
        if self.state == DragState::Consummated {
            if let Some(cb) = self.callbacks.on_up.as_mut() {
                cb(&ev);
            }
        } else if let Some(cb) = self.callbacks.on_cancel.as_mut() {
            cb(Some(&ev));
        }
        self.state = DragState::Terminated;
    }

    /// Abort the session from any state (focus loss etc.). Fires `on_cancel`
    /// with no event and terminates immediately.
    pub fn cancel(&mut self) {
        if self.state == DragState::Terminated {
            return;
        }
        if let Some(cb) = self.callbacks.on_cancel.as_mut() {
            cb(None);
        }
        self.state = DragState::Terminated;
    }
}

// ============================================================================
// DragSlot — caller-owned single-active-session holder
// ============================================================================

/// Holds at most one live drag session.
///
/// Starting a new session while one is live cancels the old session first,
/// so its callbacks see a clean `on_cancel` instead of being silently
/// dropped mid-gesture. The slot empties itself once a session terminates.
#[derive(Default)]
pub struct DragSlot {
    active: Option<Drag>,
}

impl DragSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consummated session is currently live.
    pub fn is_dragging(&self) -> bool {
        self.active.as_ref().is_some_and(Drag::is_consummated)
    }

    /// Begin a session at pointer-down, cancelling any live one.
    pub fn begin(&mut self, pos: Point, timestamp_ms: f64, callbacks: DragCallbacks) {
        if let Some(old) = self.active.as_mut() {
            old.cancel();
        }
        self.active = Some(Drag::start(pos, timestamp_ms, callbacks));
    }

    pub fn pointer_move(&mut self, pos: Point, timestamp_ms: f64, modifiers: Modifiers) {
        if let Some(drag) = self.active.as_mut() {
            drag.pointer_move(pos, timestamp_ms, modifiers);
        }
        self.clear_terminated();
    }

    pub fn pointer_up(&mut self, pos: Point, timestamp_ms: f64) {
        if let Some(drag) = self.active.as_mut() {
            drag.pointer_up(pos, timestamp_ms);
        }
        self.clear_terminated();
    }

    /// Abort the live session, if any.
    pub fn cancel(&mut self) {
        if let Some(drag) = self.active.as_mut() {
            drag.cancel();
        }
        self.clear_terminated();
    }

    fn clear_terminated(&mut self) {
        if self.active.as_ref().is_some_and(Drag::is_terminated) {
            self.active = None;
        }
    }
}
