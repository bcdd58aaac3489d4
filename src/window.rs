//! Window event routing.
//!
//! Anything drawn in a window implements [`WindowHandler`]; the host owns a
//! [`WindowRegistry`] and forwards each toolkit event to the handler for the
//! window it arrived on.

use crate::app::FrameReport;
use crate::render::PointSink;

/// Keys the canvas reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

/// Input events in window pixel coordinates (origin top-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowEvent {
    Reshape { width: f32, height: f32 },
    Key(Key),
    Motion { x: f32, y: f32 },
    Click { button: MouseButton, pressed: bool, x: f32, y: f32 },
    Scroll { delta: f32, x: f32, y: f32 },
}

/// Event callbacks of a window. Input handlers return whether the window
/// must be redrawn.
pub trait WindowHandler {
    fn on_display(&mut self, sink: &mut dyn PointSink) -> FrameReport;

    fn on_reshape(&mut self, width: f32, height: f32) -> bool;

    fn on_key(&mut self, key: Key) -> bool;

    fn on_motion(&mut self, x: f32, y: f32) -> bool;

    fn on_click(&mut self, button: MouseButton, pressed: bool, x: f32, y: f32) -> bool;

    fn on_scroll(&mut self, _delta: f32, _x: f32, _y: f32) -> bool {
        false
    }

    /// Route one event to the matching callback.
    fn handle(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::Reshape { width, height } => self.on_reshape(width, height),
            WindowEvent::Key(key) => self.on_key(key),
            WindowEvent::Motion { x, y } => self.on_motion(x, y),
            WindowEvent::Click {
                button,
                pressed,
                x,
                y,
            } => self.on_click(button, pressed, x, y),
            WindowEvent::Scroll { delta, x, y } => self.on_scroll(delta, x, y),
        }
    }
}

impl<H: WindowHandler + ?Sized> WindowHandler for Box<H> {
    fn on_display(&mut self, sink: &mut dyn PointSink) -> FrameReport {
        (**self).on_display(sink)
    }

    fn on_reshape(&mut self, width: f32, height: f32) -> bool {
        (**self).on_reshape(width, height)
    }

    fn on_key(&mut self, key: Key) -> bool {
        (**self).on_key(key)
    }

    fn on_motion(&mut self, x: f32, y: f32) -> bool {
        (**self).on_motion(x, y)
    }

    fn on_click(&mut self, button: MouseButton, pressed: bool, x: f32, y: f32) -> bool {
        (**self).on_click(button, pressed, x, y)
    }

    fn on_scroll(&mut self, delta: f32, x: f32, y: f32) -> bool {
        (**self).on_scroll(delta, x, y)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Handle of a registered window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(usize);

/// Arena of window handlers addressed by [`WindowId`].
///
/// Use `WindowRegistry<Box<dyn WindowHandler>>` for mixed window types.
pub struct WindowRegistry<H> {
    windows: Vec<H>,
}

impl<H> Default for WindowRegistry<H> {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
        }
    }
}

impl<H: WindowHandler> WindowRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: H) -> WindowId {
        self.windows.push(handler);
        WindowId(self.windows.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, id: WindowId) -> Option<&H> {
        self.windows.get(id.0)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut H> {
        self.windows.get_mut(id.0)
    }

    /// Deliver an event. Unknown ids are ignored.
    pub fn dispatch(&mut self, id: WindowId, event: WindowEvent) -> bool {
        match self.windows.get_mut(id.0) {
            Some(window) => window.handle(event),
            None => {
                log::warn!("event for unknown window {id:?}");
                false
            }
        }
    }

    pub fn display(&mut self, id: WindowId, sink: &mut dyn PointSink) -> Option<FrameReport> {
        self.windows.get_mut(id.0).map(|w| w.on_display(sink))
    }
}
