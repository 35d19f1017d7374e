//! Edge-detected button input shared by the menu and the running applet.
//!
//! A backend (line commands, a game controller, the simulator window) owns the
//! single [`InputPublisher`] and writes raw button levels into shared state,
//! usually from a background thread. Consumers hold an [`InputHandle`] and call
//! [`InputSource::latest_edges`], which returns only the buttons that went from
//! released to pressed since the previous query.
//!
//! Levels are published as one [`ButtonSet`] under a mutex, so a query always
//! sees a complete snapshot. A press that is released again before the next
//! query is latched and still reported once.
//!
//! Besides buttons the shared state carries three latches:
//! - `exit_requested`: the running applet should return (back button, `q`,
//!   or the applet itself giving up). Cleared by the navigator after a launch.
//! - `interrupt`: the environment cancelled the running applet. Consumed by
//!   the next [`InputSource::checkpoint`].
//! - `shutdown`: the whole menu loop should end.
//!
//! `applet_running` is not a latch. The navigator holds it high for the
//! duration of a launch so out-of-band sources (process signals) can tell a
//! running applet from the menu.

mod controller;
mod line;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(target_os = "linux")]
pub use controller::EvdevReader;
pub use controller::{
    AxisDirection,
    ControllerEvent,
    ControllerState,
    PadAxis,
    PadButton,
    apply_dead_zone,
    axis_direction,
    decode_event,
    spawn_controller,
};
pub use line::{LineCommand, parse_command, spawn_line_commands};

use crate::error::AppletError;

/// Shared handle to the active input source.
pub type InputHandle = Arc<InputSource>;

// =============================================================================
// Buttons
// =============================================================================

/// Logical buttons, independent of the physical device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    /// Secondary trigger A (information viewer).
    X,
    /// Secondary trigger B (settings).
    Y,
}

impl Button {
    /// Every button, in bit order.
    pub const ALL: [Self; 8] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Select,
        Self::Back,
        Self::X,
        Self::Y,
    ];

    /// Lowercase name, as used by line commands and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Select => "select",
            Self::Back => "back",
            Self::X => "x",
            Self::Y => "y",
        }
    }

    const fn mask(self) -> u8 { 1 << self as u8 }
}

/// A set of buttons, one bit each.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ButtonSet(u8);

impl ButtonSet {
    /// No buttons.
    pub const EMPTY: Self = Self(0);

    /// True if `button` is in the set.
    pub const fn contains(
        self,
        button: Button,
    ) -> bool {
        self.0 & button.mask() != 0
    }

    /// The set with `button` added.
    pub const fn with(
        self,
        button: Button,
    ) -> Self {
        Self(self.0 | button.mask())
    }

    /// Add or remove `button`.
    pub const fn set(
        &mut self,
        button: Button,
        pressed: bool,
    ) {
        if pressed {
            self.0 |= button.mask();
        } else {
            self.0 &= !button.mask();
        }
    }

    /// True if no button is in the set.
    pub const fn is_empty(self) -> bool { self.0 == 0 }

    /// Buttons in either set.
    pub const fn union(
        self,
        other: Self,
    ) -> Self {
        Self(self.0 | other.0)
    }

    /// Buttons in `self` that are not in `other`.
    pub const fn difference(
        self,
        other: Self,
    ) -> Self {
        Self(self.0 & !other.0)
    }

    /// Members in bit order.
    pub fn iter(self) -> impl Iterator<Item = Button> { Button::ALL.into_iter().filter(move |b| self.contains(*b)) }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<T: IntoIterator<Item = Button>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl core::fmt::Debug for ButtonSet {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.debug_set().entries(self.iter().map(Button::name)).finish()
    }
}

/// Buttons whose level rose since the previous query.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct InputSnapshot(ButtonSet);

impl InputSnapshot {
    /// Wrap a set of rising edges.
    pub const fn new(edges: ButtonSet) -> Self { Self(edges) }

    /// True if `button` rose since the previous query.
    pub const fn pressed(
        self,
        button: Button,
    ) -> bool {
        self.0.contains(button)
    }

    /// True if any button has an edge.
    pub const fn any(self) -> bool { !self.0.is_empty() }

    /// The raw edge set.
    pub const fn buttons(self) -> ButtonSet { self.0 }

    /// Name → edge pairs for every logical button.
    pub fn iter(self) -> impl Iterator<Item = (&'static str, bool)> {
        Button::ALL.into_iter().map(move |b| (b.name(), self.pressed(b)))
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// Which kind of device feeds the source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputBackend {
    /// Discrete commands, one per line.
    LineCommands,
    /// Analog stick and face buttons.
    Controller,
    /// Key levels from a desktop window.
    Keyboard,
}

#[derive(Clone, Copy, Default, Debug)]
struct Levels {
    /// Current raw level of every button.
    current: ButtonSet,
    /// Rising edges seen by the writer since the last query.
    latched: ButtonSet,
}

#[derive(Default, Debug)]
struct SharedInput {
    levels: Mutex<Levels>,
    exit_requested: AtomicBool,
    interrupt: AtomicBool,
    shutdown: AtomicBool,
    applet_running: AtomicBool,
}

impl SharedInput {
    fn levels(&self) -> MutexGuard<'_, Levels> { self.levels.lock().unwrap_or_else(PoisonError::into_inner) }
}

/// Writer side of an input source. Exactly one exists per source.
#[derive(Debug)]
pub struct InputPublisher {
    shared: Arc<SharedInput>,
}

impl InputPublisher {
    /// Replace all button levels at once.
    pub fn publish(
        &self,
        levels: ButtonSet,
    ) {
        let mut state = self.shared.levels();
        state.latched = state.latched.union(levels.difference(state.current));
        state.current = levels;
    }

    /// Change the level of one button.
    pub fn set(
        &self,
        button: Button,
        pressed: bool,
    ) {
        let mut state = self.shared.levels();
        if pressed && !state.current.contains(button) {
            state.latched = state.latched.with(button);
        }
        state.current.set(button, pressed);
    }

    /// Press and immediately release `button`.
    pub fn tap(
        &self,
        button: Button,
    ) {
        let mut state = self.shared.levels();
        state.latched = state.latched.with(button);
        state.current.set(button, false);
    }

    /// Ask the running applet to return.
    pub fn request_exit(&self) { self.shared.exit_requested.store(true, Ordering::SeqCst); }

    /// Cancel the running applet at its next checkpoint.
    pub fn raise_interrupt(&self) { self.shared.interrupt.store(true, Ordering::SeqCst); }

    /// End the menu loop after the current tick.
    pub fn request_shutdown(&self) { self.shared.shutdown.store(true, Ordering::SeqCst); }
}

// =============================================================================
// Input Source
// =============================================================================

/// Reader side of an input source.
#[derive(Debug)]
pub struct InputSource {
    shared: Arc<SharedInput>,
    previous: Mutex<ButtonSet>,
    backend: InputBackend,
}

impl InputSource {
    /// Create a source together with its publisher.
    ///
    /// Backends call this and move the publisher into their worker; tests and
    /// the simulator drive the publisher directly.
    pub fn manual(backend: InputBackend) -> (Self, InputPublisher) {
        let shared = Arc::new(SharedInput::default());
        let source = Self {
            shared: Arc::clone(&shared),
            previous: Mutex::new(ButtonSet::EMPTY),
            backend,
        };
        (source, InputPublisher { shared })
    }

    /// Device kind behind this source.
    pub const fn backend(&self) -> InputBackend { self.backend }

    /// True if the active backend is an analog controller.
    pub const fn is_controller(&self) -> bool { matches!(self.backend, InputBackend::Controller) }

    /// Raw button levels right now.
    pub fn levels(&self) -> ButtonSet { self.shared.levels().current }

    /// Buttons that were pressed since the previous call.
    pub fn latest_edges(&self) -> InputSnapshot {
        let (current, latched) = {
            let mut state = self.shared.levels();
            let latched = core::mem::take(&mut state.latched);
            (state.current, latched)
        };

        let mut previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
        let edges = latched.union(current.difference(*previous));
        *previous = current;
        InputSnapshot::new(edges)
    }

    // -------------------------------------------------------------------------
    // Latches
    // -------------------------------------------------------------------------

    /// True if the running applet has been asked to return.
    pub fn exit_requested(&self) -> bool { self.shared.exit_requested.load(Ordering::SeqCst) }

    /// Ask the running applet to return. Applets call this to end themselves.
    pub fn request_exit(&self) { self.shared.exit_requested.store(true, Ordering::SeqCst); }

    /// Reset the exit latch. The navigator calls this after every launch.
    pub fn clear_exit_request(&self) { self.shared.exit_requested.store(false, Ordering::SeqCst); }

    /// Cancel whatever is running at its next checkpoint.
    pub fn raise_interrupt(&self) { self.shared.interrupt.store(true, Ordering::SeqCst); }

    /// Cooperative cancellation point, called once per applet loop iteration.
    ///
    /// Consumes a pending interrupt and reports it as [`AppletError::Interrupted`].
    pub fn checkpoint(&self) -> Result<(), AppletError> {
        if self.shared.interrupt.swap(false, Ordering::SeqCst) {
            Err(AppletError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// True once something asked the menu loop to end.
    pub fn shutdown_requested(&self) -> bool { self.shared.shutdown.load(Ordering::SeqCst) }

    /// End the menu loop after the current tick.
    pub fn request_shutdown(&self) { self.shared.shutdown.store(true, Ordering::SeqCst); }

    /// True while an applet owns the panel.
    pub fn applet_running(&self) -> bool { self.shared.applet_running.load(Ordering::SeqCst) }

    /// Mark the start or end of a launch.
    pub fn set_applet_running(
        &self,
        running: bool,
    ) {
        self.shared.applet_running.store(running, Ordering::SeqCst);
    }
}
