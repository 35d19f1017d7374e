//! Analog-stick/button backend.
//!
//! Face buttons map directly to logical buttons. The left stick's two axes go
//! through a symmetric dead zone and are then thresholded into the same four
//! directional buttons the line backend produces, so consumers never see raw
//! axis values.
//!
//! ```text
//! South (A) → select     East (B) → back + exit request
//! North (X) → x          West (Y) → y
//! stick up/down/left/right → up/down/left/right
//! ```

#[cfg(target_os = "linux")]
use std::collections::VecDeque;
use std::io;
#[cfg(target_os = "linux")]
use std::path::Path;
use std::sync::Arc;
use std::thread;

#[cfg(target_os = "linux")]
use log::{debug, info};
use log::warn;

use super::{Button, ButtonSet, InputBackend, InputHandle, InputPublisher, InputSource};
use crate::config::DEAD_ZONE;

// =============================================================================
// Events
// =============================================================================

/// Face buttons by position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PadButton {
    South,
    East,
    North,
    West,
}

impl PadButton {
    /// Logical button this face button produces.
    pub const fn logical(self) -> Button {
        match self {
            Self::South => Button::Select,
            Self::East => Button::Back,
            Self::North => Button::X,
            Self::West => Button::Y,
        }
    }
}

/// Left stick axes. Negative values are left and up.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PadAxis {
    X,
    Y,
}

/// One decoded device event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControllerEvent {
    Button { button: PadButton, pressed: bool },
    Axis { axis: PadAxis, value: i32 },
}

// =============================================================================
// Dead Zone
// =============================================================================

/// Position of one axis after dead-zone thresholding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AxisDirection {
    Negative,
    Centered,
    Positive,
}

/// Clamp values within ±`dead_zone` of center to zero.
pub const fn apply_dead_zone(
    value: i32,
    dead_zone: i32,
) -> i32 {
    if value.unsigned_abs() < dead_zone.unsigned_abs() { 0 } else { value }
}

/// Threshold an axis value into at most one direction.
///
/// Magnitudes below `dead_zone` are centered; at or above it exactly one
/// direction is reported.
pub const fn axis_direction(
    value: i32,
    dead_zone: i32,
) -> AxisDirection {
    let clamped = apply_dead_zone(value, dead_zone);
    if clamped == 0 {
        AxisDirection::Centered
    } else if clamped < 0 {
        AxisDirection::Negative
    } else {
        AxisDirection::Positive
    }
}

// =============================================================================
// Controller State
// =============================================================================

/// Last known stick position and face-button levels.
#[derive(Clone, Copy, Default, Debug)]
pub struct ControllerState {
    x: i32,
    y: i32,
    buttons: ButtonSet,
}

impl ControllerState {
    /// Centered stick, nothing pressed.
    pub const fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            buttons: ButtonSet::EMPTY,
        }
    }

    /// Fold one event into the state.
    pub const fn apply(
        &mut self,
        event: ControllerEvent,
    ) {
        match event {
            ControllerEvent::Button { button, pressed } => self.buttons.set(button.logical(), pressed),
            ControllerEvent::Axis { axis: PadAxis::X, value } => self.x = apply_dead_zone(value, DEAD_ZONE),
            ControllerEvent::Axis { axis: PadAxis::Y, value } => self.y = apply_dead_zone(value, DEAD_ZONE),
        }
    }

    /// Logical button levels for the current state.
    pub const fn levels(&self) -> ButtonSet {
        let mut levels = self.buttons;
        match axis_direction(self.y, DEAD_ZONE) {
            AxisDirection::Negative => levels.set(Button::Up, true),
            AxisDirection::Positive => levels.set(Button::Down, true),
            AxisDirection::Centered => {}
        }
        match axis_direction(self.x, DEAD_ZONE) {
            AxisDirection::Negative => levels.set(Button::Left, true),
            AxisDirection::Positive => levels.set(Button::Right, true),
            AxisDirection::Centered => {}
        }
        levels
    }
}

fn handle_event(
    state: &mut ControllerState,
    publisher: &InputPublisher,
    event: ControllerEvent,
) {
    if let ControllerEvent::Button {
        button: PadButton::East,
        pressed: true,
    } = event
    {
        publisher.request_exit();
    }
    state.apply(event);
    publisher.publish(state.levels());
}

/// Start consuming controller events on a background thread.
pub fn spawn_controller<I>(events: I) -> io::Result<InputHandle>
where
    I: Iterator<Item = ControllerEvent> + Send + 'static,
{
    let (source, publisher) = InputSource::manual(InputBackend::Controller);
    thread::Builder::new().name("input-controller".into()).spawn(move || {
        let mut state = ControllerState::new();
        for event in events {
            handle_event(&mut state, &publisher, event);
        }
        warn!("Controller disconnected");
        publisher.publish(ButtonSet::EMPTY);
    })?;
    Ok(Arc::new(source))
}

// =============================================================================
// evdev Decoding
// =============================================================================

const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;

const BTN_SOUTH: u16 = 0x130;
const BTN_EAST: u16 = 0x131;
const BTN_NORTH: u16 = 0x133;
const BTN_WEST: u16 = 0x134;

const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;

/// Map one evdev `(type, code, value)` triple to a controller event.
///
/// Unsupported types and codes return `None`.
pub const fn decode_event(
    kind: u16,
    code: u16,
    value: i32,
) -> Option<ControllerEvent> {
    let button = match (kind, code) {
        (EV_KEY, BTN_SOUTH) => PadButton::South,
        (EV_KEY, BTN_EAST) => PadButton::East,
        (EV_KEY, BTN_NORTH) => PadButton::North,
        (EV_KEY, BTN_WEST) => PadButton::West,
        (EV_ABS, ABS_X) => return Some(ControllerEvent::Axis { axis: PadAxis::X, value }),
        (EV_ABS, ABS_Y) => return Some(ControllerEvent::Axis { axis: PadAxis::Y, value }),
        _ => return None,
    };
    // 0 = release, 1 = press, 2 = autorepeat
    Some(ControllerEvent::Button {
        button,
        pressed: value != 0,
    })
}

/// Controller events from an evdev device node.
///
/// Records are read by the kernel-facing `evdev` crate, so the `input_event`
/// layout of the running platform (32- or 64-bit time) never matters here.
#[cfg(target_os = "linux")]
pub struct EvdevReader {
    device: evdev::Device,
    pending: VecDeque<ControllerEvent>,
}

#[cfg(target_os = "linux")]
impl EvdevReader {
    /// Open a device node such as `/dev/input/event0`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let device = evdev::Device::open(path)?;
        info!("Opened controller '{}' at {}", device.name().unwrap_or("unnamed"), path.display());
        Ok(Self {
            device,
            pending: VecDeque::new(),
        })
    }
}

#[cfg(target_os = "linux")]
impl Iterator for EvdevReader {
    type Item = ControllerEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.device.fetch_events() {
                Ok(events) => self
                    .pending
                    .extend(events.filter_map(|ev| decode_event(ev.event_type().0, ev.code(), ev.value()))),
                Err(err) => {
                    debug!("Controller read ended: {err}");
                    return None;
                }
            }
        }
    }
}
