//! Process signals routed into the input latches.
//!
//! ```text
//! SIGINT   applet running → interrupt (the applet unwinds, the menu resumes)
//! SIGINT   browsing       → shutdown
//! SIGTERM                 → shutdown
//! ```
//!
//! A shutdown also raises the interrupt, so an applet that is running when
//! SIGTERM arrives still goes through its teardown before the menu loop ends.

use std::io;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use crate::input::{InputHandle, InputSource};

/// What a received signal was turned into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SignalAction {
    InterruptApplet,
    Shutdown,
}

/// Apply `signal` to the input latches.
///
/// Returns `None` for signals this module does not handle.
pub fn route_signal(
    input: &InputSource,
    signal: i32,
) -> Option<SignalAction> {
    match signal {
        SIGINT if input.applet_running() => {
            input.raise_interrupt();
            Some(SignalAction::InterruptApplet)
        }
        SIGINT | SIGTERM => {
            input.request_shutdown();
            input.raise_interrupt();
            Some(SignalAction::Shutdown)
        }
        _ => None,
    }
}

/// Background listener that feeds SIGINT/SIGTERM into an input source.
///
/// The listener stops when this value is dropped.
pub struct SignalListener {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalListener {
    /// Install the handlers and start the listener thread.
    ///
    /// # Errors
    ///
    /// Returns an error when the handlers cannot be registered or the thread
    /// cannot be spawned.
    pub fn register(input: InputHandle) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("signal-listener".into())
            .spawn(move || {
                for signal in signals.forever() {
                    match route_signal(&input, signal) {
                        Some(SignalAction::InterruptApplet) => info!("SIGINT, interrupting the running applet"),
                        Some(SignalAction::Shutdown) => info!("Signal {signal}, shutting down"),
                        None => debug!("Ignoring signal {signal}"),
                    }
                }
            })
            .inspect_err(|_| handle.close())?;

        info!("Signal listener registered");
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(Err(_)) = self.thread.take().map(JoinHandle::join) {
            warn!("Signal listener thread panicked");
        }
    }
}
