//! The applet contract and the built-in applets.
//!
//! An applet takes exclusive control of the [`RenderSurface`] between
//! [`Applet::start`] and its return. It runs its own loop, polling the input
//! source through [`poll_input`] once per iteration, and returns when the exit
//! latch is raised. Returning `Err(AppletError::Interrupted)` unwinds a
//! cancelled applet; the navigator treats both paths the same way.

mod idle;
mod info_viewer;
mod settings;
mod template;

use std::path::PathBuf;

pub use idle::IdleApplet;
pub use info_viewer::InfoViewerApplet;
pub use settings::SettingsApplet;
pub use template::TemplateApplet;

use crate::error::AppletError;
use crate::input::{InputHandle, InputSnapshot, InputSource};
use crate::manifest::Options;
use crate::surface::RenderSurface;

/// A unit that takes over the panel until asked to return.
pub trait Applet {
    /// Display name, used for logging.
    fn name(&self) -> &str;

    /// Run until the exit latch is raised or an interrupt arrives.
    ///
    /// The surface is cleared before this is called.
    fn start(
        &mut self,
        surface: &mut RenderSurface,
    ) -> Result<(), AppletError>;

    /// Release anything acquired by `start`. Always called after `start`
    /// returns, however it returns.
    fn stop(
        &mut self,
        _surface: &mut RenderSurface,
    ) {
    }
}

/// Capabilities handed to every applet at construction.
///
/// The render surface is not part of the context: it is lent to the applet
/// for the duration of `start` and `stop` only.
#[derive(Clone, Debug)]
pub struct AppletContext {
    pub name: String,
    pub input: InputHandle,
    pub options: Options,
    /// Package-scoped directory for cached assets. Not created eagerly.
    pub resource_dir: PathBuf,
}

/// One step of an applet's main loop.
///
/// Delivers a pending interrupt as an error, returns `None` once the exit latch
/// is raised, and otherwise the input edges since the previous step.
pub fn poll_input(input: &InputSource) -> Result<Option<InputSnapshot>, AppletError> {
    input.checkpoint()?;
    if input.exit_requested() {
        return Ok(None);
    }
    Ok(Some(input.latest_edges()))
}
