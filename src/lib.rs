//! Applet runtime for small RGB LED matrix panels.
//!
//! One applet at a time owns a 64x64 panel. A menu lists the applet packages
//! found on disk and hands control to the selected one:
//!
//! - [`manifest`]: package discovery into an ordered [`Catalog`](manifest::Catalog)
//! - [`loader`]: factory registry and per-applet lifecycle cache
//! - [`navigator`]: the browsing/launching state machine and guarded launch
//! - [`input`]: edge-detected buttons from line commands or a controller
//! - `signals`: SIGINT/SIGTERM routed into the input latches (unix only)
//! - [`surface`]: double-buffered drawing with fail-visible text layout
//! - [`applets`]: the applet contract and the built-in system applets
//!
//! Everything here runs headless; the binary adds a desktop window.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)] // u32->i32 and u64->u8 casts for pixel math
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)] // Panel coordinates are far below i32::MAX
#![allow(clippy::cast_sign_loss)] // i32->u32 where the value is known to be positive
#![allow(clippy::module_name_repetitions)]

pub mod applets;
pub mod colors;
pub mod config;
pub mod error;
pub mod input;
pub mod loader;
pub mod manifest;
pub mod menu;
pub mod navigator;
#[cfg(unix)]
pub mod signals;
pub mod surface;

pub use applets::{Applet, AppletContext};
pub use error::{AppletError, DiscoveryError, LoadError};
pub use input::{Button, InputHandle, InputSnapshot, InputSource};
pub use loader::{AppletLoader, AppletRegistry};
pub use manifest::{Catalog, Manifest, discover};
pub use navigator::{Navigator, NavigatorConfig};
pub use surface::{FramePresenter, RenderSurface};
