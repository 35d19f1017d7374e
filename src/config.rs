//! Application configuration constants.
//!
//! Layout values are `const` so the menu and the built-in applets share one
//! source of truth for the panel geometry. Values that tests need to vary at
//! runtime are mirrored in [`NavigatorConfig`](crate::navigator::NavigatorConfig).

use std::time::Duration;

// =============================================================================
// Panel Configuration
// =============================================================================

/// Panel width in pixels (single 64x64 HUB75 matrix).
pub const SCREEN_WIDTH: u32 = 64;

/// Panel height in pixels.
pub const SCREEN_HEIGHT: u32 = 64;

/// Default panel brightness in percent.
pub const DEFAULT_BRIGHTNESS: u8 = 100;

/// Brightness change per settings key press, in percent.
pub const BRIGHTNESS_STEP: u8 = 10;

// =============================================================================
// Timing Configuration
// =============================================================================

/// Target frame time (~50 FPS). The menu loop sleeps if a frame completes early.
pub const FRAME_TIME: Duration = Duration::from_millis(20);

/// Browsing time without any input edge before the idle applet is launched.
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(300);

/// How long the information viewer shows each field before rotating.
pub const INFO_ROTATE_INTERVAL: Duration = Duration::from_secs(5);

/// Poll interval used by built-in applets between redraws.
pub const APPLET_POLL_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// Menu Layout
// =============================================================================

/// Catalog entries shown on a single menu page.
pub const MAX_ITEMS_PER_PAGE: usize = 2;

/// Left margin of menu entries.
pub const MENU_X: i32 = 1;

/// Baseline of the first menu line.
pub const MENU_START_Y: i32 = 10;

/// Baseline advance between wrapped lines of one entry.
pub const MENU_LINE_ADVANCE: i32 = 10;

/// Extra gap between two entries.
pub const MENU_ITEM_GAP: i32 = 5;

/// Distance of the page indicator baseline from the bottom edge.
pub const PAGE_INDICATOR_MARGIN: i32 = 4;

/// Drawn left of the selected entry's first line. Entry text starts after its width.
pub const SELECTED_MARKER: &str = "* ";

// =============================================================================
// Input Configuration
// =============================================================================

/// Analog stick dead zone. Axis values with a smaller magnitude read as centered.
pub const DEAD_ZONE: i32 = 8000;

// =============================================================================
// Applet Packages
// =============================================================================

/// Descriptor file expected in every applet package directory.
pub const DESCRIPTOR_FILE: &str = "config.json";

/// Per-package subdirectory handed to applets for cached assets.
pub const RESOURCES_DIR: &str = "resources";

/// Package directories that are never listed in the menu.
pub const RESERVED_PACKAGES: [&str; 5] = [
    "template_applet",
    "applet_information_viewer",
    "settings_applet",
    "idle_applet",
    "master_applet",
];
