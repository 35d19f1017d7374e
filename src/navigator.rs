//! The menu state machine.
//!
//! ```text
//!            select / x / y / idle timeout
//! Browsing ─────────────────────────────────▶ Launching(target)
//!     ▲                                              │
//!     └──── stop, blank, clear exit, reset idle ─────┘
//! ```
//!
//! Each [`Navigator::tick`] renders the current menu page, reads the input
//! edges and performs at most one transition. Launching hands the render
//! surface to the applet and blocks until it returns, after which the teardown
//! in [`run_guarded`] always runs, whether the applet returned, was
//! interrupted, failed or panicked.

use core::fmt::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::applets::{Applet, AppletContext, IdleApplet, InfoViewerApplet, SettingsApplet};
use crate::colors::{RED, WHITE_MUTED};
use crate::config::{
    FRAME_TIME,
    IDLE_THRESHOLD,
    MAX_ITEMS_PER_PAGE,
    MENU_ITEM_GAP,
    MENU_LINE_ADVANCE,
    MENU_START_Y,
    MENU_X,
    PAGE_INDICATOR_MARGIN,
    RESOURCES_DIR,
    SELECTED_MARKER,
};
use crate::error::AppletError;
use crate::input::{Button, InputHandle, InputSnapshot, InputSource};
use crate::loader::{AppletLoader, AppletRegistry, Phase};
use crate::manifest::{Catalog, Options, discover};
use crate::menu::{MenuState, Navigation};
use crate::surface::{MessageKind, RenderSurface};

// =============================================================================
// Configuration
// =============================================================================

/// Runtime knobs of the navigator.
#[derive(Clone, Debug)]
pub struct NavigatorConfig {
    pub items_per_page: usize,
    /// Browsing time without input before the idle applet is launched.
    pub idle_threshold: Duration,
    /// Minimum duration of one `run` iteration.
    pub frame_time: Duration,
    /// Parent of the system applets' package directories.
    pub applet_root: PathBuf,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            items_per_page: MAX_ITEMS_PER_PAGE,
            idle_threshold: IDLE_THRESHOLD,
            frame_time: FRAME_TIME,
            applet_root: PathBuf::from("applets"),
        }
    }
}

// =============================================================================
// States
// =============================================================================

/// What a launch hands control to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LaunchTarget {
    /// Catalog entry at this index, through the loader.
    Catalog(usize),
    /// Details of the selected catalog entry.
    InformationViewer,
    Settings,
    /// Fallback after the idle threshold.
    Idle,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NavigatorState {
    Browsing,
    Launching(LaunchTarget),
}

/// How an applet gave control back.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LaunchOutcome {
    Returned,
    Interrupted,
    Failed(String),
    Panicked,
}

// =============================================================================
// Guarded Launch
// =============================================================================

/// Run `applet` with exclusive use of `surface` and always clean up afterwards.
///
/// The surface is cleared before `start`. However `start` ends (normal return,
/// interrupt, error or panic), `stop` is called, both buffers are blanked and
/// the exit latch is cleared. Nothing is propagated to the caller except the
/// outcome.
pub fn run_guarded(
    applet: &mut dyn Applet,
    surface: &mut RenderSurface,
    input: &InputSource,
) -> LaunchOutcome {
    let name = applet.name().to_owned();
    info!("Starting applet '{name}'");
    surface.clear();
    input.set_applet_running(true);

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| applet.start(surface))) {
        Ok(Ok(())) => LaunchOutcome::Returned,
        Ok(Err(AppletError::Interrupted)) => {
            info!("Applet '{name}' interrupted");
            LaunchOutcome::Interrupted
        }
        Ok(Err(AppletError::Failed(reason))) => {
            warn!("Applet '{name}' failed: {reason}");
            LaunchOutcome::Failed(reason)
        }
        Err(_) => {
            error!("Applet '{name}' panicked");
            LaunchOutcome::Panicked
        }
    };

    if panic::catch_unwind(AssertUnwindSafe(|| applet.stop(surface))).is_err() {
        error!("Applet '{name}' panicked while stopping");
    }
    surface.blank();
    input.clear_exit_request();
    input.set_applet_running(false);
    info!("Applet '{name}' returned control ({outcome:?})");
    outcome
}

// =============================================================================
// Navigator
// =============================================================================

/// Owns the menu, the loader and the render surface while browsing.
pub struct Navigator {
    loader: AppletLoader,
    menu: MenuState,
    surface: RenderSurface,
    input: InputHandle,
    config: NavigatorConfig,
    state: NavigatorState,
    last_activity: Instant,
    last_outcome: Option<LaunchOutcome>,
}

impl Navigator {
    /// Navigator over an already discovered catalog.
    pub fn new(
        catalog: Catalog,
        registry: AppletRegistry,
        surface: RenderSurface,
        input: InputHandle,
        config: NavigatorConfig,
    ) -> Self {
        info!("Navigator ready with {} applet(s)", catalog.len());
        Self {
            loader: AppletLoader::new(catalog, registry, Arc::clone(&input)),
            menu: MenuState::new(config.items_per_page),
            surface,
            input,
            config,
            state: NavigatorState::Browsing,
            last_activity: Instant::now(),
            last_outcome: None,
        }
    }

    /// Discover the packages under `root` and serve them with the built-in registry.
    pub fn with_applet_root(
        root: &Path,
        surface: RenderSurface,
        input: InputHandle,
    ) -> Self {
        let config = NavigatorConfig {
            applet_root: root.to_path_buf(),
            ..NavigatorConfig::default()
        };
        Self::new(discover(root), AppletRegistry::with_builtins(), surface, input, config)
    }

    /// Browsing, or the launch in progress.
    pub const fn state(&self) -> NavigatorState { self.state }

    /// Selection and page.
    pub const fn menu(&self) -> &MenuState { &self.menu }

    /// The render surface, for inspecting published frames.
    pub const fn surface(&self) -> &RenderSurface { &self.surface }

    /// Lifecycle cache of catalog applets.
    pub const fn loader(&self) -> &AppletLoader { &self.loader }

    /// Entries shown in the menu.
    pub const fn catalog(&self) -> &Catalog { self.loader.catalog() }

    /// Outcome of the most recent applet launch.
    pub const fn last_outcome(&self) -> Option<&LaunchOutcome> { self.last_outcome.as_ref() }

    /// Tick until the input source requests shutdown.
    pub fn run(&mut self) {
        info!("Entering menu loop");
        while !self.input.shutdown_requested() {
            let frame_start = Instant::now();
            self.tick();
            let elapsed = frame_start.elapsed();
            if let Some(remaining) = self.config.frame_time.checked_sub(elapsed) {
                thread::sleep(remaining);
            }
        }
        self.surface.blank();
        info!("Menu loop stopped");
    }

    /// One Browsing iteration: render, read input, make at most one transition.
    pub fn tick(&mut self) {
        // Latches left over from outside a launch mean nothing while browsing
        self.input.clear_exit_request();
        if self.input.checkpoint().is_err() {
            debug!("Interrupt while browsing ignored");
        }

        self.render_menu();

        let edges = self.input.latest_edges();
        let now = Instant::now();
        if edges.any() {
            self.last_activity = now;
        }

        if let Some(target) = self.transition(edges) {
            self.launch(target);
        } else if now.duration_since(self.last_activity) >= self.config.idle_threshold {
            info!("No input for {:?}, launching idle applet", self.config.idle_threshold);
            self.launch(LaunchTarget::Idle);
        }
    }

    /// Apply the first asserted edge in priority order. Returns a launch target
    /// if the edge selects one.
    fn transition(
        &mut self,
        edges: InputSnapshot,
    ) -> Option<LaunchTarget> {
        const PRIORITY: [Button; 7] = [
            Button::Up,
            Button::Down,
            Button::Left,
            Button::Right,
            Button::Select,
            Button::X,
            Button::Y,
        ];

        let len = self.catalog().len();
        let button = PRIORITY.into_iter().find(|b| edges.pressed(*b))?;
        let nav = match button {
            Button::Up => Navigation::Up,
            Button::Down => Navigation::Down,
            Button::Left => Navigation::Left,
            Button::Right => Navigation::Right,
            Button::Select if len > 0 => return Some(LaunchTarget::Catalog(self.menu.current_index())),
            Button::X if len > 0 => return Some(LaunchTarget::InformationViewer),
            Button::Y => return Some(LaunchTarget::Settings),
            _ => return None,
        };
        self.menu.navigate(nav, len);
        None
    }

    fn launch(
        &mut self,
        target: LaunchTarget,
    ) {
        self.state = NavigatorState::Launching(target);
        match target {
            LaunchTarget::Catalog(index) => self.launch_catalog(index),
            LaunchTarget::InformationViewer => {
                let selected = self.catalog().get(self.menu.current_index()).cloned();
                let context = self.system_context("Applet Information Viewer", "applet_information_viewer");
                self.launch_system(InfoViewerApplet::new(context, selected));
            }
            LaunchTarget::Settings => {
                let context = self.system_context("Settings", "settings_applet");
                self.launch_system(SettingsApplet::new(context));
            }
            LaunchTarget::Idle => {
                let context = self.system_context("Idle", "idle_applet");
                self.launch_system(IdleApplet::new(context));
            }
        }
        self.state = NavigatorState::Browsing;
    }

    fn launch_catalog(
        &mut self,
        index: usize,
    ) {
        let Some(name) = self.catalog().get(index).map(|m| m.name.clone()) else {
            return;
        };

        let mut message = String::from("Loading ");
        message.push_str(&name);
        message.push_str("...");
        self.surface.show_message(&message, MessageKind::Loading);

        let handle = match self.loader.get_or_create(&name) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Cannot launch '{name}': {err}");
                self.surface.show_message("Failed to load", MessageKind::Error);
                return;
            }
        };

        self.loader.set_phase(&name, Phase::Running);
        let outcome = {
            let mut applet = handle.borrow_mut();
            run_guarded(&mut **applet, &mut self.surface, &self.input)
        };
        self.loader.set_phase(&name, Phase::Stopped);
        self.loader.set_phase(&name, Phase::Loaded);
        self.finish_launch(outcome);
    }

    fn launch_system(
        &mut self,
        mut applet: impl Applet,
    ) {
        let outcome = run_guarded(&mut applet, &mut self.surface, &self.input);
        self.finish_launch(outcome);
    }

    fn finish_launch(
        &mut self,
        outcome: LaunchOutcome,
    ) {
        self.last_outcome = Some(outcome);
        self.last_activity = Instant::now();
    }

    fn system_context(
        &self,
        name: &str,
        package: &str,
    ) -> AppletContext {
        AppletContext {
            name: name.to_owned(),
            input: Arc::clone(&self.input),
            options: Options::new(),
            resource_dir: self.config.applet_root.join(package).join(RESOURCES_DIR),
        }
    }

    // -------------------------------------------------------------------------
    // Menu Rendering
    // -------------------------------------------------------------------------

    fn render_menu(&mut self) {
        self.surface.clear();

        let len = self.catalog().len();
        if len == 0 {
            self.surface.draw_centered_text("No applets", WHITE_MUTED, None);
            self.surface.swap();
            return;
        }

        // Entry text sits in a column right of the marker on every line
        let marker_width = self.surface.text_width(SELECTED_MARKER);
        let text_x = MENU_X + marker_width as i32;
        let wrap_width = (self.surface.width() as i32 - text_x).max(0) as u32;
        let selected = self.menu.current_index();

        let mut y = MENU_START_Y;
        for index in self.menu.page_range(len) {
            let Some(manifest) = self.loader.catalog().get(index) else {
                continue;
            };
            let color = if index == selected {
                self.surface.draw_text(MENU_X, y, SELECTED_MARKER, RED);
                RED
            } else {
                WHITE_MUTED
            };

            for line in self.surface.wrap_text(&manifest.name, wrap_width) {
                self.surface.draw_text(text_x, y, &line, color);
                y += MENU_LINE_ADVANCE;
            }
            y += MENU_ITEM_GAP;
        }

        let mut indicator: heapless::String<16> = heapless::String::new();
        write!(
            indicator,
            "[{}/{}]",
            self.menu.page_index() + 1,
            self.menu.total_pages(len)
        )
        .ok();
        let indicator_y = self.surface.height() as i32 - PAGE_INDICATOR_MARGIN;
        self.surface.draw_centered_text(&indicator, WHITE_MUTED, Some(indicator_y));

        self.surface.swap();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use embedded_graphics::Pixel;

    use super::*;
    use crate::colors::MAGENTA;
    use crate::input::{InputBackend, InputPublisher};
    use crate::manifest::Manifest;

    thread_local! {
        static CONSTRUCTED: Cell<u32> = const { Cell::new(0) };
    }

    /// Returns immediately, counting constructions per test thread.
    struct Quick {
        name: String,
        behavior: Behavior,
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Return,
        Interrupt,
        Panic,
    }

    impl Applet for Quick {
        fn name(&self) -> &str { &self.name }

        fn start(
            &mut self,
            surface: &mut RenderSurface,
        ) -> Result<(), AppletError> {
            surface.draw_text(0, 10, "running", RED);
            surface.swap();
            match self.behavior {
                Behavior::Return => Ok(()),
                Behavior::Interrupt => Err(AppletError::Interrupted),
                Behavior::Panic => panic!("applet bug"),
            }
        }
    }

    fn quick(context: AppletContext) -> Box<dyn Applet> {
        CONSTRUCTED.with(|c| c.set(c.get() + 1));
        Box::new(Quick {
            name: context.name,
            behavior: Behavior::Return,
        })
    }

    fn manifest(
        name: &str,
        class_name: &str,
    ) -> Manifest {
        Manifest {
            name: name.into(),
            description: "test".into(),
            version: "1".into(),
            author: "tests".into(),
            options: Options::new(),
            class_name: class_name.into(),
            entry_point: "quick".into(),
            package_dir: PathBuf::from("applets/quick"),
        }
    }

    fn navigator(
        names: &[&str],
        config: NavigatorConfig,
    ) -> (Navigator, InputPublisher, InputHandle) {
        let mut registry = AppletRegistry::new();
        registry.register("quick", "Quick", quick);
        let catalog = Catalog::new(names.iter().map(|n| manifest(n, "Quick")));
        let (source, publisher) = InputSource::manual(InputBackend::LineCommands);
        let input = Arc::new(source);
        let navigator = Navigator::new(
            catalog,
            registry,
            RenderSurface::headless(64, 64),
            Arc::clone(&input),
            config,
        );
        (navigator, publisher, input)
    }

    /// Tick once while another thread keeps asking the running applet to return.
    fn tick_until_exit(
        nav: &mut Navigator,
        input: &InputHandle,
    ) {
        let done = Arc::new(AtomicBool::new(false));
        let worker = {
            let done = Arc::clone(&done);
            let input = Arc::clone(input);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    input.request_exit();
                    thread::sleep(Duration::from_millis(10));
                }
            })
        };
        nav.tick();
        done.store(true, Ordering::SeqCst);
        worker.join().unwrap();
    }

    // -------------------------------------------------------------------------
    // Browsing Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_up_down_wrap_through_ticks() {
        let (mut nav, publisher, _) = navigator(&["a", "b", "c", "d", "e"], NavigatorConfig::default());
        publisher.tap(Button::Up);
        nav.tick();
        assert_eq!(nav.menu().current_index(), 4);
        assert_eq!(nav.menu().page_index(), 2);

        publisher.tap(Button::Down);
        nav.tick();
        assert_eq!(nav.menu().current_index(), 0);
        assert_eq!(nav.state(), NavigatorState::Browsing);
    }

    #[test]
    fn test_one_transition_per_tick() {
        let (mut nav, publisher, _) = navigator(&["a", "b", "c"], NavigatorConfig::default());
        publisher.tap(Button::Down);
        publisher.tap(Button::Select);
        nav.tick();
        assert_eq!(nav.menu().current_index(), 1, "Down wins over select");
        assert!(nav.last_outcome().is_none(), "Nothing was launched");
    }

    #[test]
    fn test_menu_draws_selected_entry_and_indicator() {
        let (mut nav, _publisher, _) = navigator(&["Alpha", "Beta", "Gamma"], NavigatorConfig::default());
        nav.tick();
        let frame = nav.surface().front();
        assert!(frame.count(RED) > 0, "Selected entry is highlighted");
        assert!(frame.count(WHITE_MUTED) > 0, "Other entry and page indicator are muted");
        assert_eq!(frame.count(MAGENTA), 0, "Menu layout has no overlaps");
        assert_eq!(nav.surface().layout_stats().rejected, 0);
    }

    #[test]
    fn test_unselected_entries_align_with_selected_text() {
        let (mut nav, _publisher, _) = navigator(&["Alpha", "Beta Gamma Delta Epsilon"], NavigatorConfig::default());
        nav.tick();
        let text_x = MENU_X + nav.surface().text_width(SELECTED_MARKER) as i32;
        let indicator_top = nav.surface().height() as i32 - PAGE_INDICATOR_MARGIN - 6;

        // "Beta ..." wraps onto a second line; both lines keep the indent
        let muted: Vec<_> = nav
            .surface()
            .front()
            .pixels()
            .filter(|Pixel(point, color)| *color == WHITE_MUTED && point.y < indicator_top)
            .map(|Pixel(point, _)| point)
            .collect();
        assert!(!muted.is_empty(), "Unselected entry is drawn");
        let leftmost = muted.iter().map(|p| p.x).min().unwrap_or(0);
        assert!(leftmost >= text_x, "Unselected entry starts at x={leftmost}, expected >= {text_x}");
        let rows: std::collections::BTreeSet<_> = muted.iter().map(|p| p.y / MENU_LINE_ADVANCE).collect();
        assert!(rows.len() > 1, "Long name wraps onto more than one line");

        let selected_leftmost = nav
            .surface()
            .front()
            .pixels()
            .filter(|Pixel(_, color)| *color == RED)
            .map(|Pixel(point, _)| point.x)
            .min();
        assert!(selected_leftmost.is_some_and(|x| x < text_x), "Marker sits in the left margin");
    }

    #[test]
    fn test_empty_catalog() {
        let (mut nav, publisher, _) = navigator(&[], NavigatorConfig::default());
        publisher.tap(Button::Select);
        nav.tick();
        publisher.tap(Button::X);
        nav.tick();
        assert!(nav.last_outcome().is_none(), "Select and info viewer do nothing");
        assert!(!nav.surface().front().is_blank(), "'No applets' is shown");
    }

    // -------------------------------------------------------------------------
    // Launch Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_select_launches_and_caches_instance() {
        CONSTRUCTED.with(|c| c.set(0));
        let (mut nav, publisher, input) = navigator(&["a", "b"], NavigatorConfig::default());

        publisher.tap(Button::Select);
        nav.tick();
        assert_eq!(nav.last_outcome(), Some(&LaunchOutcome::Returned));
        assert_eq!(nav.loader().phase("a"), Some(Phase::Loaded));

        publisher.tap(Button::Select);
        nav.tick();
        assert_eq!(CONSTRUCTED.with(Cell::get), 1, "Second launch reuses the instance");
        assert!(!input.exit_requested(), "Exit latch is cleared after a launch");
        assert!(nav.surface().front().is_blank(), "Applet frame does not linger");
        assert_eq!(nav.state(), NavigatorState::Browsing);
    }

    #[test]
    fn test_load_error_stays_browsing() {
        let mut registry = AppletRegistry::new();
        registry.register("quick", "Quick", quick);
        let catalog = Catalog::new([manifest("broken", "Missing")]);
        let (source, publisher) = InputSource::manual(InputBackend::LineCommands);
        let mut nav = Navigator::new(
            catalog,
            registry,
            RenderSurface::headless(64, 64),
            Arc::new(source),
            NavigatorConfig::default(),
        );

        publisher.tap(Button::Select);
        nav.tick();
        assert_eq!(nav.state(), NavigatorState::Browsing);
        assert!(nav.last_outcome().is_none());
        assert_eq!(nav.loader().phase("broken"), Some(Phase::Unloaded));
        assert!(nav.surface().front().count(RED) > 0, "Failure message is shown");
    }

    #[test]
    fn test_settings_trigger() {
        let (mut nav, publisher, input) = navigator(&[], NavigatorConfig::default());
        publisher.tap(Button::Y);
        tick_until_exit(&mut nav, &input);
        assert_eq!(nav.last_outcome(), Some(&LaunchOutcome::Returned));
    }

    #[test]
    fn test_info_viewer_trigger() {
        let (mut nav, publisher, input) = navigator(&["a"], NavigatorConfig::default());
        publisher.tap(Button::X);
        tick_until_exit(&mut nav, &input);
        assert_eq!(nav.last_outcome(), Some(&LaunchOutcome::Returned));
    }

    #[test]
    fn test_idle_launch_after_threshold() {
        let config = NavigatorConfig {
            idle_threshold: Duration::ZERO,
            ..NavigatorConfig::default()
        };
        let (mut nav, _publisher, input) = navigator(&["a"], config);
        tick_until_exit(&mut nav, &input);
        assert_eq!(nav.last_outcome(), Some(&LaunchOutcome::Returned), "Idle ran with no input");
    }

    #[test]
    fn test_no_idle_before_threshold() {
        let (mut nav, _publisher, _) = navigator(&["a"], NavigatorConfig::default());
        nav.tick();
        assert!(nav.last_outcome().is_none());
    }

    // -------------------------------------------------------------------------
    // Guarded Launch Tests
    // -------------------------------------------------------------------------

    struct Tracked {
        inner: Quick,
        stopped: Rc<Cell<bool>>,
    }

    impl Applet for Tracked {
        fn name(&self) -> &str { self.inner.name() }

        fn start(
            &mut self,
            surface: &mut RenderSurface,
        ) -> Result<(), AppletError> {
            self.inner.start(surface)
        }

        fn stop(
            &mut self,
            _surface: &mut RenderSurface,
        ) {
            self.stopped.set(true);
        }
    }

    fn run_tracked(behavior: Behavior) -> (LaunchOutcome, bool, RenderSurface, InputHandle) {
        let (source, _publisher) = InputSource::manual(InputBackend::LineCommands);
        let input = Arc::new(source);
        input.request_exit();
        let stopped = Rc::new(Cell::new(false));
        let mut applet = Tracked {
            inner: Quick {
                name: "tracked".into(),
                behavior,
            },
            stopped: Rc::clone(&stopped),
        };
        let mut surface = RenderSurface::headless(64, 64);
        let outcome = run_guarded(&mut applet, &mut surface, &input);
        (outcome, stopped.get(), surface, input)
    }

    #[test]
    fn test_guarded_teardown_on_return() {
        let (outcome, stopped, surface, input) = run_tracked(Behavior::Return);
        assert_eq!(outcome, LaunchOutcome::Returned);
        assert!(stopped);
        assert!(surface.front().is_blank() && surface.back().is_blank());
        assert!(!input.exit_requested());
    }

    #[test]
    fn test_guarded_teardown_on_interrupt() {
        let (outcome, stopped, surface, input) = run_tracked(Behavior::Interrupt);
        assert_eq!(outcome, LaunchOutcome::Interrupted);
        assert!(stopped, "stop runs after an interrupt");
        assert!(surface.front().is_blank());
        assert!(!input.exit_requested());
        assert!(!input.applet_running());
    }

    #[test]
    fn test_guarded_teardown_on_panic() {
        let (outcome, stopped, surface, input) = run_tracked(Behavior::Panic);
        assert_eq!(outcome, LaunchOutcome::Panicked);
        assert!(stopped, "stop runs after a panic");
        assert!(surface.front().is_blank());
        assert!(!input.applet_running(), "Running flag drops after a panic");
    }
}
