use crate::braille::Viewport;
use spectral_life::export;
use spectral_life::{Engine, LifeConfig, Pattern, StepOutcome};
use std::path::PathBuf;
use tracing::{info, warn};

const MAX_INTERVAL_MS: u64 = 1000;
const INTERVAL_STEP_MS: u64 = 5;
const MAX_ZOOM: u16 = 16;
/// Dots moved per arrow-key press
const PAN_DOTS: i32 = 4;

/// Main application state
pub struct App {
    pub engine: Engine,
    pub pattern: Pattern,
    pub viewport: Viewport,
    default_zoom: u16,
    pub canvas_width: u16,
    pub canvas_height: u16,
    /// Step on the UI thread instead of the simulation thread
    pub single_threaded: bool,
    /// Single-threaded play state; the threaded mode asks the engine instead
    playing: bool,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    /// Last error or notice shown in the sidebar
    pub status: Option<String>,
}

impl App {
    pub fn new(engine: Engine, config: &LifeConfig, canvas_width: u16, canvas_height: u16) -> Self {
        let mut app = Self {
            engine,
            pattern: config.pattern,
            viewport: Viewport {
                origin_x: 0,
                origin_y: 0,
                zoom: config.zoom.max(1),
            },
            default_zoom: config.zoom.max(1),
            canvas_width,
            canvas_height,
            single_threaded: false,
            playing: false,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            status: None,
        };
        app.reset_view();
        app
    }

    pub fn is_running(&self) -> bool {
        if self.single_threaded {
            self.playing
        } else {
            self.engine.is_running()
        }
    }

    fn report(&mut self, result: spectral_life::Result<()>) {
        if let Err(err) = result {
            warn!(error = %err, "viewer action failed");
            self.status = Some(err.to_string());
        }
    }

    /// Advance on the UI thread when running single-threaded
    pub fn tick(&mut self) {
        if self.single_threaded && self.playing {
            let result = self.engine.step().map(|_| ());
            self.report(result);
        }
    }

    /// Start the loop, or abort it and wait for it to finish
    pub fn toggle_running(&mut self) {
        self.status = None;
        if self.single_threaded {
            self.playing = !self.playing;
            return;
        }
        let result = if self.engine.is_running() {
            self.engine.stop()
        } else {
            self.engine.start()
        };
        self.report(result);
    }

    pub fn randomize(&mut self) {
        self.engine.randomize();
    }

    /// Advance one generation while stopped
    pub fn step_once(&mut self) {
        if self.is_running() {
            return;
        }
        match self.engine.step() {
            Ok(StepOutcome::Published(_)) => self.status = None,
            Ok(StepOutcome::Aborted) => {}
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    /// Seed a pattern; only possible while stopped
    pub fn set_pattern(&mut self, pattern: Pattern) {
        if self.is_running() {
            self.status = Some("stop the simulation to reseed".into());
            return;
        }
        self.pattern = pattern;
        let result = self.engine.seed(pattern);
        self.report(result);
    }

    pub fn next_pattern(&mut self) {
        self.set_pattern(self.pattern.next());
    }

    pub fn prev_pattern(&mut self) {
        self.set_pattern(self.pattern.prev());
    }

    /// Write the published generation to a PNG in the working directory
    pub fn save_snapshot(&mut self) {
        let view = self.engine.view();
        let path = PathBuf::from(format!("life-{:06}.png", view.epoch()));
        match export::save_field(&view, &path) {
            Ok(()) => {
                info!(path = %path.display(), "saved field snapshot");
                self.status = Some(format!("saved {}", path.display()));
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    /// Centre the grid in the canvas at the start-up zoom
    pub fn reset_view(&mut self) {
        self.viewport.zoom = self.default_zoom;
        self.center_on(self.engine.width() as i32 / 2, self.engine.height() as i32 / 2);
    }

    fn center(&self) -> (i32, i32) {
        let (span_x, span_y) = self.viewport.span(self.canvas_width, self.canvas_height);
        (
            self.viewport.origin_x + span_x / 2,
            self.viewport.origin_y + span_y / 2,
        )
    }

    fn center_on(&mut self, x: i32, y: i32) {
        let (span_x, span_y) = self.viewport.span(self.canvas_width, self.canvas_height);
        self.viewport.origin_x = x - span_x / 2;
        self.viewport.origin_y = y - span_y / 2;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        let step = PAN_DOTS * self.viewport.zoom as i32;
        self.viewport.origin_x += dx * step;
        self.viewport.origin_y += dy * step;
    }

    pub fn zoom_in(&mut self) {
        let (cx, cy) = self.center();
        self.viewport.zoom = self.viewport.zoom.saturating_sub(1).max(1);
        self.center_on(cx, cy);
    }

    pub fn zoom_out(&mut self) {
        let (cx, cy) = self.center();
        self.viewport.zoom = (self.viewport.zoom + 1).min(MAX_ZOOM);
        self.center_on(cx, cy);
    }

    pub fn slower(&mut self) {
        let interval = (self.engine.interval() + INTERVAL_STEP_MS).min(MAX_INTERVAL_MS);
        self.engine.set_interval(interval);
    }

    pub fn faster(&mut self) {
        let interval = self.engine.interval().saturating_sub(INTERVAL_STEP_MS);
        self.engine.set_interval(interval);
    }

    /// Keep the same grid point centred when the canvas changes size
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        let (cx, cy) = self.center();
        self.canvas_width = canvas_width;
        self.canvas_height = canvas_height;
        self.center_on(cx, cy);
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Stop and join the loop before the engine is released
    pub fn shutdown(&mut self) {
        self.playing = false;
        let result = self.engine.stop();
        self.report(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(width: usize, height: usize) -> App {
        let config = LifeConfig {
            width,
            height,
            interval_ms: 1,
            pattern: Pattern::Block,
            ..LifeConfig::default()
        };
        let engine = Engine::from_config(&config).unwrap();
        App::new(engine, &config, 10, 5)
    }

    #[test]
    fn test_reset_view_centres_grid() {
        let app = app(40, 40);
        // 10x5 chars = 20x20 dots at zoom 1
        assert_eq!(app.viewport.origin_x, 10);
        assert_eq!(app.viewport.origin_y, 10);
    }

    #[test]
    fn test_zoom_keeps_centre() {
        let mut app = app(64, 64);
        let before = app.center();
        app.zoom_out();
        assert_eq!(app.viewport.zoom, 2);
        assert_eq!(app.center(), before);
        app.zoom_in();
        app.zoom_in();
        assert_eq!(app.viewport.zoom, 1);
        assert_eq!(app.center(), before);
    }

    #[test]
    fn test_toggle_running_starts_and_stops_engine() {
        let mut app = app(16, 16);
        app.toggle_running();
        assert!(app.engine.is_running());
        app.set_pattern(Pattern::Glider);
        assert!(app.status.is_some());
        app.toggle_running();
        assert!(!app.engine.is_running());
    }

    #[test]
    fn test_single_threaded_tick_steps_engine() {
        let mut app = app(16, 16);
        app.single_threaded = true;
        app.set_pattern(Pattern::Blinker);
        let before = app.engine.epoch();

        app.tick();
        assert_eq!(app.engine.epoch(), before);

        app.toggle_running();
        app.tick();
        app.tick();
        assert_eq!(app.engine.epoch(), before + 2);
        assert!(!app.engine.is_running());
    }

    #[test]
    fn test_interval_is_clamped() {
        let mut app = app(8, 8);
        app.faster();
        app.faster();
        assert_eq!(app.engine.interval(), 0);
        for _ in 0..500 {
            app.slower();
        }
        assert_eq!(app.engine.interval(), MAX_INTERVAL_MS);
    }
}
