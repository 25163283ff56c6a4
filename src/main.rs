mod app;
mod braille;
mod ui;

use app::App;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use spectral_life::export::{self, GifRecorder};
use spectral_life::{telemetry, Engine, LifeConfig, Pattern};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "spectral-life")]
#[command(about = "Conway's Game of Life on a torus, stepped by FFT convolution")]
struct Args {
    /// Grid width in cells
    #[arg(long, global = true)]
    width: Option<usize>,

    /// Grid height in cells
    #[arg(long, global = true)]
    height: Option<usize>,

    /// Pause between generations in milliseconds
    #[arg(short = 'i', long, global = true)]
    interval: Option<u64>,

    /// Start-up pattern (rpentomino, glider, blinker, block, acorn, diehard, lwss)
    #[arg(long, global = true)]
    pattern: Option<String>,

    /// Grid cells per braille dot
    #[arg(long, global = true)]
    zoom: Option<u16>,

    /// Config file to load instead of the default location
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Write the resulting config to the default location
    #[arg(long = "save-config", global = true)]
    save_config: bool,

    /// Send log output to this file
    #[arg(long = "log-file", global = true)]
    log_file: Option<PathBuf>,

    /// Step on the UI thread instead of a background loop
    #[arg(long = "single-threaded")]
    single_threaded: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Advance a number of generations without a terminal UI
    Run {
        /// Generations to compute
        #[arg(short = 'n', long, default_value = "100")]
        generations: u64,

        /// Save the final generation as a PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Save the neighbour kernel's spectrum magnitudes as a PNG
    Kernel {
        #[arg(short = 'o', long, default_value = "kernel.png")]
        out: PathBuf,
    },
    /// Record successive generations to an animated GIF
    Record {
        #[arg(short = 'f', long, default_value = "100")]
        frames: usize,

        #[arg(short = 'o', long, default_value = "life.gif")]
        out: PathBuf,

        /// Frame delay in hundredths of a second
        #[arg(long, default_value = "5")]
        delay: u16,
    },
}

fn build_config(args: &Args) -> spectral_life::Result<LifeConfig> {
    let mut config = match &args.config {
        Some(path) => LifeConfig::load_from_file(path)?,
        None => LifeConfig::load_or_default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(interval) = args.interval {
        config.interval_ms = interval;
    }
    if let Some(pattern) = &args.pattern {
        config.pattern = Pattern::parse(pattern);
    }
    if let Some(zoom) = args.zoom {
        config.zoom = zoom;
    }
    config.validate()?;

    if args.save_config {
        if let Some(path) = LifeConfig::default_path() {
            config.save_to_file(&path)?;
            info!(path = %path.display(), "saved config");
        }
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The TUI owns the terminal, so it only logs when given a file
    if args.command.is_some() || args.log_file.is_some() {
        telemetry::init_tracing(args.log_file.as_deref())?;
    }

    let config = build_config(&args)?;

    match args.command {
        Some(Command::Run {
            generations,
            snapshot,
        }) => run_headless(&config, generations, snapshot),
        Some(Command::Kernel { out }) => save_kernel(&config, out),
        Some(Command::Record { frames, out, delay }) => record(&config, frames, out, delay),
        None => run_tui(config, args.single_threaded),
    }
}

fn run_headless(
    config: &LifeConfig,
    generations: u64,
    snapshot: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::from_config(config)?;
    for _ in 0..generations {
        engine.step()?;
    }

    let view = engine.view();
    info!(
        epoch = view.epoch(),
        population = view.population(),
        "finished run"
    );
    println!("generation {}: {} live cells", view.epoch(), view.population());

    if let Some(path) = snapshot {
        export::save_field(&view, &path)?;
        println!("saved {}", path.display());
    }
    Ok(())
}

fn save_kernel(config: &LifeConfig, out: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::from_config(config)?;
    let kernel = engine.kernel().ok_or("kernel unavailable")?;
    export::save_spectrum(kernel.as_slice(), kernel.width(), kernel.height(), &out)?;
    println!("saved {}", out.display());
    Ok(())
}

fn record(
    config: &LifeConfig,
    frames: usize,
    out: PathBuf,
    delay: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::from_config(config)?;
    let mut recorder = GifRecorder::create(&out, engine.width(), engine.height(), delay)?;
    for frame in 0..frames {
        recorder.push(&engine.view())?;
        if frame + 1 < frames {
            engine.step()?;
        }
    }
    let written = recorder.finish()?;
    info!(frames = written, path = %out.display(), "finished recording");
    println!("saved {} frames to {}", written, out.display());
    Ok(())
}

fn run_tui(config: LifeConfig, single_threaded: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::from_config(&config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let frame_rect = ratatui::layout::Rect {
        x: 0,
        y: 0,
        width: size.width,
        height: size.height,
    };
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame_rect, false);
    let mut app = App::new(engine, &config, canvas_width, canvas_height);
    app.single_threaded = single_threaded;

    let res = run_app(&mut terminal, &mut app);

    // The loop must be joined before the engine goes away
    app.shutdown();

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else {
                                return Ok(());
                            }
                        }
                        KeyCode::Char(' ') => app.toggle_running(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.randomize(),
                        KeyCode::Char('n') | KeyCode::Char('N') => app.step_once(),
                        KeyCode::Char('p') => app.next_pattern(),
                        KeyCode::Char('P') => app.prev_pattern(),
                        KeyCode::Char(c @ '1'..='7') => {
                            let index = c as usize - '1' as usize;
                            app.set_pattern(Pattern::ALL[index]);
                        }
                        KeyCode::Backspace => app.reset_view(),
                        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
                        KeyCode::Char('[') => app.faster(),
                        KeyCode::Char(']') => app.slower(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_snapshot(),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            let size = terminal.size()?;
                            let (w, h) = ui::get_canvas_size(
                                ratatui::layout::Rect {
                                    x: 0,
                                    y: 0,
                                    width: size.width,
                                    height: size.height,
                                },
                                app.fullscreen_mode,
                            );
                            app.resize(w, h);
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        KeyCode::Left => app.pan(-1, 0),
                        KeyCode::Right => app.pan(1, 0),
                        KeyCode::Up => app.pan(0, -1),
                        KeyCode::Down => app.pan(0, 1),
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) = ui::get_canvas_size(
                        ratatui::layout::Rect {
                            x: 0,
                            y: 0,
                            width,
                            height,
                        },
                        app.fullscreen_mode,
                    );
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        // Advances only in single-threaded mode; the worker paces itself
        app.tick();
    }
}
