use crate::app::App;
use crate::braille;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use spectral_life::FieldView;

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;
const ERROR_COLOR: Color = Color::Red;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    // One generation for the whole frame
    let view = app.engine.view();

    if app.fullscreen_mode {
        render_canvas(frame, area, app, &view);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app, &view);
        render_canvas(frame, layout[1], app, &view);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (frame_area.width.saturating_sub(2), frame_area.height.saturating_sub(2))
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App, view: &FieldView) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Status
            Constraint::Length(8), // Parameters
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app, view);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App, view: &FieldView) {
    let block = styled_block(" Spectral Life ");

    let (status_text, status_color) = if app.is_running() {
        ("RUNNING", Color::Green)
    } else {
        ("STOPPED", HIGHLIGHT_COLOR)
    };

    let mut content = vec![
        Line::from(Span::styled(
            format!("Gen: {}", view.epoch()),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!("Pop: {}", view.population()),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];
    if let Some(status) = &app.status {
        content.push(Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(ERROR_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String| {
        Line::from(Span::styled(
            format!("  {}: {}", label, value),
            Style::default().fg(TEXT_COLOR),
        ))
    };

    let mode = if app.single_threaded { "ui thread" } else { "worker" };

    let content = vec![
        make_line("Grid", format!("{}x{}", app.engine.width(), app.engine.height())),
        make_line("Delay", format!("{} ms", app.engine.interval())),
        make_line("Zoom", format!("1:{}", app.viewport.zoom)),
        make_line("Seed", app.pattern.name().to_string()),
        make_line(
            "View",
            format!("{},{}", app.viewport.origin_x, app.viewport.origin_y),
        ),
        Line::from(Span::styled(
            format!("  Step: {}", mode),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, _app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "start/stop"),
        make_control("R", "randomize"),
        make_control("N", "single step"),
        make_control("1-7", "seed patterns"),
        make_control("P", "next pattern"),
        make_control("Arrows", "pan"),
        make_control("+/-", "zoom"),
        make_control("[/]", "delay"),
        make_control("Bksp", "reset view"),
        make_control("S", "snapshot"),
        make_control("V", "fullscreen"),
        make_control("H", "help"),
        make_control("Q", "quit"),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App, view: &FieldView) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(view, app.viewport, inner.width, inner.height);

    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            let paragraph = Paragraph::new(Line::from(span));
            frame.render_widget(paragraph, cell_rect);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("CONWAY'S GAME OF LIFE", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("The grid wraps at every edge. Neighbour counts come from an FFT convolution with the 8-cell Moore kernel."),
        Line::from("A dead cell with 3 neighbours is born; a live cell with 2 or 3 survives."),
        Line::from(""),
        Line::from(Span::styled("SEED PATTERNS (1-7):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("1=R-pentomino, 2=Glider, 3=Blinker, 4=Block, 5=Acorn, 6=Diehard, 7=LWSS"),
        Line::from("Reseeding clears the grid and needs the simulation stopped."),
        Line::from(""),
        Line::from(Span::styled("RUNNING:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space starts the loop or aborts it mid-generation. R fills the grid at random; while running it lands between generations."),
        Line::from("N advances one generation while stopped. [ and ] change the delay between generations."),
        Line::from(""),
        Line::from(Span::styled("VIEW:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Arrows pan, +/- zoom, Backspace recentres. Dim dots mark empty parts of the grid."),
        Line::from("S saves the current generation as a PNG."),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
