#![forbid(unsafe_code)]

//! Interactive key and mouse event viewer.
//!
//! Shows the last key and mouse event with their modifiers. `C-c` or SIGINT
//! quits. Set `TICKTERM_LOG=<path>` to write a log; `RUST_LOG` filters it.

use std::cell::Cell;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use signal_hook::consts::signal::SIGINT;
use tickterm_core::{
    Direction, Event, EventMask, Extent, Flow, KeyEvent, KeyEventKind, Modifiers, MouseEvent,
    MouseEventKind, MouseMode, Setting, Term, WHEEL_DOWN,
};
use tickterm_tty::{SessionOptions, TerminalSession};
use tracing_subscriber::EnvFilter;

const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_millis(50);

fn init_logging() {
    let Ok(path) = std::env::var("TICKTERM_LOG") else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// `<SHIFT|ALT|CTRL>` after the text just printed, over a blanked gap.
fn render_modifiers(term: &mut Term, modifiers: Modifiers) {
    if modifiers.is_empty() {
        return;
    }
    term.erase(Extent::Cells(3), Direction::Forward);
    term.move_by(0, 3);
    term.print_fmt(format_args!("<{modifiers}>"));
}

fn render_key(term: &mut Term, key: Option<&KeyEvent>) {
    term.goto(2, 2);
    term.print("Key:");

    let Some(key) = key else {
        return;
    };
    term.goto(4, 4);
    term.print(match key.kind {
        KeyEventKind::Text => "text ",
        KeyEventKind::Key => "key  ",
    });
    term.print(&key.text);
    render_modifiers(term, key.modifiers);
    term.erase(Extent::Cells(30), Direction::Forward);
}

fn render_mouse(term: &mut Term, mouse: Option<&MouseEvent>) {
    term.goto(8, 2);
    term.print("Mouse:");

    let Some(mouse) = mouse else {
        return;
    };
    term.goto(10, 4);
    term.print(match mouse.kind {
        MouseEventKind::Press => "press   ",
        MouseEventKind::Drag => "drag    ",
        MouseEventKind::Release => "release ",
        MouseEventKind::Wheel => "wheel ",
    });
    if mouse.kind == MouseEventKind::Wheel {
        let direction = if mouse.button == WHEEL_DOWN { "down" } else { "up" };
        term.print_fmt(format_args!(
            "{direction} at ({},{})",
            mouse.line, mouse.column
        ));
    } else {
        term.print_fmt(format_args!(
            "button {} at ({},{})",
            mouse.button, mouse.line, mouse.column
        ));
    }
    render_modifiers(term, mouse.modifiers);
    term.erase(Extent::Cells(20), Direction::Forward);
}

fn run() -> tickterm_core::Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    if let Err(err) = signal_hook::flag::register(SIGINT, Arc::clone(&interrupted)) {
        tracing::warn!(%err, "SIGINT handler not installed");
    }

    let mut session = TerminalSession::open_stdio(SessionOptions::from_env())?;
    session.await_started(Some(STARTUP_PROBE_TIMEOUT))?;

    session.setctl(Setting::AltScreen(true));
    session.setctl(Setting::CursorVisible(false));
    session.setctl(Setting::Mouse(MouseMode::Drag));
    session.setctl(Setting::KeypadApp(true));
    session.clear();

    let quit = Rc::new(Cell::new(false));
    {
        let quit = Rc::clone(&quit);
        session.bind(
            EventMask::KEY | EventMask::MOUSE,
            move |term: &mut Term, event: &Event| {
                match event {
                    Event::Key(key) if key.is_key("C-c") => quit.set(true),
                    Event::Key(key) => render_key(term, Some(key)),
                    Event::Mouse(mouse) => render_mouse(term, Some(mouse)),
                    _ => {}
                }
                Flow::Continue
            },
        );
    }

    render_key(session.term_mut(), None);
    render_mouse(session.term_mut(), None);

    while !quit.get() && !interrupted.load(Ordering::Relaxed) {
        if session.input_wait(None)? == tickterm_tty::WaitOutcome::Closed {
            break;
        }
    }
    tracing::info!("demo exiting");

    session.destroy()
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo-input: {err}");
            ExitCode::FAILURE
        }
    }
}
