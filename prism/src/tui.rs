//! Terminal lifecycle management for prism.
//!
//! The TUI renders to stderr, leaving stdout free so `prism … | tee` and
//! similar pipelines do not capture escape sequences. Diagnostics go to the
//! rolling log file (see `logging`), never to either stream.

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::{SIGHUP, SIGTERM};
use signal_hook::flag::register;
use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// Buffered stderr backend; one flush per frame instead of one write per
/// escape sequence.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enables raw mode, enters the alternate screen and turns on mouse capture.
///
/// Pair every successful call with [`restore_tui`].
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Undoes [`init_tui`]. Safe to call more than once.
///
/// ratatui does not restore the terminal on `Drop`, so the main loop and the
/// panic hook both call this explicitly.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Chains a panic hook that restores the terminal, then runs the previous hook.
///
/// Install before [`init_tui`]; otherwise a panic leaves the shell in raw mode
/// with the message hidden on the alternate screen.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        tracing::error!(%panic_info, "panic");
        original_hook(panic_info);
    }));
}

/// Registers SIGTERM and SIGHUP against one shared flag.
///
/// The flag flips to `true` when either signal arrives; the event loop polls
/// it and leaves through its normal exit path so the terminal is restored.
pub fn register_shutdown_signals() -> std::io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    // The handler only performs an atomic store.
    register(SIGTERM, Arc::clone(&flag))?;
    register(SIGHUP, Arc::clone(&flag))?;
    Ok(flag)
}
