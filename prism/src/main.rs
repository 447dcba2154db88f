//! prism: terminal client for AI-Prism document review.
//!
//! Entry point for the `prism` binary. Wires together the terminal lifecycle
//! (`tui`), unified event bus (`event`), backend worker (`worker`), UI
//! (`ui`), theme system (`theme`), and the preference store in `prism-core`.
//!
//! # Startup sequence
//!
//! 1. Parse the CLI, start file logging, then merge the config file.
//! 2. Open the preference store and read the persisted flags.
//! 3. `install_panic_hook()` before `init_tui()` so it is the innermost hook.
//! 4. `register_shutdown_signals()` returns an `Arc<AtomicBool>` polled in the loop.
//! 5. `init_tui()` enters the alternate screen and enables raw mode.
//! 6. Spawn the event task and create the API worker, then upload or resume.
//!
//! # Safety
//!
//! `restore_tui()` is called after the event loop exits (quit key, signal, or
//! channel close). The loop never uses `?`: a draw error is captured, the loop
//! breaks, and the error is returned after the terminal has been restored.

mod app;
mod config;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;
mod worker;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use prism_core::{store, HttpApi, ReviewApi};
use tokio_rusqlite::Connection;

use app::{AppState, Effect};
use config::{Cli, Settings};
use ui::keybindings::{handle_key, handle_mouse, KeyAction};
use worker::ApiWorker;

fn io_err(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

fn pick_theme(settings: &Settings, dark_mode: bool) -> theme::Theme {
    match &settings.theme {
        Some(name) => theme::Theme::from_name(name),
        None => theme::Theme::for_dark_mode(dark_mode),
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Step 0: logging first so that config warnings land in the log file.
    // It also creates the data directory the store lives in.
    let data_dir = config::data_dir();
    let _log_guard = logging::init(&data_dir)?;
    let settings = Settings::merge(cli, config::load_file_config(&config::config_path()));
    tracing::info!(server = %settings.server_url, "prism starting");

    // Step 1: preference store. Opened before the first frame so the theme
    // and tutorial flags are known up front.
    let db_path = data_dir.join("prefs.db");
    let db = store::open_store(&db_path.to_string_lossy())
        .await
        .map_err(io_err)?;
    let dark_mode = store::get_flag(&db, store::FLAG_DARK_MODE)
        .await
        .map_err(io_err)?
        .unwrap_or(true);
    let tutorial_seen = store::get_flag(&db, store::FLAG_TUTORIAL_SEEN)
        .await
        .map_err(io_err)?
        .unwrap_or(false);

    let api: Arc<dyn ReviewApi> =
        Arc::new(HttpApi::new(&settings.server_url, settings.timeout).map_err(io_err)?);

    let mut theme = pick_theme(&settings, dark_mode);
    let mut theme_dark = dark_mode;
    let mut state = AppState::new(dark_mode, !tutorial_seen);
    state.guidelines = settings.guidelines.clone();
    state.preference = settings.preference;

    // Step 2: panic hook installed first, innermost hook restores terminal.
    tui::install_panic_hook();

    // Step 3: SIGTERM/SIGHUP flag, polled in the 50ms heartbeat arm below.
    let term_flag = tui::register_shutdown_signals()?;

    // Step 4: enter alternate screen and raw mode.
    let mut terminal = tui::init_tui()?;

    // Step 5: event channel, background event task, backend worker.
    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut worker = ApiWorker::new(api, handler.tx.clone());
    let mut rx = handler.rx;

    if settings.resume {
        match store::load_session(&db).await {
            Ok(Some(session)) => state.resume(session),
            Ok(None) => state.review.notices.warning("No saved session to resume"),
            Err(e) => {
                tracing::error!(error = %e, "loading saved session failed");
                state.review.notices.error(format!("Could not resume: {e}"));
            }
        }
    } else if let Some(document) = settings.document.clone() {
        state.upload(document);
    }
    run_effects(&mut state, &mut worker, &db, &settings.download_dir).await;

    // Event loop: exits only via `break`, never via `?`.
    let mut draw_result = Ok(());
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: the signal flag is checked at least every 50ms even when no
            // events arrive.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        // Exactly one draw() call per Render event.
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_result = Err(e);
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Mouse(mouse)) => {
                        handle_mouse(mouse, &mut state);
                    }
                    Some(event::AppEvent::Tick) => state.on_tick(),
                    Some(event::AppEvent::Api(response)) => state.apply_response(*response),
                    Some(event::AppEvent::Resize(_, _)) => {
                        // frame.area() picks up the new size on the next Render.
                    }
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                }

                run_effects(&mut state, &mut worker, &db, &settings.download_dir).await;
                if state.dark_mode != theme_dark {
                    theme_dark = state.dark_mode;
                    theme = pick_theme(&settings, theme_dark);
                }

                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    worker.cancel_all();
    tui::restore_tui()?;
    tracing::info!("prism stopped");
    draw_result
}

/// Drains the effects queued by state transitions and carries them out.
///
/// A failed download write becomes a notice; store errors are only logged.
async fn run_effects(
    state: &mut AppState,
    worker: &mut ApiWorker,
    db: &Connection,
    download_dir: &Path,
) {
    for effect in state.take_effects() {
        match effect {
            Effect::Send(request) => worker.submit(request),
            Effect::CancelPending => worker.cancel_all(),
            Effect::SetFlag(name, value) => {
                if let Err(e) = store::set_flag(db, name, value).await {
                    tracing::warn!(flag = name, error = %e, "saving preference failed");
                }
            }
            Effect::SaveSession(session) => {
                if let Err(e) = store::save_session(db, &session).await {
                    tracing::warn!(error = %e, "saving session failed");
                }
            }
            Effect::ClearSession => {
                if let Err(e) = store::clear_session(db).await {
                    tracing::warn!(error = %e, "clearing session failed");
                }
            }
            Effect::WriteFile { name, bytes } => {
                let path = download_dir.join(&name);
                match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), size = bytes.len(), "download saved");
                        state.review.notices.success(format!("Saved {}", path.display()));
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "writing download failed");
                        state
                            .review
                            .notices
                            .error(format!("Could not write {}: {e}", path.display()));
                    }
                }
            }
        }
    }
    state.in_flight = worker.in_flight();
}
