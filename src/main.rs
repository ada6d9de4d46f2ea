#![deny(dead_code)] // DO NOT REMOVE THIS EVER
use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod ui;

use crate::ui::{restore_terminal, setup_terminal, CrosstermBackend, Screen, StatusUI, Terminal, UiAction};
use statusreel::config::{load_config, set_config_path_override};
use statusreel::models::{split_feed, UserId};
use statusreel::playback::{Collaborators, PlaybackSession, StatusViewer, ViewerRole};
use statusreel::services::{
    FixtureStatusService, Navigator, ReplySender, RestStatusService, StatusService,
};
use statusreel::utils::setup_logging;

/// Command line arguments for statusreel
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "statusreel: a terminal viewer for marketplace statuses.",
    long_about = "statusreel plays a user's statuses one after another, with tap, hold and swipe gestures.\n\n\
    Without --fixture the client talks to the REST backend configured in config.json or via\n\
    STATUSREEL_API_URL / STATUSREEL_TOKEN.\n\
    Use -h or --help to see all options."
)]
struct Args {
    /// Open this author's statuses straight away
    #[arg(long, value_name = "USER_ID")]
    author: Option<UserId>,

    /// Serve statuses from a JSON feed file instead of the backend
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Id of the signed-in user (decides owner or visitor mode)
    #[arg(long, value_name = "USER_ID")]
    me: Option<UserId>,

    /// Alternate config.json location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH", default_value = "statusreel.log")]
    log_file: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// How long each status stays on screen
    #[arg(long, value_name = "MS")]
    status_duration_ms: Option<u64>,
}

/// Navigation for the terminal: leaving the viewer returns to the feed list.
#[derive(Default)]
struct ScreenNavigator {
    back_requested: AtomicBool,
}

impl ScreenNavigator {
    fn take_back_request(&self) -> bool {
        self.back_requested.swap(false, Ordering::SeqCst)
    }
}

impl Navigator for ScreenNavigator {
    fn go_back(&self) {
        debug!("Viewer requested navigation back to the feed");
        self.back_requested.store(true, Ordering::SeqCst);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = args.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    setup_logging(Some(&args.log_file), level)?;
    info!("System information: {} {}", std::env::consts::OS, std::env::consts::ARCH);
    info!("Logging to file: {}", args.log_file.display());

    if let Some(path) = &args.config {
        set_config_path_override(path.clone());
        info!("Config path overridden to: {}", path.display());
    }

    let mut config = load_config()?;
    if let Some(ms) = args.status_duration_ms {
        config.playback.status_duration_ms = ms;
    }
    config.playback.validate()?;
    let me = args.me.or(config.user_id);

    let (statuses, replies): (Arc<dyn StatusService>, Arc<dyn ReplySender>) = match &args.fixture {
        Some(path) => {
            info!("Serving statuses from fixture {}", path.display());
            let service = Arc::new(FixtureStatusService::load(path)?);
            (service.clone(), service)
        }
        None => {
            info!("Using status backend at {}", config.api_base_url);
            if config.get_token().is_none() {
                warn!("No access token configured; the backend may reject requests");
            }
            let service = Arc::new(RestStatusService::new(&config.api_base_url, config.get_token())?);
            (service.clone(), service)
        }
    };

    let navigator = Arc::new(ScreenNavigator::default());
    let collaborators = Collaborators {
        statuses: statuses.clone(),
        replies,
        navigator: navigator.clone(),
    };
    let mut viewer = StatusViewer::new(collaborators, config.playback, me);
    let mut ui = StatusUI::new(&config.media_base_url);

    let mut terminal = setup_terminal()?;
    let result = run_main_loop(&mut terminal, &mut ui, &mut viewer, statuses.as_ref(), &navigator, me, args.author).await;

    viewer.unmount();
    restore_terminal(terminal)?;

    if let Err(e) = &result {
        error!("Viewer exited with error: {}", e);
    }
    info!("statusreel shutting down");
    result
}

async fn refresh_feed(ui: &mut StatusUI, service: &dyn StatusService, me: Option<UserId>) {
    match service.fetch_feed().await {
        Ok(feed) => {
            let (mine, others) = match me {
                Some(me) => split_feed(feed, me),
                None => (None, feed),
            };
            info!("Feed loaded: {} other authors, own statuses: {}", others.len(), mine.is_some());
            ui.set_feed(mine.as_ref(), &others);
        }
        Err(e) => {
            error!("Failed to load status feed: {}", e);
            ui.show_notice(format!("Could not load statuses: {}", e));
        }
    }
}

async fn open_author(ui: &mut StatusUI, viewer: &mut StatusViewer, author_id: UserId) {
    match viewer.open(author_id).await {
        Ok(Some(_)) => ui.show_viewer(),
        Ok(None) => ui.show_notice("No statuses to show"),
        Err(e) => {
            error!("Failed to open statuses of user {}: {}", author_id, e);
            ui.show_notice(format!("Could not open statuses: {}", e));
        }
    }
}

async fn apply_action(ui: &mut StatusUI, session: &PlaybackSession, action: UiAction) {
    match action {
        UiAction::Press(zone) => {
            session.press(zone);
        }
        UiAction::Release => {
            session.release();
        }
        UiAction::SwipeDown => {
            session.swipe_down();
        }
        UiAction::Tap(direction) => {
            session.advance(direction);
        }
        UiAction::TogglePause => {
            if session.is_suspended() {
                session.resume();
            } else {
                session.pause();
            }
        }
        UiAction::OpenReply => match session.open_reply() {
            Ok(()) => ui.set_reply_open(true),
            Err(e) => ui.show_notice(e.to_string()),
        },
        UiAction::SendReply(text) => {
            if let Err(e) = session.send_reply(&text) {
                ui.show_notice(e.to_string());
            }
        }
        UiAction::CancelReply => {
            session.cancel_reply();
        }
        UiAction::ConfirmDelete => {
            if session.role() == ViewerRole::Owner {
                session.pause();
                ui.set_delete_confirm(true);
            }
        }
        UiAction::Delete => {
            let result = session.delete_current().await;
            session.resume();
            if let Err(e) = result {
                ui.show_notice(format!("Failed to delete status. {}", e));
            }
        }
        UiAction::CancelDelete => session.resume(),
        UiAction::Close => {
            session.close();
        }
        UiAction::Quit | UiAction::Refresh | UiAction::OpenAuthor(_) => {}
    }
}

async fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ui: &mut StatusUI,
    viewer: &mut StatusViewer,
    service: &dyn StatusService,
    navigator: &ScreenNavigator,
    me: Option<UserId>,
    initial_author: Option<UserId>,
) -> Result<()> {
    refresh_feed(ui, service, me).await;
    if let Some(author_id) = initial_author {
        open_author(ui, viewer, author_id).await;
    }

    loop {
        // The session asked to leave (finished, closed, or deleted its last status)
        if navigator.take_back_request() {
            viewer.unmount();
            ui.show_feed();
            refresh_feed(ui, service, me).await;
        }

        let snapshot = viewer.active().map(|s| s.snapshot());
        if ui.screen() == Screen::Viewer && snapshot.is_none() {
            ui.show_feed();
        }

        terminal.draw(|f| ui.draw(f, snapshot.as_ref()))?;

        let Some(action) = ui.handle_input()? else {
            continue;
        };
        match action {
            UiAction::Quit => break,
            UiAction::Refresh => refresh_feed(ui, service, me).await,
            UiAction::OpenAuthor(author_id) => open_author(ui, viewer, author_id).await,
            action => {
                if let Some(session) = viewer.active() {
                    apply_action(ui, session, action).await;
                }
            }
        }
    }

    Ok(())
}
