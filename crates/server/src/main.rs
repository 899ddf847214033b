mod config;
mod events;
mod server;
mod tui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::ServerConfig;
use server::{GameServer, ServerMonitor};
use tui::TuiState;

#[derive(Parser)]
#[command(name = "dropfour-server")]
#[command(about = "Drop four game server")]
struct Args {
    #[arg(long, default_value = dropfour::DEFAULT_HOST)]
    host: String,

    #[arg(short, long, default_value_t = dropfour::DEFAULT_PORT)]
    port: u16,

    #[arg(long, help = "Log ignored moves as warnings instead of debug")]
    strict: bool,

    #[arg(long, help = "Show a live dashboard instead of log output")]
    tui: bool,

    #[arg(
        long,
        default_value_t = 64,
        help = "Frames a slow client may lag behind before it is dropped"
    )]
    outbound_queue: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        strict: args.strict,
        outbound_queue: args.outbound_queue,
    };

    if !args.tui {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let server = runtime
        .block_on(GameServer::bind(&config))
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    if args.tui {
        let monitor = server.monitor();
        runtime.spawn(server.run());
        run_with_tui(&monitor)?;
    } else {
        log::info!("Server started, listening on {}", server.local_addr());
        runtime.block_on(async {
            tokio::select! {
                _ = server.run() => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        log::error!("Could not listen for interrupt: {}", err);
                    }
                }
            }
        });
        log::info!("Server shutting down");
    }

    runtime.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}

fn run_with_tui(monitor: &ServerMonitor) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new();
    let (stats, _) = monitor.poll_blocking();
    tui_state.log_info(format!("Server started on {}", stats.local_addr));

    let mut running = true;
    while running {
        let (stats, table_events) = monitor.poll_blocking();
        for event in &table_events {
            tui_state.log(events::severity(event), events::describe(event));
        }

        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            running = false;
                        }
                        KeyCode::Char('q') | KeyCode::Esc => running = false,
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
