mod screens;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use dropfour::{COLUMN_COUNT, GameView};

use crate::net::{NetworkClient, NetworkEvent};

/// What a key press asks for. Whether it is acted on depends on the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    None,
    Quit,
    CursorLeft,
    CursorRight,
    DropAtCursor,
    Drop(u8),
    Restart,
}

pub fn intent_for(code: KeyCode, modifiers: KeyModifiers) -> Intent {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Intent::Quit;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => Intent::Quit,
        KeyCode::Left | KeyCode::Char('h') => Intent::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Intent::CursorRight,
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Down => Intent::DropAtCursor,
        KeyCode::Char('r') | KeyCode::Char('R') => Intent::Restart,
        KeyCode::Char(c @ '1'..='7') => Intent::Drop(c as u8 - b'1'),
        _ => Intent::None,
    }
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    client: NetworkClient,
    view: GameView,
    cursor: usize,
    linger: Duration,
    closed_at: Option<Instant>,
    send_error: Option<String>,
    should_quit: bool,
}

impl Tui {
    pub fn new(client: NetworkClient, linger: Duration) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        let view = GameView::new(client.player());

        Ok(Self {
            terminal,
            client,
            view,
            cursor: COLUMN_COUNT / 2,
            linger,
            closed_at: None,
            send_error: None,
            should_quit: false,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        while !self.should_quit {
            self.pump_network();
            self.draw()?;

            if let Some(closed_at) = self.closed_at {
                if closed_at.elapsed() >= self.linger {
                    break;
                }
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }
        }

        self.client.shutdown();
        Ok(())
    }

    fn pump_network(&mut self) {
        for event in self.client.poll() {
            match event {
                NetworkEvent::Message(message) => self.view.apply(&message),
                NetworkEvent::Disconnected => {
                    self.view.connection_lost();
                    self.closed_at.get_or_insert_with(Instant::now);
                }
            }
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let view = &self.view;
        let cursor = self.cursor;
        let send_error = self.send_error.as_deref();

        self.terminal.draw(|frame| {
            screens::render(frame, view, cursor, send_error);
        })?;

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        // Once the server is gone the final board is shown until any key.
        if !self.view.is_connected() {
            self.should_quit = true;
            return;
        }

        match intent_for(code, modifiers) {
            Intent::None => {}
            Intent::Quit => self.should_quit = true,
            Intent::CursorLeft => self.cursor = self.cursor.saturating_sub(1),
            Intent::CursorRight => self.cursor = (self.cursor + 1).min(COLUMN_COUNT - 1),
            Intent::DropAtCursor => self.drop_piece(self.cursor as u8),
            Intent::Drop(column) => {
                self.cursor = column as usize;
                self.drop_piece(column);
            }
            Intent::Restart => {
                if self.view.can_request_restart() {
                    let result = self.client.request_restart();
                    self.record_send(result);
                }
            }
        }
    }

    fn drop_piece(&mut self, column: u8) {
        if self.view.can_move() {
            let result = self.client.send_move(column);
            self.record_send(result);
        }
    }

    fn record_send(&mut self, result: Result<(), dropfour::CodecError>) {
        if let Err(err) = result {
            log::warn!("Send failed: {}", err);
            self.send_error = Some(err.to_string());
        }
    }

    fn restore_terminal(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// The terminal is restored when the `Tui` drops, on error paths included.
pub fn run_game(client: NetworkClient, linger: Duration) -> io::Result<()> {
    Tui::new(client, linger)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_keys_map_to_columns() {
        assert_eq!(intent_for(KeyCode::Char('1'), KeyModifiers::NONE), Intent::Drop(0));
        assert_eq!(intent_for(KeyCode::Char('7'), KeyModifiers::NONE), Intent::Drop(6));
        assert_eq!(intent_for(KeyCode::Char('8'), KeyModifiers::NONE), Intent::None);
        assert_eq!(intent_for(KeyCode::Char('0'), KeyModifiers::NONE), Intent::None);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(intent_for(KeyCode::Char('q'), KeyModifiers::NONE), Intent::Quit);
        assert_eq!(intent_for(KeyCode::Esc, KeyModifiers::NONE), Intent::Quit);
        assert_eq!(intent_for(KeyCode::Char('c'), KeyModifiers::CONTROL), Intent::Quit);
        assert_eq!(intent_for(KeyCode::Char('c'), KeyModifiers::NONE), Intent::None);
    }

    #[test]
    fn test_cursor_and_restart_keys() {
        assert_eq!(intent_for(KeyCode::Left, KeyModifiers::NONE), Intent::CursorLeft);
        assert_eq!(intent_for(KeyCode::Right, KeyModifiers::NONE), Intent::CursorRight);
        assert_eq!(intent_for(KeyCode::Enter, KeyModifiers::NONE), Intent::DropAtCursor);
        assert_eq!(intent_for(KeyCode::Char(' '), KeyModifiers::NONE), Intent::DropAtCursor);
        assert_eq!(intent_for(KeyCode::Char('r'), KeyModifiers::NONE), Intent::Restart);
    }
}
