use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use dropfour::{COLUMN_COUNT, Cell, Phase, ROW_COUNT};

use crate::events::Severity;
use crate::server::ServerStats;

const MAX_LOG_LINES: usize = 500;

pub struct TuiState {
    logs: VecDeque<(Severity, String)>,
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            logs: VecDeque::with_capacity(MAX_LOG_LINES),
            scroll: 0,
        }
    }

    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        if self.logs.len() >= MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back((severity, message.into()));
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &ServerStats) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(ROW_COUNT as u16 + 4),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_header(frame, chunks[0], stats);
    render_match(frame, middle[0], stats);
    render_board(frame, middle[1], stats);
    render_log(frame, chunks[2], state);
    render_help(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let title = format!(
        " Drop Four Server - {} - Uptime: {} ",
        stats.local_addr,
        format_duration(stats.uptime_secs)
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Match: {}  |  Players: {}/2  |  Phase: {}  |  Seats: {}",
        stats.session.match_id,
        stats.players.len(),
        stats.session.phase.as_str(),
        if stats.seats_open { "open" } else { "closed" }
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_match(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Players ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let session = &stats.session;
    let mut lines: Vec<Line> = (0..2u8)
        .map(|player| {
            let slot = stats.players.iter().find(|p| p.player == player);
            let marker = if session.phase == Phase::InProgress && session.turn == player {
                "> "
            } else {
                "  "
            };
            let detail = match slot {
                Some(info) => format!(
                    "{} ({})",
                    info.addr,
                    format_duration(info.connected_secs)
                ),
                None => "empty".to_string(),
            };
            let restart = if session.restart_requested[player as usize] {
                "  [restart]"
            } else {
                ""
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("Player {}: ", player + 1),
                    Style::default().fg(piece_color(Cell::for_player(player))),
                ),
                Span::styled(detail, Style::default().fg(Color::White)),
                Span::styled(restart, Style::default().fg(Color::Yellow)),
            ])
        })
        .collect();

    if let Some(winner) = session.winner {
        lines.push(Line::from(Span::styled(
            format!("Winner: Player {}", winner + 1),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_board(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Board ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let Some(grid) = stats.session.board else {
        let waiting = Paragraph::new("No match running")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(waiting, area);
        return;
    };

    let lines: Vec<Line> = (0..ROW_COUNT)
        .rev()
        .map(|row| {
            let spans: Vec<Span> = (0..COLUMN_COUNT)
                .map(|col| {
                    let cell = Cell::from_u8(grid[row][col]).unwrap_or_default();
                    let glyph = if cell.is_empty() { " . " } else { " O " };
                    Span::styled(glyph, Style::default().fg(piece_color(cell)))
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let visible = area.height.saturating_sub(2) as usize;
    let end = state.logs.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = state
        .logs
        .range(start..end)
        .map(|(severity, message)| {
            let color = match severity {
                Severity::Info => Color::White,
                Severity::Warn => Color::Yellow,
            };
            Line::from(Span::styled(message.as_str(), Style::default().fg(color)))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q / Esc / Ctrl-C: quit   PgUp/PgDn/End: scroll events")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn piece_color(cell: Cell) -> Color {
    match cell {
        Cell::Empty => Color::DarkGray,
        Cell::PlayerA => Color::Red,
        Cell::PlayerB => Color::Yellow,
    }
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3725), "01:02:05");
    }

    #[test]
    fn test_log_is_bounded() {
        let mut state = TuiState::new();
        for i in 0..(MAX_LOG_LINES + 10) {
            state.log_info(format!("line {}", i));
        }
        assert_eq!(state.logs.len(), MAX_LOG_LINES);
        assert_eq!(state.logs.front().unwrap().1, "line 10");
    }
}
