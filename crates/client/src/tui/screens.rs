use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use dropfour::{COLUMN_COUNT, Cell, GameView, ROW_COUNT, Status};

const CELL_WIDTH: u16 = 4;

pub fn render(frame: &mut Frame, view: &GameView, cursor: usize, send_error: Option<&str>) {
    let area = frame.area();

    let title = format!(" Drop Four - Player {} ", view.player() + 1);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(player_color(view.player())));
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(ROW_COUNT as u16 + 4),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    render_status(frame, chunks[0], view);
    render_board(frame, centered(board_width(), chunks[1]), view, cursor);
    render_notices(frame, chunks[2], view, send_error);
    render_help(frame, chunks[3], view);
}

fn render_status(frame: &mut Frame, area: Rect, view: &GameView) {
    let status = view.status();
    let color = match status {
        Status::YourTurn | Status::YouWin => Color::Green,
        Status::YouLose | Status::OpponentLeft | Status::Disconnected => Color::Red,
        Status::Draw => Color::Yellow,
        Status::OpponentTurn | Status::WaitingForOpponent => Color::White,
    };

    let mut lines = vec![Line::from(Span::styled(
        status.as_str(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))];
    if view.game_id() > 0 {
        lines.push(Line::from(Span::styled(
            format!("Game #{}", view.game_id()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_board(frame: &mut Frame, area: Rect, view: &GameView, cursor: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut lines = Vec::with_capacity(ROW_COUNT + 2);

    let pointer: Vec<Span> = (0..COLUMN_COUNT)
        .map(|col| {
            if col == cursor && view.can_move() {
                Span::styled(
                    "  v ",
                    Style::default().fg(player_color(view.player())),
                )
            } else {
                Span::raw("    ")
            }
        })
        .collect();
    lines.push(Line::from(pointer));

    // Row 0 is the bottom of the board.
    for row in (0..ROW_COUNT).rev() {
        let spans: Vec<Span> = (0..COLUMN_COUNT)
            .map(|col| {
                let cell = view.cell(row, col);
                let glyph = if cell.is_empty() { "  . " } else { "  O " };
                Span::styled(glyph, Style::default().fg(cell_color(cell)))
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let labels: String = (1..=COLUMN_COUNT).map(|n| format!("  {} ", n)).collect();
    lines.push(Line::from(Span::styled(
        labels,
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_notices(frame: &mut Frame, area: Rect, view: &GameView, send_error: Option<&str>) {
    let mut lines = Vec::new();

    if let Some(player) = view.departed() {
        lines.push(Line::from(Span::styled(
            format!("Player {} disconnected", player + 1),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(notice) = view.restart_notice() {
        lines.push(Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(err) = send_error {
        lines.push(Line::from(Span::styled(
            format!("Send failed: {}", err),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn render_help(frame: &mut Frame, area: Rect, view: &GameView) {
    let text = if view.is_connected() {
        "←→ Move  Enter/Space Drop  1-7 Drop in column  R Restart  Q Quit"
    } else {
        "Press any key to exit"
    };

    let help = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

fn board_width() -> u16 {
    COLUMN_COUNT as u16 * CELL_WIDTH + 2
}

fn centered(width: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    Rect::new(x, area.y, width.min(area.width), area.height)
}

fn player_color(player: u8) -> Color {
    cell_color(Cell::for_player(player))
}

fn cell_color(cell: Cell) -> Color {
    match cell {
        Cell::Empty => Color::DarkGray,
        Cell::PlayerA => Color::Red,
        Cell::PlayerB => Color::Yellow,
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use dropfour::ServerMessage;

    use super::*;

    fn rendered(view: &GameView) -> String {
        let backend = TestBackend::new(60, 22);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, view, 3, None)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_waiting_screen() {
        let view = GameView::new(0);
        assert!(rendered(&view).contains("Waiting for opponent..."));
    }

    #[test]
    fn test_departed_player_is_named() {
        let mut view = GameView::new(0);
        view.apply(&ServerMessage::GameStart {
            board: [[0; COLUMN_COUNT]; ROW_COUNT],
            turn: 0,
            game_over: false,
            game_id: 1,
        });
        view.apply(&ServerMessage::PlayerDisconnected { player: 1 });

        let screen = rendered(&view);
        assert!(screen.contains("Opponent left the game"));
        assert!(screen.contains("Player 2 disconnected"));
    }
}
