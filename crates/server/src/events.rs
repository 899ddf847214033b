use dropfour::TableEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

pub fn severity(event: &TableEvent) -> Severity {
    match event {
        TableEvent::PlayerRejected { .. } | TableEvent::MoveRejected { .. } => Severity::Warn,
        _ => Severity::Info,
    }
}

pub fn describe(event: &TableEvent) -> String {
    match event {
        TableEvent::PlayerJoined { player } => format!("Player {} joined", player + 1),
        TableEvent::PlayerRejected { reason } => format!("Connection refused: {}", reason),
        TableEvent::PlayerLeft { player } => format!("Player {} left", player + 1),
        TableEvent::MatchStarted { match_id } => format!("Match {} started", match_id),
        TableEvent::MoveApplied { player, column } => {
            format!("Player {} dropped in column {}", player + 1, column + 1)
        }
        TableEvent::MoveRejected { player, reason } => {
            format!("Ignored move from player {}: {}", player + 1, reason)
        }
        TableEvent::RestartRequested { player } => {
            format!("Player {} asked for a restart", player + 1)
        }
        TableEvent::MatchEnded { winner: Some(winner) } => format!("Player {} wins", winner + 1),
        TableEvent::MatchEnded { winner: None } => "Match drawn".to_string(),
        TableEvent::MatchAbandoned { player } => {
            format!("Match abandoned, player {} disconnected", player + 1)
        }
    }
}
