//! Rules engine adapter over shakmaty.
//!
//! Wraps move generation, move application, notation and termination
//! classification behind a small set of pure functions. Nothing in here
//! mutates a position in place — applying a move always yields a new one.

use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, File, Move,
    Position, Square,
};
use thiserror::Error;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Invalid move format: {0}")]
    InvalidMoveSyntax(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Invalid FEN: {0}")]
    InvalidPosition(String),
}

/// Why (or whether) a game is over. `DrawClaimed` covers the claimable
/// threefold/fifty-move draws, which never terminate a game automatically —
/// only an explicit claim produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    InProgress,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
    DrawClaimed,
}

impl Termination {
    pub fn is_over(self) -> bool {
        self != Termination::InProgress
    }

    /// Human-readable reason string stored in the games table.
    pub fn reason(self) -> &'static str {
        match self {
            Termination::InProgress => "In progress",
            Termination::Checkmate => "Checkmate",
            Termination::Stalemate => "Stalemate",
            Termination::InsufficientMaterial => "Insufficient material",
            Termination::SeventyFiveMoveRule => "75-move rule",
            Termination::FivefoldRepetition => "Fivefold repetition",
            Termination::DrawClaimed => "Draw claimed",
        }
    }
}

/// All legal moves in the position. Order follows shakmaty's generator, which
/// is deterministic for a given position.
pub fn legal_moves(pos: &Chess) -> Vec<Move> {
    pos.legal_moves().iter().cloned().collect()
}

/// Legal moves as UCI strings (the wire form handed to clients).
pub fn legal_move_ucis(pos: &Chess) -> Vec<String> {
    pos.legal_moves().iter().map(uci).collect()
}

/// Apply a move, yielding the successor position. The move must be legal in
/// `pos`; the pre-move position is left untouched.
pub fn apply(pos: &Chess, m: &Move) -> Result<Chess, RulesError> {
    if !pos.legal_moves().contains(m) {
        return Err(RulesError::IllegalMove(uci(m)));
    }
    let mut next = pos.clone();
    next.play_unchecked(*m);
    Ok(next)
}

/// Parse a coordinate-notation move ("e2e4", "e7e8q") and resolve it against
/// the position. Malformed input and syntactically-valid-but-illegal moves
/// are distinct failures.
pub fn parse_uci(pos: &Chess, s: &str) -> Result<Move, RulesError> {
    let uci_move: UciMove = s
        .parse()
        .map_err(|_| RulesError::InvalidMoveSyntax(s.to_string()))?;
    uci_move
        .to_move(pos)
        .map_err(|_| RulesError::IllegalMove(s.to_string()))
}

/// Coordinate notation for a move. Castling is rendered as the king's two-step
/// ("e1g1"), matching what UCI engines emit.
pub fn uci(m: &Move) -> String {
    let (from, to) = match m {
        Move::Normal { from, to, .. } => (*from, *to),
        Move::EnPassant { from, to } => (*from, *to),
        Move::Castle { king, rook } => {
            let to_file = if rook.file() > king.file() { 6u32 } else { 2u32 };
            (*king, Square::from_coords(File::new(to_file), king.rank()))
        }
        Move::Put { to, .. } => (*to, *to),
    };
    let mut s = format!("{from}{to}");
    if let Move::Normal {
        promotion: Some(role),
        ..
    } = m
    {
        s.push(match role {
            shakmaty::Role::Queen => 'q',
            shakmaty::Role::Rook => 'r',
            shakmaty::Role::Bishop => 'b',
            shakmaty::Role::Knight => 'n',
            _ => 'q',
        });
    }
    s
}

/// Standard algebraic notation for a move in `pos`, including the check/mate
/// suffix. Must be computed against the pre-move position (disambiguation
/// depends on it).
pub fn san(pos: &Chess, m: &Move) -> String {
    let mut s = San::from_move(pos, *m).to_string();
    let mut next = pos.clone();
    next.play_unchecked(*m);
    if next.is_checkmate() {
        s.push('#');
    } else if next.is_check() {
        s.push('+');
    }
    s
}

pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// The repetition key for a position: FEN with the move counters stripped.
pub fn epd(pos: &Chess) -> String {
    let full = fen(pos);
    full.split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn position_from_fen(s: &str) -> Result<Chess, RulesError> {
    let parsed: Fen = s
        .parse()
        .map_err(|_| RulesError::InvalidPosition(s.to_string()))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|_| RulesError::InvalidPosition(s.to_string()))
}

/// "white" / "black", the wire form used in responses.
pub fn turn_str(pos: &Chess) -> &'static str {
    match pos.turn() {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Single source of truth for game-over classification. `repetitions` is the
/// number of times the current position has occurred in the game, tracked by
/// the caller (shakmaty positions carry no history).
///
/// Only automatic conditions end a game: checkmate, stalemate, dead position,
/// the 75-move rule and fivefold repetition. Claimable draws stay in
/// progress.
pub fn classify_termination(pos: &Chess, repetitions: u32) -> Termination {
    if pos.is_checkmate() {
        Termination::Checkmate
    } else if pos.is_stalemate() {
        Termination::Stalemate
    } else if pos.is_insufficient_material() {
        Termination::InsufficientMaterial
    } else if pos.halfmoves() >= 150 {
        Termination::SeventyFiveMoveRule
    } else if repetitions >= 5 {
        Termination::FivefoldRepetition
    } else {
        Termination::InProgress
    }
}

/// PGN result string for a finished (or ongoing) game. On checkmate the side
/// to move is the mated side.
pub fn result_string(termination: Termination, side_to_move: Color) -> &'static str {
    match termination {
        Termination::InProgress => "*",
        Termination::Checkmate => match side_to_move {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        _ => "1/2-1/2",
    }
}

/// Rough game-phase label from the piece count, as shown in analysis
/// responses.
pub fn game_phase(pos: &Chess) -> &'static str {
    let pieces = pos.board().occupied().count();
    if pieces > 24 {
        "Opening"
    } else if pieces > 10 {
        "Middlegame"
    } else {
        "Endgame"
    }
}

/// Render a UCI principal variation as SAN, stopping at the first move that
/// does not resolve (engines can emit truncated PVs).
pub fn san_line(pos: &Chess, pv: &[String], max_plies: usize) -> Vec<String> {
    let mut current = pos.clone();
    let mut out = Vec::new();
    for uci_str in pv.iter().take(max_plies) {
        let m = match parse_uci(&current, uci_str) {
            Ok(m) => m,
            Err(_) => break,
        };
        out.push(san(&current, &m));
        current.play_unchecked(m);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen_str: &str) -> Chess {
        position_from_fen(fen_str).unwrap()
    }

    #[test]
    fn test_starting_position_has_twenty_moves() {
        let start = Chess::default();
        assert_eq!(legal_moves(&start).len(), 20);
        assert_eq!(fen(&start), STARTING_FEN);
        assert_eq!(turn_str(&start), "white");
    }

    #[test]
    fn test_parse_and_apply() {
        let start = Chess::default();
        let m = parse_uci(&start, "e2e4").unwrap();
        let next = apply(&start, &m).unwrap();
        assert_eq!(turn_str(&next), "black");
        assert!(fen(&next).starts_with("rnbqkbnr/pppppppp/8/8/4P3"));
    }

    #[test]
    fn test_malformed_move_is_syntax_error() {
        let start = Chess::default();
        assert!(matches!(
            parse_uci(&start, "not-a-move"),
            Err(RulesError::InvalidMoveSyntax(_))
        ));
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let start = Chess::default();
        // Well-formed but illegal: the e2 pawn cannot reach e5.
        assert!(matches!(
            parse_uci(&start, "e2e5"),
            Err(RulesError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_apply_rejects_move_from_other_position() {
        let start = Chess::default();
        let m = parse_uci(&start, "e2e4").unwrap();
        let next = apply(&start, &m).unwrap();
        // e2e4 is not legal again once played.
        assert!(apply(&next, &m).is_err());
    }

    #[test]
    fn test_uci_round_trip_all_legal_moves() {
        let start = Chess::default();
        for m in legal_moves(&start) {
            let s = uci(&m);
            let parsed = parse_uci(&start, &s).unwrap();
            assert_eq!(parsed, m, "round trip failed for {s}");
        }
    }

    #[test]
    fn test_castling_uci_is_king_two_step() {
        let p = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let ucis = legal_move_ucis(&p);
        assert!(ucis.contains(&"e1g1".to_string()));
        assert!(ucis.contains(&"e1c1".to_string()));
    }

    #[test]
    fn test_san_includes_mate_suffix() {
        // Fool's mate: black mates with Qh4#.
        let p = pos("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        let m = parse_uci(&p, "d8h4").unwrap();
        assert_eq!(san(&p, &m), "Qh4#");
        let after = apply(&p, &m).unwrap();
        assert_eq!(classify_termination(&after, 1), Termination::Checkmate);
        assert_eq!(result_string(Termination::Checkmate, after.turn()), "0-1");
    }

    #[test]
    fn test_stalemate_classification() {
        let p = pos("k7/8/1Q6/8/8/8/8/7K b - - 0 1");
        assert_eq!(classify_termination(&p, 1), Termination::Stalemate);
        assert_eq!(result_string(Termination::Stalemate, p.turn()), "1/2-1/2");
    }

    #[test]
    fn test_insufficient_material_classification() {
        let p = pos("k7/8/2K5/8/8/8/8/8 w - - 0 1");
        assert_eq!(
            classify_termination(&p, 1),
            Termination::InsufficientMaterial
        );
    }

    #[test]
    fn test_repetition_and_move_rule_thresholds() {
        let start = Chess::default();
        // Claimable counts do not end the game.
        assert_eq!(classify_termination(&start, 3), Termination::InProgress);
        assert_eq!(classify_termination(&start, 5), Termination::FivefoldRepetition);

        let p = pos("k7/7p/8/8/8/8/P7/K7 w - - 149 100");
        assert_eq!(classify_termination(&p, 1), Termination::InProgress);
        let p = pos("k7/7p/8/8/8/8/P7/K7 w - - 150 100");
        assert_eq!(classify_termination(&p, 1), Termination::SeventyFiveMoveRule);
    }

    #[test]
    fn test_terminal_positions_have_no_moves_otherwise_some() {
        let mate = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(legal_moves(&mate).is_empty());

        let start = Chess::default();
        let m = parse_uci(&start, "g1f3").unwrap();
        let next = apply(&start, &m).unwrap();
        assert!(!legal_moves(&next).is_empty());
    }

    #[test]
    fn test_epd_strips_counters() {
        let start = Chess::default();
        assert_eq!(epd(&start), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -");
    }

    #[test]
    fn test_invalid_fen_rejected() {
        assert!(matches!(
            position_from_fen("definitely not fen"),
            Err(RulesError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_game_phase_labels() {
        assert_eq!(game_phase(&Chess::default()), "Opening");
        assert_eq!(game_phase(&pos("k7/8/2K5/8/8/8/8/6R1 w - - 0 1")), "Endgame");
    }

    #[test]
    fn test_san_line_stops_at_unresolvable_move() {
        let start = Chess::default();
        let pv = vec!["e2e4".to_string(), "e7e5".to_string(), "zzzz".to_string()];
        let line = san_line(&start, &pv, 5);
        assert_eq!(line, vec!["e4", "e5"]);
    }
}
