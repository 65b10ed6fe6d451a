//! Minimal opening lookup by board pattern.
//!
//! Matches the current position's piece placement against a small fixed
//! table. Cosmetic only — it feeds the `opening_name` column of finished
//! games.

/// (board field substring, name)
const OPENINGS: &[(&str, &str)] = &[
    (
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR",
        "King's Pawn Opening",
    ),
    (
        "rnbqkbnr/pppp1ppp/8/4p3/3PP3/8/PPP2PPP/RNBQKBNR",
        "Queen's Gambit",
    ),
];

/// Name the opening reached by a game, if identifiable. Games shorter than
/// four plies are not classified.
pub fn opening_name(fen: &str, ply_count: usize) -> Option<&'static str> {
    if ply_count < 4 {
        return None;
    }
    for (pattern, name) in OPENINGS {
        if fen.contains(pattern) {
            return Some(name);
        }
    }
    Some("Unknown Opening")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_to_classify() {
        assert_eq!(opening_name("anything", 2), None);
    }

    #[test]
    fn test_kings_pawn() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        assert_eq!(opening_name(fen, 4), Some("King's Pawn Opening"));
    }

    #[test]
    fn test_unknown_opening_fallback() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/7N/PPPPPPPP/RNBQKB1R b KQkq - 1 1";
        assert_eq!(opening_name(fen, 6), Some("Unknown Opening"));
    }
}
