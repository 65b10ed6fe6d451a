//! PGN rendering for finished games.

/// Render SAN moves as numbered movetext: `1. e4 e5 2. Nf3 ...` followed by
/// the result token.
pub fn render_movetext(sans: &[String], result: &str) -> String {
    let mut out = String::new();
    for (i, san) in sans.iter().enumerate() {
        if i % 2 == 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("{}.", i / 2 + 1));
        }
        out.push(' ');
        out.push_str(san);
    }
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(result);
    out
}

/// Render a complete PGN game with the headers used by the service. `date`
/// is `YYYY.MM.DD`.
pub fn render_game(white: &str, black: &str, date: &str, result: &str, sans: &[String]) -> String {
    format!(
        "[Event \"Online Game\"]\n[Date \"{date}\"]\n[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"{result}\"]\n\n{}\n",
        render_movetext(sans, result)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sans(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_movetext_numbering() {
        let text = render_movetext(&sans(&["e4", "e5", "Nf3", "Nc6", "Bb5"]), "*");
        assert_eq!(text, "1. e4 e5 2. Nf3 Nc6 3. Bb5 *");
    }

    #[test]
    fn test_empty_game_is_just_result() {
        assert_eq!(render_movetext(&[], "1/2-1/2"), "1/2-1/2");
    }

    #[test]
    fn test_render_game_headers() {
        let pgn = render_game("Human", "Stockfish (1320)", "2025.01.15", "1-0", &sans(&["e4"]));
        assert!(pgn.starts_with("[Event \"Online Game\"]\n[Date \"2025.01.15\"]"));
        assert!(pgn.contains("[White \"Human\"]"));
        assert!(pgn.contains("[Black \"Stockfish (1320)\"]"));
        assert!(pgn.contains("[Result \"1-0\"]"));
        assert!(pgn.ends_with("1. e4 1-0\n"));
    }
}
