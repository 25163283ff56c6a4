use serde::{Deserialize, Serialize};

/// Seed patterns placed around the grid centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pattern {
    /// Five-cell methuselah, stabilises after 1103 generations
    #[default]
    RPentomino,
    Glider,
    Blinker,
    Block,
    Acorn,
    Diehard,
    /// Lightweight spaceship
    Lwss,
}

impl Pattern {
    pub const ALL: [Pattern; 7] = [
        Pattern::RPentomino,
        Pattern::Glider,
        Pattern::Blinker,
        Pattern::Block,
        Pattern::Acorn,
        Pattern::Diehard,
        Pattern::Lwss,
    ];

    pub fn name(&self) -> &str {
        match self {
            Pattern::RPentomino => "R-pentomino",
            Pattern::Glider => "Glider",
            Pattern::Blinker => "Blinker",
            Pattern::Block => "Block",
            Pattern::Acorn => "Acorn",
            Pattern::Diehard => "Diehard",
            Pattern::Lwss => "LWSS",
        }
    }

    pub fn next(&self) -> Pattern {
        match self {
            Pattern::RPentomino => Pattern::Glider,
            Pattern::Glider => Pattern::Blinker,
            Pattern::Blinker => Pattern::Block,
            Pattern::Block => Pattern::Acorn,
            Pattern::Acorn => Pattern::Diehard,
            Pattern::Diehard => Pattern::Lwss,
            Pattern::Lwss => Pattern::RPentomino,
        }
    }

    pub fn prev(&self) -> Pattern {
        match self {
            Pattern::RPentomino => Pattern::Lwss,
            Pattern::Glider => Pattern::RPentomino,
            Pattern::Blinker => Pattern::Glider,
            Pattern::Block => Pattern::Blinker,
            Pattern::Acorn => Pattern::Block,
            Pattern::Diehard => Pattern::Acorn,
            Pattern::Lwss => Pattern::Diehard,
        }
    }

    /// Parse a CLI name; unknown names fall back to the default pattern.
    pub fn parse(s: &str) -> Pattern {
        match s.to_lowercase().as_str() {
            "glider" => Pattern::Glider,
            "blinker" => Pattern::Blinker,
            "block" => Pattern::Block,
            "acorn" => Pattern::Acorn,
            "diehard" => Pattern::Diehard,
            "lwss" | "spaceship" => Pattern::Lwss,
            _ => Pattern::RPentomino,
        }
    }

    /// Live cells relative to the grid centre, y growing downwards.
    pub fn offsets(&self) -> &'static [(i64, i64)] {
        match self {
            Pattern::RPentomino => &[(0, 0), (0, 1), (-1, 1), (0, -1), (1, 0)],
            Pattern::Glider => &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
            Pattern::Blinker => &[(-1, 0), (0, 0), (1, 0)],
            Pattern::Block => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            Pattern::Acorn => &[(1, 0), (3, 1), (0, 2), (1, 2), (4, 2), (5, 2), (6, 2)],
            Pattern::Diehard => &[(6, 0), (0, 1), (1, 1), (1, 2), (5, 2), (6, 2), (7, 2)],
            Pattern::Lwss => &[
                (1, 0), (4, 0),
                (0, 1),
                (0, 2), (4, 2),
                (0, 3), (1, 3), (2, 3), (3, 3),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_and_prev_cycle_through_all() {
        let mut pattern = Pattern::default();
        for expected in Pattern::ALL {
            assert_eq!(pattern, expected);
            assert_eq!(pattern.next().prev(), pattern);
            pattern = pattern.next();
        }
        assert_eq!(pattern, Pattern::default());
    }

    #[test]
    fn test_parse_names() {
        for pattern in Pattern::ALL {
            assert_eq!(Pattern::parse(pattern.name()), pattern);
        }
        assert_eq!(Pattern::parse("nonsense"), Pattern::RPentomino);
    }

    #[test]
    fn test_offsets_are_distinct() {
        for pattern in Pattern::ALL {
            let offsets = pattern.offsets();
            for (i, a) in offsets.iter().enumerate() {
                assert!(!offsets[i + 1..].contains(a), "{} repeats {:?}", pattern.name(), a);
            }
        }
    }
}
