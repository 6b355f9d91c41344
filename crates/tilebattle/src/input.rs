//! Key bindings shared by the solo and duel front ends.

use tilebattle_core::Direction;

/// A gameplay key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Slide up.
    Up,
    /// Slide down.
    Down,
    /// Slide left.
    Left,
    /// Slide right.
    Right,
    /// Start a new board.
    Reset,
}

impl Key {
    /// Slide direction for the arrow keys, `None` for [`Key::Reset`].
    #[inline]
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            Self::Reset => None,
        }
    }

    /// Maps a terminal character: `wasd` or `hjkl` to slides, `r` to reset.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' | 'k' => Some(Self::Up),
            's' | 'j' => Some(Self::Down),
            'a' | 'h' => Some(Self::Left),
            'd' | 'l' => Some(Self::Right),
            'r' => Some(Self::Reset),
            _ => None,
        }
    }

    /// Maps every recognised character of a typed line, in order.
    pub fn parse_line(line: &str) -> impl Iterator<Item = Self> + '_ {
        line.chars().filter_map(Self::from_char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_keys_map_to_directions() {
        assert_eq!(Key::Up.direction(), Some(Direction::Up));
        assert_eq!(Key::Right.direction(), Some(Direction::Right));
        assert_eq!(Key::Reset.direction(), None);
    }

    #[test]
    fn test_parse_line() {
        let keys: Vec<Key> = Key::parse_line("wA x R?l").collect();
        assert_eq!(keys, vec![Key::Up, Key::Left, Key::Reset, Key::Right]);
    }
}
