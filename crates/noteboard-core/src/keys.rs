//! Flat key naming convention
//!
//! A board is stored as a flat map from string keys to values. Every note
//! attribute lives under its own key, built as `<prefix><noteId>`. Peers
//! written in other languages share this layout, so the prefixes must stay
//! byte-for-byte identical.
//!
//! | Key                      | Value                        |
//! |--------------------------|------------------------------|
//! | `noteId_<id>`            | 1 (exists) / 0 (deleted)     |
//! | `position_<id>`          | `{x, y}`                     |
//! | `author_<id>`            | user record                  |
//! | `text_<id>`              | string                       |
//! | `color_<id>`             | string                       |
//! | `vote_<id>_<userId>`     | user record, or null         |
//! | `userIds`                | list of signed-in user ids   |

pub const NOTE_ID_PREFIX: &str = "noteId_";
pub const POSITION_PREFIX: &str = "position_";
pub const AUTHOR_PREFIX: &str = "author_";
pub const TEXT_PREFIX: &str = "text_";
pub const COLOR_PREFIX: &str = "color_";
pub const VOTE_PREFIX: &str = "vote_";

/// Key holding the signed-in roster
pub const USER_IDS: &str = "userIds";

/// Key of a note's presence flag
pub fn presence(note_id: &str) -> String {
    format!("{NOTE_ID_PREFIX}{note_id}")
}

pub fn position(note_id: &str) -> String {
    format!("{POSITION_PREFIX}{note_id}")
}

pub fn author(note_id: &str) -> String {
    format!("{AUTHOR_PREFIX}{note_id}")
}

pub fn text(note_id: &str) -> String {
    format!("{TEXT_PREFIX}{note_id}")
}

pub fn color(note_id: &str) -> String {
    format!("{COLOR_PREFIX}{note_id}")
}

/// Key of a single user's like on a note
pub fn vote(note_id: &str, user_id: &str) -> String {
    format!("{VOTE_PREFIX}{note_id}_{user_id}")
}

/// Common prefix of every like key for a note
pub fn vote_prefix(note_id: &str) -> String {
    format!("{VOTE_PREFIX}{note_id}_")
}

/// Extract the note id from a presence flag key
pub fn note_id_from_presence(key: &str) -> Option<&str> {
    key.strip_prefix(NOTE_ID_PREFIX)
}

/// Extract the liker's user id from a like key of the given note
///
/// The suffix is only a candidate: a key for note `a_b` also starts with the
/// prefix of note `a`. Callers confirm the match against the stored user.
pub fn liker_from_vote<'a>(key: &'a str, note_id: &str) -> Option<&'a str> {
    key.strip_prefix(VOTE_PREFIX)?
        .strip_prefix(note_id)?
        .strip_prefix('_')
}

/// A key classified by the attribute it encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKey<'a> {
    Presence(&'a str),
    Position(&'a str),
    Author(&'a str),
    Text(&'a str),
    Color(&'a str),
    /// Like key; the suffix is `<noteId>_<userId>` and cannot be split
    /// without knowing the note id
    Vote(&'a str),
    Roster,
    Other(&'a str),
}

impl<'a> BoardKey<'a> {
    /// Classify a raw key by its prefix
    pub fn parse(key: &'a str) -> Self {
        if key == USER_IDS {
            return BoardKey::Roster;
        }

        let prefixes: [(&str, fn(&'a str) -> BoardKey<'a>); 6] = [
            (NOTE_ID_PREFIX, BoardKey::Presence),
            (POSITION_PREFIX, BoardKey::Position),
            (AUTHOR_PREFIX, BoardKey::Author),
            (TEXT_PREFIX, BoardKey::Text),
            (COLOR_PREFIX, BoardKey::Color),
            (VOTE_PREFIX, BoardKey::Vote),
        ];

        for (prefix, make) in prefixes {
            if let Some(rest) = key.strip_prefix(prefix) {
                return make(rest);
            }
        }

        BoardKey::Other(key)
    }

    /// Short attribute name, used for display
    pub fn attribute(&self) -> &'static str {
        match self {
            BoardKey::Presence(_) => "presence",
            BoardKey::Position(_) => "position",
            BoardKey::Author(_) => "author",
            BoardKey::Text(_) => "text",
            BoardKey::Color(_) => "color",
            BoardKey::Vote(_) => "like",
            BoardKey::Roster => "roster",
            BoardKey::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(presence("n1"), "noteId_n1");
        assert_eq!(position("n1"), "position_n1");
        assert_eq!(author("n1"), "author_n1");
        assert_eq!(text("n1"), "text_n1");
        assert_eq!(color("n1"), "color_n1");
        assert_eq!(vote("n1", "u2"), "vote_n1_u2");
        assert_eq!(USER_IDS, "userIds");
    }

    #[test]
    fn test_note_id_from_presence() {
        assert_eq!(note_id_from_presence("noteId_abc"), Some("abc"));
        assert_eq!(note_id_from_presence("text_abc"), None);
        assert_eq!(note_id_from_presence("userIds"), None);
    }

    #[test]
    fn test_liker_from_vote() {
        assert_eq!(liker_from_vote("vote_n1_u2", "n1"), Some("u2"));
        assert_eq!(liker_from_vote("vote_n10_u2", "n1"), None);
        assert_eq!(liker_from_vote("text_n1", "n1"), None);
        // Ambiguous candidate, resolved by the caller
        assert_eq!(liker_from_vote("vote_n1_x_u2", "n1"), Some("x_u2"));
    }

    #[test]
    fn test_board_key_parse() {
        assert_eq!(BoardKey::parse("noteId_a"), BoardKey::Presence("a"));
        assert_eq!(BoardKey::parse("position_a"), BoardKey::Position("a"));
        assert_eq!(BoardKey::parse("vote_a_u1"), BoardKey::Vote("a_u1"));
        assert_eq!(BoardKey::parse("userIds"), BoardKey::Roster);
        assert_eq!(BoardKey::parse("board_id"), BoardKey::Other("board_id"));
        assert_eq!(BoardKey::parse("color_a").attribute(), "color");
    }
}
