//! Simulated collaborators shown as cursor glyphs on the canvas.

use crate::geometry::{Color, Point};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub color: Color,
}

impl Collaborator {
    fn new(id: &str, name: &str, avatar: &str, color: Color) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            avatar: avatar.to_string(),
            color,
        }
    }
}

pub fn online_users() -> Vec<Collaborator> {
    vec![
        Collaborator::new("u1", "Alex Kim", "AK", Color::new(0x3B, 0x82, 0xF6)),
        Collaborator::new("u2", "Jamie L", "JL", Color::new(0x0D, 0x94, 0x88)),
        Collaborator::new("u3", "Sam R", "SR", Color::new(0xF5, 0x9E, 0x0B)),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorGlyph {
    pub user: Collaborator,
    pub position: Point,
}

impl CursorGlyph {
    /// Arrow-head outline with its tip at `position`.
    pub fn outline(&self) -> [Point; 3] {
        let tip = self.position;
        [tip, tip.offset(2.0, 14.0), tip.offset(7.0, 10.0)]
    }

    pub fn label_anchor(&self) -> Point {
        self.position.offset(12.0, 14.0)
    }
}

/// Remote cursors in world space, excluding the local user.
#[derive(Debug, Clone, Default)]
pub struct PresenceBoard {
    cursors: Vec<CursorGlyph>,
}

impl PresenceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two collaborators parked at fixed demo positions.
    pub fn demo() -> Self {
        let users = online_users();
        let mut board = Self::new();
        for (user, position) in users
            .into_iter()
            .skip(1)
            .zip([Point::new(280.0, 180.0), Point::new(420.0, 260.0)])
        {
            board.cursors.push(CursorGlyph { user, position });
        }
        board
    }

    pub fn cursors(&self) -> &[CursorGlyph] {
        &self.cursors
    }

    /// Moves the collaborator's cursor, adding it if unseen.
    pub fn set_cursor(&mut self, user: Collaborator, position: Point) {
        match self.cursors.iter_mut().find(|cursor| cursor.user.id == user.id) {
            Some(cursor) => cursor.position = position,
            None => self.cursors.push(CursorGlyph { user, position }),
        }
    }

    pub fn remove(&mut self, user_id: &str) -> bool {
        let before = self.cursors.len();
        self.cursors.retain(|cursor| cursor.user.id != user_id);
        self.cursors.len() != before
    }

    /// Hides the local user's own glyph.
    pub fn without_user(mut self, name: &str) -> Self {
        self.cursors.retain(|cursor| cursor.user.name != name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_board_places_two_remote_cursors() {
        let board = PresenceBoard::demo();
        let names: Vec<_> = board.cursors().iter().map(|c| c.user.name.as_str()).collect();
        assert_eq!(names, ["Jamie L", "Sam R"]);
        assert_eq!(board.cursors()[0].position, Point::new(280.0, 180.0));
        assert_eq!(board.cursors()[1].user.color, Color::new(0xF5, 0x9E, 0x0B));
    }

    #[test]
    fn glyph_geometry_hangs_off_the_tip() {
        let board = PresenceBoard::demo();
        let glyph = &board.cursors()[0];
        assert_eq!(
            glyph.outline(),
            [
                Point::new(280.0, 180.0),
                Point::new(282.0, 194.0),
                Point::new(287.0, 190.0),
            ]
        );
        assert_eq!(glyph.label_anchor(), Point::new(292.0, 194.0));
    }

    #[test]
    fn set_cursor_updates_in_place_and_remove_drops() {
        let mut board = PresenceBoard::demo();
        let jamie = board.cursors()[0].user.clone();
        board.set_cursor(jamie, Point::new(10.0, 10.0));
        assert_eq!(board.cursors().len(), 2);
        assert_eq!(board.cursors()[0].position, Point::new(10.0, 10.0));

        assert!(board.remove("u2"));
        assert!(!board.remove("u2"));
        assert_eq!(board.without_user("Sam R").cursors().len(), 0);
    }
}
