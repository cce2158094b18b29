//! The note board model
//!
//! [`NoteBoard`] translates note, like and roster operations into reads and
//! writes on a [`SharedMap`], and computes its views by scanning the map on
//! every call. Nothing is cached, so a view always reflects the replica's
//! current state, including changes merged from other peers.
//!
//! ## Note lifecycle
//!
//! - A note is *complete* when both its position and author are set.
//! - A note is *deleted* when its presence flag is 0. Deleting never removes
//!   keys; `set_note` writes the flag back to 1.
//! - A note is *listed* when its presence flag exists, is not 0, and the note
//!   is complete. Partial writes alone (`move_note`, `set_note_text`, ...)
//!   never make a note listed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{BoardError, BoardResult};
use crate::keys;
use crate::models::{LikedNote, NoteData, NoteView, Position, User};
use crate::shared_map::{is_truthy, string_set, Listener, SharedMap, Subscription};

/// Presence flag value of a live note
const NOTE_PRESENT: i64 = 1;
/// Presence flag value of a deleted note
const NOTE_DELETED: i64 = 0;

/// A brainstorming board over a shared map
#[derive(Debug)]
pub struct NoteBoard<M> {
    map: M,
}

impl<M: SharedMap> NoteBoard<M> {
    pub fn new(map: M) -> Self {
        Self { map }
    }

    /// The underlying substrate
    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn into_inner(self) -> M {
        self.map
    }

    // ==================== Notes ====================

    /// Read a note as seen by `viewer`
    ///
    /// Attributes that were never written come back as `None`; this never
    /// fails for a missing note.
    pub fn note_view(&self, note_id: &str, viewer: &User) -> BoardResult<NoteView> {
        Ok(NoteView {
            id: note_id.to_string(),
            text: self.read(&keys::text(note_id))?,
            position: self.read(&keys::position(note_id))?,
            author: self.read(&keys::author(note_id))?,
            color: self.read(&keys::color(note_id))?,
            num_likes: self.note_liked_users(note_id)?.len(),
            did_i_like: self.is_liked_by(note_id, &viewer.user_id)?,
        })
    }

    /// Views of every listed note, in enumeration order
    pub fn note_views(&self, viewer: &User) -> BoardResult<Vec<NoteView>> {
        self.note_ids()?
            .iter()
            .map(|id| self.note_view(id, viewer))
            .collect()
    }

    /// Overwrite a note's position
    pub fn move_note(&mut self, note_id: &str, position: Position) -> BoardResult<()> {
        self.write(&keys::position(note_id), &position)
    }

    /// Write every attribute of a note and mark it present
    pub fn set_note(&mut self, note_id: &str, note: &NoteData) -> BoardResult<()> {
        debug!(note_id, "Setting note");
        self.write(&keys::position(note_id), &note.position)?;
        self.write(&keys::author(note_id), &note.author)?;
        match note.text {
            Some(ref text) => self.set_note_text(note_id, text)?,
            None => self.map.set(&keys::text(note_id), Value::Null)?,
        }
        self.map
            .set(&keys::presence(note_id), Value::from(NOTE_PRESENT))?;
        self.set_note_color(note_id, &note.color)
    }

    pub fn set_note_text(&mut self, note_id: &str, text: &str) -> BoardResult<()> {
        self.map.set(&keys::text(note_id), Value::from(text))
    }

    pub fn set_note_color(&mut self, note_id: &str, color: &str) -> BoardResult<()> {
        self.map.set(&keys::color(note_id), Value::from(color))
    }

    /// Soft-delete a note; its other keys stay in place
    pub fn delete_note(&mut self, note_id: &str) -> BoardResult<()> {
        debug!(note_id, "Deleting note");
        self.map
            .set(&keys::presence(note_id), Value::from(NOTE_DELETED))
    }

    pub fn is_complete(&self, note_id: &str) -> BoardResult<bool> {
        Ok(is_truthy(self.map.get(&keys::position(note_id))?.as_ref())
            && is_truthy(self.map.get(&keys::author(note_id))?.as_ref()))
    }

    pub fn is_deleted(&self, note_id: &str) -> BoardResult<bool> {
        Ok(self
            .map
            .get(&keys::presence(note_id))?
            .and_then(|flag| flag.as_f64())
            == Some(NOTE_DELETED as f64))
    }

    /// Ids of every listed note
    pub fn note_ids(&self) -> BoardResult<Vec<String>> {
        let mut ids = Vec::new();
        for id in self.flagged_note_ids()? {
            if self.is_complete(&id)? && !self.is_deleted(&id)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    // ==================== Likes ====================

    /// Toggle `user`'s like on a note; returns whether it is now liked
    ///
    /// The like is retracted only if the stored record equals `user`.
    pub fn like_note(&mut self, note_id: &str, user: &User) -> BoardResult<bool> {
        let key = keys::vote(note_id, &user.user_id);
        let record = encode(&key, user)?;

        loop {
            let current = self.map.get(&key)?;
            let (next, liked) = if current.as_ref() == Some(&record) {
                (Value::Null, false)
            } else {
                (record.clone(), true)
            };
            if self.map.compare_and_set(&key, current.as_ref(), next)? {
                debug!(note_id, user_id = %user.user_id, liked, "Toggled like");
                return Ok(liked);
            }
        }
    }

    /// Like or unlike a note
    ///
    /// Unlike a toggle, replicas stating the same intent concurrently
    /// converge to that intent.
    pub fn set_like(&mut self, note_id: &str, user: &User, liked: bool) -> BoardResult<()> {
        let key = keys::vote(note_id, &user.user_id);
        let current = self.map.get(&key)?;

        if liked {
            let record = encode(&key, user)?;
            if current.as_ref() != Some(&record) {
                self.map.set(&key, record)?;
            }
        } else if current.is_some_and(|v| !v.is_null()) {
            self.map.set(&key, Value::Null)?;
        }
        Ok(())
    }

    /// Users currently liking a note, in enumeration order
    pub fn note_liked_users(&self, note_id: &str) -> BoardResult<Vec<User>> {
        let mut users = Vec::new();
        for key in self.map.keys()? {
            let Some(candidate) = keys::liker_from_vote(&key, note_id) else {
                continue;
            };
            // The suffix is ambiguous when note ids share a prefix; the
            // stored record settles which note the like belongs to
            if let Some(user) = self.read::<User>(&key)? {
                if user.user_id == candidate {
                    users.push(user);
                }
            }
        }
        Ok(users)
    }

    /// Same rule as `note_liked_users`: the stored record must name the user
    fn is_liked_by(&self, note_id: &str, user_id: &str) -> BoardResult<bool> {
        Ok(self
            .read::<User>(&keys::vote(note_id, user_id))?
            .is_some_and(|user| user.user_id == user_id))
    }

    /// Liked notes with text, most liked first
    ///
    /// Deleted notes are skipped. Notes with equal like counts keep their
    /// enumeration order.
    pub fn liked_notes(&self) -> BoardResult<Vec<LikedNote>> {
        let mut liked = Vec::new();
        for id in self.flagged_note_ids()? {
            if self.is_deleted(&id)? {
                continue;
            }
            let num_likes = self.note_liked_users(&id)?.len();
            if num_likes == 0 || !is_truthy(self.map.get(&keys::text(&id))?.as_ref()) {
                continue;
            }
            let Some(text) = self.read::<String>(&keys::text(&id))? else {
                continue;
            };
            liked.push(LikedNote {
                text,
                color: self.read(&keys::color(&id))?,
                author: self.read(&keys::author(&id))?,
                num_likes,
            });
        }

        liked.sort_by(|a, b| b.num_likes.cmp(&a.num_likes));
        Ok(liked)
    }

    // ==================== Roster ====================

    /// Add a user to the signed-in roster; returns `false` if already there
    pub fn sign_in(&mut self, user_id: &str) -> BoardResult<bool> {
        self.map.add_to_set(keys::USER_IDS, user_id)
    }

    /// Remove a user from the signed-in roster; returns `false` if absent
    pub fn sign_out(&mut self, user_id: &str) -> BoardResult<bool> {
        self.map.remove_from_set(keys::USER_IDS, user_id)
    }

    pub fn signed_in_user_ids(&self) -> BoardResult<Vec<String>> {
        Ok(string_set(self.map.get(keys::USER_IDS)?.as_ref()))
    }

    // ==================== Changes ====================

    /// Register a listener for every change, local or remote
    pub fn subscribe(&mut self, listener: Listener) -> Subscription {
        self.map.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.map.unsubscribe(subscription)
    }

    // ==================== Private helpers ====================

    /// Ids that have a presence flag, whatever its value
    fn flagged_note_ids(&self) -> BoardResult<Vec<String>> {
        Ok(self
            .map
            .keys()?
            .iter()
            .filter_map(|key| keys::note_id_from_presence(key))
            .map(str::to_string)
            .collect())
    }

    /// Read and decode a key; null, missing and undecodable values are `None`
    fn read<T: DeserializeOwned>(&self, key: &str) -> BoardResult<Option<T>> {
        match self.map.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match serde_json::from_value(value) {
                Ok(decoded) => Ok(Some(decoded)),
                Err(e) => {
                    warn!(key, error = %e, "Ignoring undecodable value");
                    Ok(None)
                }
            },
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> BoardResult<()> {
        let value = encode(key, value)?;
        self.map.set(key, value)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> BoardResult<Value> {
    serde_json::to_value(value).map_err(|source| BoardError::Encode {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BoardDocument;
    use crate::shared_map::{MemoryMap, ValueChanged};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn memory_board() -> NoteBoard<MemoryMap> {
        NoteBoard::new(MemoryMap::new())
    }

    fn document_board() -> NoteBoard<BoardDocument> {
        NoteBoard::new(BoardDocument::new())
    }

    fn note(id: &str, text: &str) -> NoteData {
        NoteData {
            id: id.to_string(),
            text: Some(text.to_string()),
            position: Position::new(0.0, 0.0),
            author: User::new("u1"),
            color: "red".to_string(),
        }
    }

    /// Run a check against both substrates
    fn on_both(check: fn(&mut NoteBoard<MemoryMap>), check_doc: fn(&mut NoteBoard<BoardDocument>)) {
        check(&mut memory_board());
        check_doc(&mut document_board());
    }

    fn set_note_then_view<M: SharedMap>(board: &mut NoteBoard<M>) {
        let data = note("n1", "hi");
        board.set_note("n1", &data).unwrap();

        assert_eq!(board.note_ids().unwrap(), vec!["n1"]);

        let view = board.note_view("n1", &User::new("u1")).unwrap();
        assert_eq!(view.id, "n1");
        assert_eq!(view.text.as_deref(), Some("hi"));
        assert_eq!(view.position, Some(Position::new(0.0, 0.0)));
        assert_eq!(view.author, Some(User::new("u1")));
        assert_eq!(view.color.as_deref(), Some("red"));
        assert_eq!(view.num_likes, 0);
        assert!(!view.did_i_like);
    }

    #[test]
    fn test_set_note_then_view() {
        on_both(set_note_then_view, set_note_then_view);
    }

    fn delete_keeps_keys<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note("n1", &note("n1", "hi")).unwrap();
        board.delete_note("n1").unwrap();

        assert!(board.note_ids().unwrap().is_empty());
        assert!(board.is_deleted("n1").unwrap());

        let view = board.note_view("n1", &User::new("u1")).unwrap();
        assert_eq!(view.text.as_deref(), Some("hi"));
        assert_eq!(view.color.as_deref(), Some("red"));
        assert!(view.position.is_some());
        assert!(view.author.is_some());
    }

    #[test]
    fn test_delete_keeps_keys() {
        on_both(delete_keeps_keys, delete_keeps_keys);
    }

    fn set_note_restores_deleted<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note("n1", &note("n1", "hi")).unwrap();
        board.delete_note("n1").unwrap();
        board.set_note("n1", &note("n1", "back")).unwrap();

        assert_eq!(board.note_ids().unwrap(), vec!["n1"]);
        assert!(!board.is_deleted("n1").unwrap());
    }

    #[test]
    fn test_set_note_restores_deleted() {
        on_both(set_note_restores_deleted, set_note_restores_deleted);
    }

    fn partial_writes_are_not_listed<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.move_note("n1", Position::new(5.0, 5.0)).unwrap();
        board.set_note_text("n1", "draft").unwrap();
        board.set_note_color("n1", "blue").unwrap();
        board
            .map_mut()
            .set(&keys::author("n1"), json!({"userId": "u1"}))
            .unwrap();

        assert!(board.is_complete("n1").unwrap());
        assert!(!board.is_deleted("n1").unwrap());
        assert!(board.note_ids().unwrap().is_empty());
    }

    #[test]
    fn test_partial_writes_are_not_listed() {
        on_both(partial_writes_are_not_listed, partial_writes_are_not_listed);
    }

    fn incomplete_note_not_listed<M: SharedMap>(board: &mut NoteBoard<M>) {
        board
            .map_mut()
            .set(&keys::presence("n1"), json!(1))
            .unwrap();
        board.move_note("n1", Position::new(1.0, 1.0)).unwrap();

        assert!(!board.is_complete("n1").unwrap());
        assert!(board.note_ids().unwrap().is_empty());

        let view = board.note_view("n1", &User::new("u1")).unwrap();
        assert!(view.author.is_none());
        assert!(view.text.is_none());
    }

    #[test]
    fn test_incomplete_note_not_listed() {
        on_both(incomplete_note_not_listed, incomplete_note_not_listed);
    }

    #[test]
    fn test_view_of_unknown_note_is_empty() {
        let board = memory_board();
        let view = board.note_view("nope", &User::new("u1")).unwrap();
        assert_eq!(view.id, "nope");
        assert!(view.text.is_none());
        assert!(view.position.is_none());
        assert!(view.author.is_none());
        assert!(view.color.is_none());
        assert_eq!(view.num_likes, 0);
    }

    #[test]
    fn test_undecodable_value_reads_as_none() {
        let mut board = memory_board();
        board.set_note("n1", &note("n1", "hi")).unwrap();
        board
            .map_mut()
            .set(&keys::position("n1"), json!("not a point"))
            .unwrap();

        let view = board.note_view("n1", &User::new("u1")).unwrap();
        assert!(view.position.is_none());
        // Still complete: the raw value is populated
        assert_eq!(board.note_ids().unwrap(), vec!["n1"]);
    }

    #[test]
    fn test_move_note_accepts_any_coordinates() {
        let mut board = memory_board();
        board.set_note("n1", &note("n1", "hi")).unwrap();
        board.move_note("n1", Position::new(-1e9, 42.5)).unwrap();

        let view = board.note_view("n1", &User::new("u1")).unwrap();
        assert_eq!(view.position, Some(Position::new(-1e9, 42.5)));
    }

    fn set_note_without_text_clears_text<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note_text("n1", "old").unwrap();
        let mut data = note("n1", "");
        data.text = None;
        board.set_note("n1", &data).unwrap();

        let view = board.note_view("n1", &User::new("u1")).unwrap();
        assert_eq!(view.text, data.text);
        assert_eq!(board.note_ids().unwrap(), vec!["n1"]);
        assert!(board.liked_notes().unwrap().is_empty());
    }

    #[test]
    fn test_set_note_without_text_clears_text() {
        on_both(set_note_without_text_clears_text, set_note_without_text_clears_text);
    }

    fn like_toggle<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note("n1", &note("n1", "hi")).unwrap();
        let u2 = User::new("u2");

        assert!(board.like_note("n1", &u2).unwrap());
        assert_eq!(board.note_liked_users("n1").unwrap(), vec![u2.clone()]);
        let view = board.note_view("n1", &u2).unwrap();
        assert_eq!(view.num_likes, 1);
        assert!(view.did_i_like);

        assert!(!board.like_note("n1", &u2).unwrap());
        assert!(board.note_liked_users("n1").unwrap().is_empty());
        assert_eq!(board.note_view("n1", &u2).unwrap().num_likes, 0);

        // The retracted key persists with a null value
        assert_eq!(
            board.map().get(&keys::vote("n1", "u2")).unwrap(),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_like_toggle() {
        on_both(like_toggle, like_toggle);
    }

    #[test]
    fn test_like_equality_is_by_value() {
        let mut board = memory_board();
        let first = User::new("u2").with_display_name("Bo");
        let same = User::new("u2").with_display_name("Bo");

        assert!(board.like_note("n1", &first).unwrap());
        assert!(!board.like_note("n1", &same).unwrap());

        // A different record for the same user replaces rather than retracts
        assert!(board.like_note("n1", &first).unwrap());
        let renamed = User::new("u2").with_display_name("Bob");
        assert!(board.like_note("n1", &renamed).unwrap());
        assert_eq!(board.note_liked_users("n1").unwrap(), vec![renamed]);
    }

    #[test]
    fn test_set_like_is_idempotent() {
        let mut board = memory_board();
        let u2 = User::new("u2");

        board.set_like("n1", &u2, true).unwrap();
        board.set_like("n1", &u2, true).unwrap();
        assert_eq!(board.note_liked_users("n1").unwrap().len(), 1);

        board.set_like("n1", &u2, false).unwrap();
        board.set_like("n1", &u2, false).unwrap();
        assert!(board.note_liked_users("n1").unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_likes_converge() {
        let mut doc1 = BoardDocument::new();
        let doc2 = doc1.fork();
        let mut board1 = NoteBoard::new(doc1);
        let mut board2 = NoteBoard::new(doc2);
        board1.set_note("n1", &note("n1", "hi")).unwrap();

        let u2 = User::new("u2");
        board1.set_like("n1", &u2, true).unwrap();
        board2.set_like("n1", &u2, true).unwrap();

        board1.map_mut().merge(board2.map_mut()).unwrap();
        assert_eq!(board1.note_liked_users("n1").unwrap(), vec![u2]);
    }

    fn likes_do_not_leak_across_prefixed_ids<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note("n1", &note("n1", "one")).unwrap();
        board.set_note("n10", &note("n10", "ten")).unwrap();
        board.like_note("n10", &User::new("u2")).unwrap();
        board.like_note("n1", &User::new("u3")).unwrap();

        assert_eq!(board.note_liked_users("n1").unwrap(), vec![User::new("u3")]);
        assert_eq!(
            board.note_liked_users("n10").unwrap(),
            vec![User::new("u2")]
        );
        assert!(!board.note_view("n1", &User::new("u2")).unwrap().did_i_like);
    }

    #[test]
    fn test_likes_do_not_leak_across_prefixed_ids() {
        on_both(
            likes_do_not_leak_across_prefixed_ids,
            likes_do_not_leak_across_prefixed_ids,
        );
    }

    #[test]
    fn test_likes_on_underscored_note_ids() {
        let mut board = memory_board();
        board.like_note("a_b", &User::new("u2")).unwrap();

        assert!(board.note_liked_users("a").unwrap().is_empty());
        assert_eq!(board.note_liked_users("a_b").unwrap().len(), 1);
    }

    fn did_i_like_matches_like_count<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note("a", &note("a", "alpha")).unwrap();
        board.set_note("a_b", &note("a_b", "bravo")).unwrap();
        // Key vote_a_b_u2, written for note "a" by user "b_u2"
        board.like_note("a", &User::new("b_u2")).unwrap();

        let view = board.note_view("a_b", &User::new("u2")).unwrap();
        assert_eq!(view.num_likes, 0);
        assert!(!view.did_i_like);

        let view = board.note_view("a", &User::new("b_u2")).unwrap();
        assert_eq!(view.num_likes, 1);
        assert!(view.did_i_like);

        // A value that is not a user record is not a like
        board
            .map_mut()
            .set(&keys::vote("a", "u3"), json!("yes"))
            .unwrap();
        let view = board.note_view("a", &User::new("u3")).unwrap();
        assert_eq!(view.num_likes, 1);
        assert!(!view.did_i_like);
    }

    #[test]
    fn test_did_i_like_on_underscored_ids() {
        on_both(did_i_like_matches_like_count, did_i_like_matches_like_count);
    }

    fn liked_notes_ranking<M: SharedMap>(board: &mut NoteBoard<M>) {
        board.set_note("a", &note("a", "alpha")).unwrap();
        board.set_note("b", &note("b", "bravo")).unwrap();
        board.set_note("c", &note("c", "charlie")).unwrap();

        for user in ["u1", "u2"] {
            board.like_note("a", &User::new(user)).unwrap();
        }
        for user in ["u1", "u2", "u3", "u4", "u5"] {
            board.like_note("b", &User::new(user)).unwrap();
        }
        board.like_note("c", &User::new("u1")).unwrap();

        let ranking = board.liked_notes().unwrap();
        let texts: Vec<&str> = ranking.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["bravo", "alpha", "charlie"]);
        assert_eq!(ranking[0].num_likes, 5);
        assert_eq!(ranking[0].color.as_deref(), Some("red"));
        assert_eq!(ranking[0].author, Some(User::new("u1")));
    }

    #[test]
    fn test_liked_notes_ranking() {
        on_both(liked_notes_ranking, liked_notes_ranking);
    }

    fn liked_notes_exclusions<M: SharedMap>(board: &mut NoteBoard<M>) {
        let mut untitled = note("blank", "");
        untitled.text = None;
        board.set_note("blank", &untitled).unwrap();
        board.set_note("empty", &note("empty", "")).unwrap();
        board.set_note("gone", &note("gone", "deleted")).unwrap();
        board.set_note("kept", &note("kept", "kept")).unwrap();

        for id in ["blank", "empty", "gone", "kept"] {
            board.like_note(id, &User::new("u1")).unwrap();
            board.like_note(id, &User::new("u2")).unwrap();
        }
        board.delete_note("gone").unwrap();
        board.set_note("unliked", &note("unliked", "nobody")).unwrap();

        let ranking = board.liked_notes().unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].text, "kept");
    }

    #[test]
    fn test_liked_notes_exclusions() {
        on_both(liked_notes_exclusions, liked_notes_exclusions);
    }

    #[test]
    fn test_liked_notes_ties_keep_enumeration_order() {
        let mut board = memory_board();
        for id in ["x", "y", "z"] {
            board.set_note(id, &note(id, id)).unwrap();
            board.like_note(id, &User::new("u1")).unwrap();
        }

        let texts: Vec<String> = board
            .liked_notes()
            .unwrap()
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(texts, vec!["x", "y", "z"]);
    }

    fn roster<M: SharedMap>(board: &mut NoteBoard<M>) {
        assert!(board.signed_in_user_ids().unwrap().is_empty());

        assert!(board.sign_in("u1").unwrap());
        assert!(!board.sign_in("u1").unwrap());
        assert!(board.sign_in("u2").unwrap());
        assert_eq!(board.signed_in_user_ids().unwrap(), vec!["u1", "u2"]);

        assert!(board.sign_out("u1").unwrap());
        assert!(!board.sign_out("u1").unwrap());
        assert_eq!(board.signed_in_user_ids().unwrap(), vec!["u2"]);
    }

    #[test]
    fn test_roster() {
        on_both(roster, roster);
    }

    #[test]
    fn test_roster_reads_dedupe() {
        let mut board = memory_board();
        board
            .map_mut()
            .set(keys::USER_IDS, json!(["u1", "u2", "u1"]))
            .unwrap();
        assert_eq!(board.signed_in_user_ids().unwrap(), vec!["u1", "u2"]);
        assert!(board.sign_out("u1").unwrap());
        assert_eq!(board.signed_in_user_ids().unwrap(), vec!["u2"]);
    }

    #[test]
    fn test_concurrent_sign_ins_merge() {
        let mut doc1 = BoardDocument::new();
        let doc2 = doc1.fork();
        let mut board1 = NoteBoard::new(doc1);
        let mut board2 = NoteBoard::new(doc2);

        board1.sign_in("u1").unwrap();
        board2.sign_in("u2").unwrap();
        board1.map_mut().merge(board2.map_mut()).unwrap();

        let mut ids = board1.signed_in_user_ids().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[test]
    fn test_subscribe_sees_local_and_remote_changes() {
        let mut board = memory_board();
        let seen: Rc<RefCell<Vec<(String, bool)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = board.subscribe(Box::new(move |change: &ValueChanged, local| {
            sink.borrow_mut().push((change.key.clone(), local));
        }));

        board.set_note_text("n1", "hi").unwrap();
        board.map_mut().apply_remote(&keys::color("n1"), json!("blue"));
        assert!(board.unsubscribe(subscription));
        board.delete_note("n1").unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![("text_n1".to_string(), true), ("color_n1".to_string(), false)]
        );
    }

    #[test]
    fn test_views_follow_merged_changes() {
        let mut doc1 = BoardDocument::new();
        let doc2 = doc1.fork();
        let mut board1 = NoteBoard::new(doc1);
        let mut board2 = NoteBoard::new(doc2);

        board2.set_note("n1", &note("n1", "remote")).unwrap();
        assert!(board1.note_ids().unwrap().is_empty());

        board1.map_mut().merge(board2.map_mut()).unwrap();
        assert_eq!(board1.note_ids().unwrap(), vec!["n1"]);

        board2.delete_note("n1").unwrap();
        board1.map_mut().merge(board2.map_mut()).unwrap();
        assert!(board1.note_ids().unwrap().is_empty());
    }

    #[test]
    fn test_note_views() {
        let mut board = memory_board();
        board.set_note("n1", &note("n1", "one")).unwrap();
        board.set_note("n2", &note("n2", "two")).unwrap();
        board.delete_note("n2").unwrap();

        let views = board.note_views(&User::new("u1")).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, "n1");
    }
}
