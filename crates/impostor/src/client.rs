//! Presentation adapter.
//!
//! Rendering is not this crate's job, but deciding *what* to render is:
//! which screen a client is on follows from the room snapshots it
//! receives, and so do the little sounds the original game plays on phase
//! changes and new descriptions. [`ScreenRouter`] derives both from
//! consecutive snapshots; the sounds go out through an injected
//! [`CuePlayer`] so tests and headless clients can swap in their own.

use impostor_protocol::{ErrorBody, ErrorKind, RoomSnapshot, RoomStatus};
use impostor_session::{Resumed, Screen};

/// A short sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Any button press.
    Click,
    /// Joined a room.
    Success,
    /// Something went wrong, or the room was closed.
    Alert,
    /// Moved to another phase.
    Swoosh,
    /// The Impostors are revealed.
    Reveal,
    /// Someone described the word.
    Turn,
}

/// Plays [`Cue`]s. Must not block; audio is fire-and-forget.
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue);
}

/// A [`CuePlayer`] that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Muted;

impl CuePlayer for Muted {
    fn play(&self, _cue: Cue) {}
}

impl<P: CuePlayer + ?Sized> CuePlayer for &P {
    fn play(&self, cue: Cue) {
        (**self).play(cue);
    }
}

/// Tracks the screen a client should show.
pub struct ScreenRouter<P> {
    cues: P,
    screen: Screen,
    status: Option<RoomStatus>,
    round: u32,
    messages_seen: usize,
}

impl<P: CuePlayer> ScreenRouter<P> {
    /// Starts at mode selection, outside any room.
    pub fn new(cues: P) -> Self {
        Self {
            cues,
            screen: Screen::ModeSelection,
            status: None,
            round: 0,
            messages_seen: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn cues(&self) -> &P {
        &self.cues
    }

    /// A button was pressed.
    pub fn click(&self) {
        self.cues.play(Cue::Click);
    }

    /// The user picked online or local play and is entering names or a
    /// room code.
    pub fn setup(&mut self) -> Screen {
        self.cues.play(Cue::Click);
        self.screen = Screen::Setup;
        self.screen
    }

    /// Applies a new snapshot of the current room.
    ///
    /// The first snapshot after entering a room plays `Success`. A phase
    /// change plays `Swoosh`, or `Reveal` when entering `REVEAL`. A new
    /// description within the same phase plays `Turn`.
    pub fn observe(&mut self, snapshot: &RoomSnapshot) -> Screen {
        let status = snapshot.room.status;
        let round = snapshot.room.round;

        match self.status {
            None => self.cues.play(Cue::Success),
            Some(previous) if previous != status => self.cues.play(match status {
                RoomStatus::Reveal => Cue::Reveal,
                _ => Cue::Swoosh,
            }),
            Some(_) if round == self.round && snapshot.messages.len() > self.messages_seen => {
                self.cues.play(Cue::Turn);
            }
            Some(_) => {}
        }

        self.status = Some(status);
        self.round = round;
        self.messages_seen = snapshot.messages.len();
        self.screen = Screen::for_status(status);
        self.screen
    }

    /// Lands on the screen of a recovered session.
    pub fn resume(&mut self, resumed: &Resumed) -> Screen {
        self.observe(&resumed.snapshot)
    }

    /// An intent was rejected. Stale intents are silently ignored; the
    /// next snapshot resynchronizes the client.
    pub fn rejected(&self, error: &ErrorBody) {
        if error.kind != ErrorKind::InvalidTransition {
            self.cues.play(Cue::Alert);
        }
    }

    /// The player left the room on purpose.
    pub fn left(&mut self) -> Screen {
        self.exit()
    }

    /// The room was closed under the player (the host left).
    pub fn room_closed(&mut self) -> Screen {
        self.cues.play(Cue::Alert);
        self.exit()
    }

    fn exit(&mut self) -> Screen {
        self.status = None;
        self.round = 0;
        self.messages_seen = 0;
        self.screen = Screen::ModeSelection;
        self.screen
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use impostor_protocol::{
        Difficulty, Message, MessageId, PlayerId, Room, RoomCode, RoomId,
    };

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Cue>>);

    impl CuePlayer for Recorder {
        fn play(&self, cue: Cue) {
            self.0.lock().unwrap().push(cue);
        }
    }

    impl Recorder {
        fn take(&self) -> Vec<Cue> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn snapshot(status: RoomStatus, round: u32, messages: usize) -> RoomSnapshot {
        let room_id = RoomId(1);
        RoomSnapshot {
            room: Room {
                id: room_id,
                code: RoomCode::parse("ABC123").unwrap(),
                status,
                secret_word: None,
                current_turn_index: 0,
                turn_start_index: 0,
                theme: None,
                difficulty: Difficulty::Easy,
                round,
                outcome: None,
                created_at: 0,
                revision: 0,
            },
            players: Vec::new(),
            messages: (0..messages)
                .map(|i| Message {
                    id: MessageId(i as u64),
                    room_id,
                    player_id: PlayerId(1),
                    player_name: "Ana".into(),
                    text: "pista".into(),
                    round,
                    created_at: i as u64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_observe_first_snapshot_plays_success() {
        let rec = Recorder::default();
        let mut router = ScreenRouter::new(&rec);

        assert_eq!(router.observe(&snapshot(RoomStatus::Lobby, 0, 0)), Screen::Lobby);
        assert_eq!(rec.take(), vec![Cue::Success]);
    }

    #[test]
    fn test_observe_phase_change_plays_swoosh() {
        let rec = Recorder::default();
        let mut router = ScreenRouter::new(&rec);
        router.observe(&snapshot(RoomStatus::Lobby, 0, 0));
        rec.take();

        let screen = router.observe(&snapshot(RoomStatus::RoleReveal, 1, 0));

        assert_eq!(screen, Screen::RoleReveal);
        assert_eq!(rec.take(), vec![Cue::Swoosh]);
    }

    #[test]
    fn test_observe_new_message_plays_turn() {
        let rec = Recorder::default();
        let mut router = ScreenRouter::new(&rec);
        router.observe(&snapshot(RoomStatus::Gameplay, 1, 0));
        rec.take();

        router.observe(&snapshot(RoomStatus::Gameplay, 1, 1));
        router.observe(&snapshot(RoomStatus::Gameplay, 1, 1));

        assert_eq!(rec.take(), vec![Cue::Turn]);
    }

    #[test]
    fn test_observe_reveal_plays_reveal() {
        let rec = Recorder::default();
        let mut router = ScreenRouter::new(&rec);
        router.observe(&snapshot(RoomStatus::Voting, 1, 3));
        rec.take();

        assert_eq!(router.observe(&snapshot(RoomStatus::Reveal, 1, 3)), Screen::Reveal);
        assert_eq!(rec.take(), vec![Cue::Reveal]);
    }

    #[test]
    fn test_rejected_stale_intent_is_silent() {
        let rec = Recorder::default();
        let router = ScreenRouter::new(&rec);

        router.rejected(&ErrorBody {
            kind: ErrorKind::InvalidTransition,
            message: "already started".into(),
        });
        router.rejected(&ErrorBody {
            kind: ErrorKind::NotYourTurn,
            message: "wait".into(),
        });

        assert_eq!(rec.take(), vec![Cue::Alert]);
    }

    #[test]
    fn test_room_closed_returns_to_mode_selection() {
        let rec = Recorder::default();
        let mut router = ScreenRouter::new(&rec);
        router.observe(&snapshot(RoomStatus::Gameplay, 1, 0));

        assert_eq!(router.room_closed(), Screen::ModeSelection);
        // Entering a room again is a fresh entry.
        rec.take();
        router.observe(&snapshot(RoomStatus::Lobby, 0, 0));
        assert_eq!(rec.take(), vec![Cue::Success]);
    }
}
