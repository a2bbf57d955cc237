//! Integration tests for the room state machine against the in-memory
//! store: full rounds, guards, and departures.

use std::sync::Arc;
use std::time::Duration;

use impostor_protocol::{
    Difficulty, ErrorKind, Player, PlayerId, Role, Room, RoomCode, RoomStatus,
};
use impostor_room::{Departure, GameError, RoomConfig, RoomCoordinator, TieBreak, VotePolicy};
use impostor_store::{MemoryStore, SessionStore};
use impostor_words::{OracleError, ResilientOracle, WordOracle};

// =========================================================================
// Helpers
// =========================================================================

/// An oracle that always answers with the same word.
struct FixedWord(&'static str);

impl WordOracle for FixedWord {
    async fn fetch_word(&self, _: &str, _: Difficulty) -> Result<String, OracleError> {
        Ok(self.0.to_string())
    }
}

/// An oracle that takes a while to answer, long enough for other
/// intents to land while a round is being started.
struct SlowWord(Duration);

impl WordOracle for SlowWord {
    async fn fetch_word(&self, _: &str, _: Difficulty) -> Result<String, OracleError> {
        tokio::time::sleep(self.0).await;
        Ok("Koala".to_string())
    }
}

type Coordinator = RoomCoordinator<MemoryStore, FixedWord>;

/// First speaker is always roster index 0.
fn fixed_order() -> RoomConfig {
    RoomConfig {
        random_first_speaker: false,
        ..RoomConfig::default()
    }
}

fn coordinator(config: RoomConfig) -> Coordinator {
    RoomCoordinator::new(
        Arc::new(MemoryStore::new()),
        ResilientOracle::new(FixedWord("Panda")),
        config,
    )
}

fn slow_coordinator() -> Arc<RoomCoordinator<MemoryStore, SlowWord>> {
    Arc::new(RoomCoordinator::new(
        Arc::new(MemoryStore::new()),
        ResilientOracle::new(SlowWord(Duration::from_millis(200))),
        fixed_order(),
    ))
}

/// Opens a room hosted by `names[0]` and joins everyone else by code.
async fn room_with<O: WordOracle>(
    c: &RoomCoordinator<MemoryStore, O>,
    names: &[&str],
) -> (Room, Vec<Player>) {
    let (room, host) = c.open_room(names[0], None).await.unwrap();
    let mut players = vec![host];
    for name in &names[1..] {
        let (_, player) = c.join_room(room.code.as_str(), name, None).await.unwrap();
        players.push(player);
    }
    (room, players)
}

/// Plays a room from `LOBBY` to `VOTING`, every speaker in turn.
async fn play_to_voting(c: &Coordinator, room: &Room, host: PlayerId) {
    c.start_round(room.id, host, "Animales", Difficulty::Easy, 1)
        .await
        .unwrap();
    c.advance_phase(room.id, host, RoomStatus::Gameplay)
        .await
        .unwrap();
    loop {
        let snap = c.snapshot(room.id).await.unwrap();
        let Some(speaker) = snap.current_speaker() else {
            break;
        };
        c.submit_turn(room.id, speaker.id, "una pista").await.unwrap();
    }
}

// =========================================================================
// End-to-end
// =========================================================================

#[tokio::test]
async fn test_full_round_abc123() {
    let store = Arc::new(MemoryStore::new());
    let c = RoomCoordinator::new(
        Arc::clone(&store),
        ResilientOracle::new(FixedWord("Panda")),
        fixed_order(),
    );

    // Three players join room ABC123.
    let room = store
        .create_room(RoomCode::parse("ABC123").unwrap())
        .await
        .unwrap();
    let ana = c.add_player(room.id, "Ana", None, true).await.unwrap();
    let (_, beto) = c.join_room("abc123", "Beto", None).await.unwrap();
    let (_, caro) = c.join_room(" ABC123 ", "Caro", None).await.unwrap();

    // Host starts with one impostor.
    let started = c
        .start_round(room.id, ana.id, "Animales", Difficulty::Easy, 1)
        .await
        .unwrap();
    assert_eq!(started.status, RoomStatus::RoleReveal);
    assert_eq!(started.secret_word.as_deref(), Some("Panda"));
    assert_eq!(started.current_turn_index, 0);

    let snap = c.snapshot(room.id).await.unwrap();
    let impostors = snap.players.iter().filter(|p| p.is_impostor()).count();
    assert_eq!(impostors, 1);
    assert!(snap.players.iter().all(|p| p.role.is_some()));

    c.advance_phase(room.id, ana.id, RoomStatus::Gameplay)
        .await
        .unwrap();

    // Everyone speaks once, in roster order.
    let after_ana = c.submit_turn(room.id, ana.id, "blanco y negro").await.unwrap();
    assert_eq!(after_ana.status, RoomStatus::Gameplay);
    assert_eq!(after_ana.current_turn_index, 1);

    let after_beto = c.submit_turn(room.id, beto.id, "come bambú").await.unwrap();
    assert_eq!(after_beto.current_turn_index, 2);

    let after_caro = c.submit_turn(room.id, caro.id, "vive en China").await.unwrap();
    assert_eq!(after_caro.status, RoomStatus::Voting);
    assert!(after_caro.current_turn_index <= 2);

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.messages.len(), 3);
    assert_eq!(snap.messages[0].player_name, "Ana");

    // Caro gets two votes.
    let r = c.cast_vote(room.id, ana.id, caro.id).await.unwrap();
    assert_eq!(r.status, RoomStatus::Voting);
    c.cast_vote(room.id, beto.id, caro.id).await.unwrap();
    let revealed = c.cast_vote(room.id, caro.id, ana.id).await.unwrap();

    assert_eq!(revealed.status, RoomStatus::Reveal);
    let outcome = revealed.outcome.expect("reveal carries an outcome");
    assert_eq!(outcome.eliminated, Some(caro.id));
    assert_eq!(outcome.secret_word, "Panda");

    let snap = c.snapshot(room.id).await.unwrap();
    let caro_role = snap.player(caro.id).unwrap().role;
    assert_eq!(outcome.caught, caro_role == Some(Role::Impostor));
    assert_eq!(snap.player(caro.id).unwrap().votes, 2);
}

#[tokio::test]
async fn test_random_first_speaker_lap_visits_everyone_once() {
    let c = coordinator(RoomConfig::default());
    let (room, players) = room_with(&c, &["a", "b", "c", "d"]).await;
    let host = players[0].id;

    c.start_round(room.id, host, "Comida", Difficulty::Medium, 1)
        .await
        .unwrap();
    c.advance_phase(room.id, host, RoomStatus::Gameplay)
        .await
        .unwrap();
    let start = c.snapshot(room.id).await.unwrap().room.turn_start_index;

    let mut spoken = Vec::new();
    loop {
        let snap = c.snapshot(room.id).await.unwrap();
        let Some(speaker) = snap.current_speaker() else {
            break;
        };
        spoken.push(snap.room.current_turn_index);
        c.submit_turn(room.id, speaker.id, "pista").await.unwrap();
    }

    assert_eq!(spoken[0], start);
    let mut sorted = spoken.clone();
    sorted.sort();
    assert_eq!(sorted, vec![0, 1, 2, 3]);
    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.room.status, RoomStatus::Voting);
}

#[tokio::test]
async fn test_reset_clears_round_and_keeps_identity() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["Ana", "Beto", "Caro"]).await;
    let host = players[0].id;
    play_to_voting(&c, &room, host).await;
    c.advance_phase(room.id, host, RoomStatus::Reveal)
        .await
        .unwrap();

    let reset = c.reset_room(room.id, host).await.unwrap();

    assert_eq!(reset.status, RoomStatus::Lobby);
    assert_eq!(reset.code, room.code);
    assert!(reset.secret_word.is_none());
    assert!(reset.outcome.is_none());
    assert_eq!(reset.current_turn_index, 0);

    let snap = c.snapshot(room.id).await.unwrap();
    assert!(snap.messages.is_empty(), "next round starts with no messages");
    for (before, after) in players.iter().zip(&snap.players) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.name, after.name);
        assert_eq!(after.role, None);
        assert_eq!(after.votes, 0);
        assert_eq!(after.voted_for, None);
    }
}

#[tokio::test]
async fn test_second_round_gets_new_round_number() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;
    let host = players[0].id;
    play_to_voting(&c, &room, host).await;
    c.advance_phase(room.id, host, RoomStatus::Reveal).await.unwrap();
    c.advance_phase(room.id, host, RoomStatus::Lobby).await.unwrap();

    let second = c
        .advance_phase(room.id, host, RoomStatus::RoleReveal)
        .await
        .unwrap();
    assert_eq!(second.round, 2);
    assert_eq!(second.theme.as_deref(), Some("Animales"));
}

// =========================================================================
// Guards
// =========================================================================

#[tokio::test]
async fn test_advance_phase_unreachable_target_is_invalid_transition() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;
    let before = c.snapshot(room.id).await.unwrap();

    let result = c
        .advance_phase(room.id, players[0].id, RoomStatus::Reveal)
        .await;

    assert!(matches!(
        result,
        Err(GameError::InvalidTransition {
            from: RoomStatus::Lobby,
            to: RoomStatus::Reveal,
            ..
        })
    ));
    assert_eq!(c.snapshot(room.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_start_round_by_non_host_is_permission_denied() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;

    let result = c
        .start_round(room.id, players[1].id, "Animales", Difficulty::Easy, 1)
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(
        c.snapshot(room.id).await.unwrap().room.status,
        RoomStatus::Lobby
    );
}

#[tokio::test]
async fn test_start_round_twice_second_is_invalid_transition() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;
    let host = players[0].id;

    c.start_round(room.id, host, "Deportes", Difficulty::Hard, 1)
        .await
        .unwrap();
    let again = c
        .start_round(room.id, host, "Deportes", Difficulty::Hard, 1)
        .await;

    let err = again.unwrap_err();
    assert!(err.is_silent());
}

#[tokio::test]
async fn test_racing_start_round_only_one_wins() {
    let c = Arc::new(coordinator(fixed_order()));
    let (room, players) = room_with(&*c, &["a", "b", "c"]).await;
    let host = players[0].id;
    let room_id = room.id;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&c);
            tokio::spawn(async move {
                c.start_round(room_id, host, "Comida", Difficulty::Easy, 1)
                    .await
            })
        })
        .collect();

    let mut wins = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => wins += 1,
            Err(err) => assert!(err.is_silent(), "loser got {err}"),
        }
    }
    assert_eq!(wins, 1);
    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.room.round, 1);
    assert_eq!(snap.players.iter().filter(|p| p.is_impostor()).count(), 1);
}

#[tokio::test]
async fn test_join_while_word_is_fetched_gets_a_role() {
    let c = slow_coordinator();
    let (room, players) = room_with(&*c, &["a", "b", "c"]).await;
    let host = players[0].id;

    let start = {
        let c = Arc::clone(&c);
        tokio::spawn(async move {
            c.start_round(room.id, host, "Animales", Difficulty::Easy, 1)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (_, late) = c.join_room(room.code.as_str(), "tarde", None).await.unwrap();

    let started = start.await.unwrap().unwrap();
    assert_eq!(started.status, RoomStatus::RoleReveal);
    assert_eq!(started.round, 1);

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.players.len(), 4);
    assert!(snap.players.iter().all(|p| p.role.is_some()));
    assert!(snap.player(late.id).unwrap().role.is_some());
    assert_eq!(snap.players.iter().filter(|p| p.is_impostor()).count(), 1);
}

#[tokio::test]
async fn test_leave_while_word_is_fetched_stays_removed() {
    let c = slow_coordinator();
    let (room, players) = room_with(&*c, &["a", "b", "c"]).await;
    let host = players[0].id;

    let start = {
        let c = Arc::clone(&c);
        tokio::spawn(async move {
            c.start_round(room.id, host, "Animales", Difficulty::Easy, 1)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let left = c.leave_room(room.id, players[2].id).await.unwrap();
    assert_eq!(left, Departure::Removed);

    start.await.unwrap().unwrap();

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.players.len(), 2);
    assert!(snap.player(players[2].id).is_none());
    assert!(snap.players.iter().all(|p| p.role.is_some()));
}

#[tokio::test]
async fn test_submit_turn_wrong_player_is_not_your_turn() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;
    let host = players[0].id;
    c.start_round(room.id, host, "Animales", Difficulty::Easy, 1)
        .await
        .unwrap();
    c.advance_phase(room.id, host, RoomStatus::Gameplay)
        .await
        .unwrap();

    let result = c.submit_turn(room.id, players[2].id, "me adelanto").await;

    assert!(matches!(
        result,
        Err(GameError::NotYourTurn { expected, .. }) if expected == host
    ));
    let snap = c.snapshot(room.id).await.unwrap();
    assert!(snap.messages.is_empty());
    assert_eq!(snap.room.current_turn_index, 0);
}

#[tokio::test]
async fn test_submit_turn_empty_text_rejected() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b"]).await;
    let host = players[0].id;
    c.start_round(room.id, host, "Animales", Difficulty::Easy, 1)
        .await
        .unwrap();
    c.advance_phase(room.id, host, RoomStatus::Gameplay)
        .await
        .unwrap();

    let result = c.submit_turn(room.id, host, "   ").await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_start_round_alone_is_not_enough_players() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["solo"]).await;

    let result = c
        .start_round(room.id, players[0].id, "Random", Difficulty::Easy, 1)
        .await;
    assert!(matches!(
        result,
        Err(GameError::NotEnoughPlayers { have: 1, need: 2 })
    ));
}

#[tokio::test]
async fn test_start_round_all_impostors_rejected() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;

    let result = c
        .start_round(room.id, players[0].id, "Random", Difficulty::Easy, 3)
        .await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidImpostorCount);
}

#[tokio::test]
async fn test_join_room_unknown_code_is_not_found() {
    let c = coordinator(fixed_order());
    let result = c.join_room("ZZZ999", "Ana", None).await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_join_room_mid_round_rejected() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b"]).await;
    c.start_round(room.id, players[0].id, "Random", Difficulty::Easy, 1)
        .await
        .unwrap();

    let result = c.join_room(room.code.as_str(), "tarde", None).await;
    assert!(matches!(result, Err(GameError::WrongPhase { .. })));
}

#[tokio::test]
async fn test_join_room_full() {
    let c = coordinator(RoomConfig {
        max_players: 3,
        ..fixed_order()
    });
    let (room, _) = room_with(&c, &["a", "b", "c"]).await;

    let result = c.join_room(room.code.as_str(), "d", None).await;
    assert!(matches!(result, Err(GameError::RoomFull { max: 3, .. })));
}

#[tokio::test]
async fn test_exactly_one_host_per_room() {
    let c = coordinator(fixed_order());
    let (room, _) = room_with(&c, &["a", "b", "c"]).await;

    let second_host = c.add_player(room.id, "usurpador", None, true).await;
    assert_eq!(second_host.unwrap_err().kind(), ErrorKind::InvalidInput);

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.players.iter().filter(|p| p.is_host).count(), 1);
}

// =========================================================================
// Voting
// =========================================================================

#[tokio::test]
async fn test_cast_vote_self_and_double_rejected() {
    let c = coordinator(fixed_order());
    let (room, players) = room_with(&c, &["a", "b", "c"]).await;
    play_to_voting(&c, &room, players[0].id).await;

    let own = c.cast_vote(room.id, players[1].id, players[1].id).await;
    assert_eq!(own.unwrap_err().kind(), ErrorKind::InvalidVote);

    c.cast_vote(room.id, players[1].id, players[2].id)
        .await
        .unwrap();
    let twice = c.cast_vote(room.id, players[1].id, players[0].id).await;
    assert_eq!(twice.unwrap_err().kind(), ErrorKind::AlreadyVoted);
}

#[tokio::test]
async fn test_tie_with_no_elimination_policy() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;
    play_to_voting(&c, &room, p[0].id).await;

    c.cast_vote(room.id, p[0].id, p[1].id).await.unwrap();
    c.cast_vote(room.id, p[1].id, p[2].id).await.unwrap();
    let revealed = c.cast_vote(room.id, p[2].id, p[0].id).await.unwrap();

    let outcome = revealed.outcome.unwrap();
    assert_eq!(outcome.eliminated, None);
    assert!(!outcome.caught);
}

#[tokio::test]
async fn test_tie_with_earliest_joined_policy() {
    let c = coordinator(RoomConfig {
        tie_break: TieBreak::EarliestJoined,
        ..fixed_order()
    });
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;
    play_to_voting(&c, &room, p[0].id).await;

    // One vote each: a three-way tie.
    c.cast_vote(room.id, p[0].id, p[1].id).await.unwrap();
    c.cast_vote(room.id, p[1].id, p[2].id).await.unwrap();
    c.cast_vote(room.id, p[2].id, p[0].id).await.unwrap();

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.room.outcome.unwrap().eliminated, Some(p[0].id));
}

#[tokio::test]
async fn test_host_decides_policy_refuses_ballots() {
    let c = coordinator(RoomConfig {
        vote_policy: VotePolicy::HostDecides,
        ..fixed_order()
    });
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;
    play_to_voting(&c, &room, p[0].id).await;

    let ballot = c.cast_vote(room.id, p[1].id, p[2].id).await;
    assert_eq!(ballot.unwrap_err().kind(), ErrorKind::InvalidVote);

    let not_host = c.eliminate(room.id, p[1].id, p[2].id).await;
    assert_eq!(not_host.unwrap_err().kind(), ErrorKind::PermissionDenied);

    let revealed = c.eliminate(room.id, p[0].id, p[2].id).await.unwrap();
    assert_eq!(revealed.status, RoomStatus::Reveal);
    let snap = c.snapshot(room.id).await.unwrap();
    let outcome = snap.room.outcome.as_ref().unwrap();
    assert_eq!(outcome.eliminated, Some(p[2].id));
    assert_eq!(outcome.caught, snap.player(p[2].id).unwrap().is_impostor());
}

#[tokio::test]
async fn test_host_forces_reveal_before_all_voted() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;
    play_to_voting(&c, &room, p[0].id).await;
    c.cast_vote(room.id, p[1].id, p[2].id).await.unwrap();

    let revealed = c
        .advance_phase(room.id, p[0].id, RoomStatus::Reveal)
        .await
        .unwrap();
    assert_eq!(revealed.outcome.unwrap().eliminated, Some(p[2].id));
}

#[tokio::test]
async fn test_ballot_after_forced_reveal_is_rejected() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;
    play_to_voting(&c, &room, p[0].id).await;
    c.cast_vote(room.id, p[1].id, p[2].id).await.unwrap();
    c.advance_phase(room.id, p[0].id, RoomStatus::Reveal)
        .await
        .unwrap();
    let before = c.snapshot(room.id).await.unwrap();

    let late = c.cast_vote(room.id, p[2].id, p[0].id).await;

    let err = late.unwrap_err();
    assert!(matches!(err, GameError::WrongPhase { status: RoomStatus::Reveal, .. }));
    assert!(err.is_silent());
    let after = c.snapshot(room.id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.player(p[0].id).unwrap().votes, 0);
    assert_eq!(after.player(p[2].id).unwrap().voted_for, None);
}

#[tokio::test]
async fn test_ballots_racing_forced_reveal_match_the_outcome() {
    let c = Arc::new(coordinator(fixed_order()));
    let (room, p) = room_with(&*c, &["a", "b", "c", "d"]).await;
    let host = p[0].id;
    let suspect = p[1].id;
    play_to_voting(&c, &room, host).await;

    // The suspect never votes, so only the host's reveal ends the vote.
    let ballots: Vec<_> = [p[0].id, p[2].id, p[3].id]
        .into_iter()
        .map(|voter| {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.cast_vote(room.id, voter, suspect).await })
        })
        .collect();
    let reveal = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.advance_phase(room.id, host, RoomStatus::Reveal).await })
    };

    let mut counted = 0;
    for ballot in ballots {
        match ballot.await.unwrap() {
            Ok(_) => counted += 1,
            Err(err) => assert!(err.is_silent(), "ballot got {err}"),
        }
    }
    if let Err(err) = reveal.await.unwrap() {
        assert!(err.is_silent(), "reveal got {err}");
    }
    if c.room(room.id).await.unwrap().status == RoomStatus::Voting {
        c.advance_phase(room.id, host, RoomStatus::Reveal)
            .await
            .unwrap();
    }

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.room.status, RoomStatus::Reveal);
    assert_eq!(snap.player(suspect).unwrap().votes, counted);
    let expected = (counted > 0).then_some(suspect);
    assert_eq!(snap.room.outcome.unwrap().eliminated, expected);
}

// =========================================================================
// Departures
// =========================================================================

#[tokio::test]
async fn test_leave_lobby_removes_player() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;

    let left = c.leave_room(room.id, p[1].id).await.unwrap();
    assert_eq!(left, Departure::Removed);
    assert_eq!(c.snapshot(room.id).await.unwrap().players.len(), 2);
}

#[tokio::test]
async fn test_host_leaving_closes_room() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;

    let left = c.leave_room(room.id, p[0].id).await.unwrap();
    assert_eq!(left, Departure::RoomClosed);
    let gone = c.snapshot(room.id).await;
    assert_eq!(gone.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_speaker_leaving_passes_turn_on() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;
    let host = p[0].id;
    c.start_round(room.id, host, "Animales", Difficulty::Easy, 1)
        .await
        .unwrap();
    c.advance_phase(room.id, host, RoomStatus::Gameplay)
        .await
        .unwrap();
    c.submit_turn(room.id, host, "pista").await.unwrap();

    // It's b's turn; b leaves.
    let left = c.leave_room(room.id, p[1].id).await.unwrap();
    assert_eq!(left, Departure::Departed);

    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.room.current_turn_index, 2);
    assert!(snap.player(p[1].id).unwrap().departed);

    // c closes the lap.
    let after = c.submit_turn(room.id, p[2].id, "pista").await.unwrap();
    assert_eq!(after.status, RoomStatus::Voting);

    // Only present players need to vote.
    c.cast_vote(room.id, host, p[2].id).await.unwrap();
    let revealed = c.cast_vote(room.id, p[2].id, host).await.unwrap();
    assert_eq!(revealed.status, RoomStatus::Reveal);

    // The departed player is gone after the reset.
    c.reset_room(room.id, host).await.unwrap();
    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.players.len(), 2);
    assert!(snap.player(p[1].id).is_none());
}

#[tokio::test]
async fn test_departed_player_cannot_vote() {
    let c = coordinator(fixed_order());
    let (room, p) = room_with(&c, &["a", "b", "c", "d"]).await;
    play_to_voting(&c, &room, p[0].id).await;
    c.leave_room(room.id, p[3].id).await.unwrap();

    let result = c.cast_vote(room.id, p[3].id, p[1].id).await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::NotInRoom);
}

// =========================================================================
// Listing and outages
// =========================================================================

#[tokio::test]
async fn test_list_open_rooms_only_lobby() {
    let c = coordinator(fixed_order());
    let (open, _) = room_with(&c, &["a", "b"]).await;
    let (busy, busy_players) = room_with(&c, &["c", "d"]).await;
    c.start_round(busy.id, busy_players[0].id, "Random", Difficulty::Easy, 1)
        .await
        .unwrap();

    let rooms = c.list_open_rooms().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id, open.id);
    assert_eq!(rooms[0].player_count, 2);
    assert_eq!(rooms[0].max_players, 8);
}

#[tokio::test]
async fn test_store_outage_fails_closed() {
    let store = Arc::new(MemoryStore::new());
    let c = RoomCoordinator::new(
        Arc::clone(&store),
        ResilientOracle::new(FixedWord("Panda")),
        fixed_order(),
    );
    let (room, p) = room_with(&c, &["a", "b", "c"]).await;

    store.set_offline(true);
    let result = c
        .start_round(room.id, p[0].id, "Animales", Difficulty::Easy, 1)
        .await;
    assert_eq!(result.unwrap_err().kind(), ErrorKind::StoreUnavailable);

    store.set_offline(false);
    let snap = c.snapshot(room.id).await.unwrap();
    assert_eq!(snap.room.status, RoomStatus::Lobby);
    assert!(snap.players.iter().all(|p| p.role.is_none()));
}
