//! Per-connection handler: handshake, intent dispatch, and snapshot push.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version → send HandshakeAck
//!   2. Loop, waiting on two things at once:
//!      - the next client frame (heartbeat, intent, disconnect)
//!      - the next snapshot of the bound room, once the connection is
//!        bound by `CreateRoom`, `JoinRoom`, or `Resume`
//!
//! Every intent gets exactly one `Reply`. Snapshots are pushed separately
//! and are always redacted for the bound player, so a client never sees
//! another player's role, or the secret word if it is the Impostor,
//! before `REVEAL`.
//!
//! `Resume` binds only with the resume token handed out in the `Joined`
//! reply of the original create or join.

use std::sync::Arc;
use std::time::Instant;

use impostor_protocol::{
    ClientMessage, Codec, Envelope, Intent, Outcome, PlayerId, ProtocolError, Reply, Room, RoomId,
    RoomSnapshot, RoomStatus, ServerMessage,
};
use impostor_room::{GameError, RoomFeed};
use impostor_store::SessionStore;
use impostor_transport::{Connection, WebSocketConnection};
use impostor_words::WordOracle;

use crate::ImpostorError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// The room and player a connection acts as.
struct Binding {
    room_id: RoomId,
    player_id: PlayerId,
    feed: RoomFeed,
}

/// Outgoing side of a connection: stamps every frame with a sequence
/// number and the time since the connection opened.
struct Link {
    conn: WebSocketConnection,
    seq: u64,
    start: Instant,
}

impl Link {
    async fn send<C: Codec>(&mut self, codec: &C, payload: ServerMessage) -> Result<(), ImpostorError> {
        let envelope = Envelope::new(self.seq, self.now(), payload);
        self.seq += 1;
        let bytes = codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn send_error<C: Codec>(
        &mut self,
        codec: &C,
        code: u16,
        message: impl Into<String>,
    ) -> Result<(), ImpostorError> {
        let payload = ServerMessage::Error {
            code,
            message: message.into(),
        };
        self.send(codec, payload).await
    }

    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, O, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, O, C>>,
) -> Result<(), ImpostorError>
where
    S: SessionStore,
    O: WordOracle,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let mut link = Link {
        conn,
        seq: 0,
        start: Instant::now(),
    };
    let result = serve(&mut link, &state).await;
    if let Err(e) = link.conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after session end failed");
    }
    result
}

async fn serve<S, O, C>(link: &mut Link, state: &ServerState<S, O, C>) -> Result<(), ImpostorError>
where
    S: SessionStore,
    O: WordOracle,
    C: Codec,
{
    let conn_id = link.conn.id();
    perform_handshake(link, state).await?;
    tracing::debug!(%conn_id, "handshake complete");

    let mut binding: Option<Binding> = None;
    let mut deadline = tokio::time::Instant::now() + state.idle_timeout;

    loop {
        tokio::select! {
            frame = tokio::time::timeout_at(deadline, link.conn.recv()) => {
                let data = match frame {
                    Ok(Ok(Some(data))) => data,
                    Ok(Ok(None)) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Ok(Err(e)) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                    Err(_) => {
                        tracing::info!(%conn_id, "connection idle, closing");
                        break;
                    }
                };
                deadline = tokio::time::Instant::now() + state.idle_timeout;

                let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode frame");
                        link.send_error(&state.codec, 400, format!("undecodable frame: {e}")).await?;
                        continue;
                    }
                };

                match envelope.payload {
                    ClientMessage::Heartbeat { client_time } => {
                        let ack = ServerMessage::HeartbeatAck {
                            client_time,
                            server_time: link.now(),
                        };
                        link.send(&state.codec, ack).await?;
                    }
                    ClientMessage::Intent { request_id, intent } => {
                        let outcome = handle_intent(state, &mut binding, intent).await;
                        link.send(&state.codec, ServerMessage::Reply { request_id, outcome }).await?;
                    }
                    ClientMessage::Disconnect { reason } => {
                        tracing::info!(%conn_id, %reason, "client disconnected");
                        break;
                    }
                    ClientMessage::Handshake { .. } => {
                        link.send_error(&state.codec, 400, "already handshaken").await?;
                    }
                }
            }
            update = next_update(&mut binding) => {
                let Some(bound) = binding.as_ref() else {
                    continue;
                };
                match update {
                    Some(snapshot) => {
                        let snapshot = snapshot.redacted_for(bound.player_id);
                        link.send(&state.codec, ServerMessage::Snapshot { snapshot }).await?;
                    }
                    None => {
                        let room_id = bound.room_id;
                        tracing::info!(%conn_id, %room_id, "bound room closed");
                        binding = None;
                        link.send(&state.codec, ServerMessage::RoomClosed { room_id }).await?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Waits for the bound room's next snapshot; never resolves while
/// unbound. `None` means the room is gone.
async fn next_update(binding: &mut Option<Binding>) -> Option<RoomSnapshot> {
    match binding {
        Some(bound) => bound.feed.next().await,
        None => std::future::pending().await,
    }
}

/// Performs the initial handshake: receive Handshake, validate, send Ack.
async fn perform_handshake<S, O, C>(
    link: &mut Link,
    state: &ServerState<S, O, C>,
) -> Result<(), ImpostorError>
where
    C: Codec,
{
    let data = match tokio::time::timeout(state.handshake_timeout, link.conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let version = match state.codec.decode::<Envelope<ClientMessage>>(&data) {
        Ok(Envelope {
            payload: ClientMessage::Handshake { version },
            ..
        }) => version,
        _ => {
            link.send_error(&state.codec, 400, "expected Handshake").await?;
            return Err(ProtocolError::InvalidMessage("first message must be Handshake".into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        link.send_error(
            &state.codec,
            400,
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let ack = ServerMessage::HandshakeAck {
        server_time: link.now(),
    };
    link.send(&state.codec, ack).await
}

/// Runs one intent and turns the result into its `Reply` outcome.
async fn handle_intent<S, O, C>(
    state: &ServerState<S, O, C>,
    binding: &mut Option<Binding>,
    intent: Intent,
) -> Outcome
where
    S: SessionStore,
    O: WordOracle,
{
    match dispatch(state, binding, intent).await {
        Ok(reply) => Outcome::Ok(reply),
        Err(e) if e.is_silent() => {
            tracing::debug!(error = %e, "stale intent ignored");
            Outcome::Err(e.to_body())
        }
        Err(e) => {
            tracing::debug!(error = %e, kind = ?e.kind(), "intent rejected");
            Outcome::Err(e.to_body())
        }
    }
}

async fn dispatch<S, O, C>(
    state: &ServerState<S, O, C>,
    binding: &mut Option<Binding>,
    intent: Intent,
) -> Result<Reply, GameError>
where
    S: SessionStore,
    O: WordOracle,
{
    let c = &state.coordinator;

    let reply = match intent {
        Intent::CreateRoom { name, photo } => {
            let (room, host) = c.open_room(&name, photo).await?;
            let token = state.resume_keys.lock().await.issue(room.id, host.id);
            bind(c.feed(room.id), binding, &room, host.id, token)
        }
        Intent::JoinRoom { code, name, photo } => {
            let (room, player) = c.join_room(&code, &name, photo).await?;
            let token = state.resume_keys.lock().await.issue(room.id, player.id);
            bind(c.feed(room.id), binding, &room, player.id, token)
        }
        Intent::Resume {
            room_id,
            player_id,
            token,
        } => {
            if !state.resume_keys.lock().await.verify(room_id, player_id, &token) {
                tracing::info!(%room_id, %player_id, "resume refused, token does not match");
                return Err(GameError::NotInRoom { player_id, room_id });
            }
            let player = c.player(room_id, player_id).await?;
            if !player.is_present() {
                return Err(GameError::NotInRoom { player_id, room_id });
            }
            let room = c.room(room_id).await?;
            tracing::info!(%room_id, %player_id, status = %room.status, "connection resumed");
            bind(c.feed(room.id), binding, &room, player_id, token)
        }
        Intent::ListRooms => Reply::Rooms {
            rooms: c.list_open_rooms().await?,
        },
        Intent::StartRound {
            topic,
            difficulty,
            impostor_count,
        } => {
            let (room_id, me) = bound(binding)?;
            let room = c
                .start_round(room_id, me, &topic, difficulty, impostor_count)
                .await?;
            Reply::Phase { status: room.status }
        }
        Intent::AdvancePhase { target } => {
            let (room_id, me) = bound(binding)?;
            let room = c.advance_phase(room_id, me, target).await?;
            Reply::Phase { status: room.status }
        }
        Intent::SubmitTurn { text } => {
            let (room_id, me) = bound(binding)?;
            let room = c.submit_turn(room_id, me, &text).await?;
            Reply::TurnRecorded {
                lap_complete: room.status == RoomStatus::Voting,
            }
        }
        Intent::CastVote { target } => {
            let (room_id, me) = bound(binding)?;
            let room = c.cast_vote(room_id, me, target).await?;
            Reply::Phase { status: room.status }
        }
        Intent::Eliminate { target } => {
            let (room_id, me) = bound(binding)?;
            let room = c.eliminate(room_id, me, target).await?;
            Reply::Phase { status: room.status }
        }
        Intent::ResetRoom => {
            let (room_id, me) = bound(binding)?;
            let room = c.reset_room(room_id, me).await?;
            Reply::Phase { status: room.status }
        }
        Intent::LeaveRoom => {
            let (room_id, me) = bound(binding)?;
            let departure = c.leave_room(room_id, me).await?;
            state.resume_keys.lock().await.revoke(me);
            tracing::debug!(%room_id, player_id = %me, ?departure, "unbinding after leave");
            *binding = None;
            Reply::Accepted
        }
    };
    Ok(reply)
}

/// The room and player of a bound connection.
fn bound(binding: &Option<Binding>) -> Result<(RoomId, PlayerId), GameError> {
    binding
        .as_ref()
        .map(|b| (b.room_id, b.player_id))
        .ok_or_else(|| GameError::InvalidInput("create or join a room first".into()))
}

fn bind(
    feed: RoomFeed,
    binding: &mut Option<Binding>,
    room: &Room,
    player_id: PlayerId,
    resume_token: String,
) -> Reply {
    *binding = Some(Binding {
        room_id: room.id,
        player_id,
        feed,
    });
    Reply::Joined {
        room_id: room.id,
        player_id,
        code: room.code.clone(),
        resume_token,
    }
}
