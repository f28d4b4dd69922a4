use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;
use warp::ws::{Message as Frame, WebSocket};
use warp::Filter;

use crate::board::{Board, Message, MAX_TEXT_LEN};
use crate::messages::{ClientEvent, ServerEvent};

type Tx = mpsc::UnboundedSender<Frame>;

/// Board plus the outbound queue of every live connection, guarded together
/// so that a mutation and its broadcast form one atomic unit. Queue sends
/// never block; each connection drains its own queue into the socket.
struct Inner {
    board: Board,
    peers: HashMap<String, Tx>,
}

#[derive(Clone)]
pub struct Server {
    inner: Arc<Mutex<Inner>>,
}

impl Server {
    pub fn new() -> Self {
        Self::with_board(Board::new())
    }

    pub fn with_board(board: Board) -> Self {
        Server {
            inner: Arc::new(Mutex::new(Inner {
                board,
                peers: HashMap::new(),
            })),
        }
    }

    pub async fn handle_connection(&self, ws: WebSocket) {
        let session_id = Uuid::new_v4().to_string();
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        {
            let mut inner = self.inner.lock().await;
            let session = inner.board.register(session_id.clone());
            inner.peers.insert(session_id.clone(), tx);
            info!("session {session_id} connected as {}", session.pseudonym);

            Self::send_to(
                &inner,
                &session_id,
                &ServerEvent::UsernameAssigned {
                    pseudonym: session.pseudonym,
                },
            );
            Self::send_to(
                &inner,
                &session_id,
                &ServerEvent::InitialMessages {
                    messages: inner.board.list(),
                },
            );
            Self::broadcast_all(
                &inner,
                &ServerEvent::UserCount {
                    count: inner.board.count(),
                },
            );
        }

        let server = self.clone();
        let reader_session = session_id.clone();
        tokio::spawn(async move {
            while let Some(result) = ws_rx.next().await {
                match result {
                    Ok(frame) => {
                        let Ok(text) = frame.to_str() else {
                            continue;
                        };
                        match serde_json::from_str::<ClientEvent>(text) {
                            Ok(event) => {
                                server.handle_client_event(&reader_session, event).await;
                            }
                            Err(e) => {
                                debug!("session {reader_session}: dropping malformed frame: {e}");
                            }
                        }
                    }
                    Err(e) => {
                        warn!("session {reader_session}: websocket error: {e}");
                        break;
                    }
                }
            }

            server.handle_disconnect(&reader_session).await;
        });

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if ws_tx.send(frame).await.is_err() {
                    // Peer is gone; the reader side tears the session down.
                    break;
                }
            }
        });
    }

    async fn handle_client_event(&self, session_id: &str, event: ClientEvent) {
        match event {
            ClientEvent::SendMessage { text } => {
                if text.is_empty() || text.chars().count() > MAX_TEXT_LEN {
                    debug!("session {session_id}: dropping message with invalid length");
                    return;
                }

                let mut inner = self.inner.lock().await;
                match inner.board.append(session_id, text) {
                    Ok(message) => {
                        Self::broadcast_all(&inner, &ServerEvent::NewMessage(message));
                    }
                    Err(e) => debug!("session {session_id}: dropping message: {e}"),
                }
            }

            ClientEvent::VoteMessage {
                message_id,
                vote_type,
            } => {
                let mut inner = self.inner.lock().await;
                match inner.board.apply_vote(&message_id, session_id, vote_type) {
                    Ok(outcome) => {
                        Self::broadcast_all(
                            &inner,
                            &ServerEvent::MessageUpdated {
                                message_id: outcome.message_id,
                                votes: outcome.score,
                                voters: outcome.voters,
                            },
                        );
                    }
                    Err(e) => debug!("session {session_id}: dropping vote: {e}"),
                }
            }
        }
    }

    async fn handle_disconnect(&self, session_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.board.deregister(session_id);
        inner.peers.remove(session_id);
        info!("session {session_id} disconnected");

        Self::broadcast_all(
            &inner,
            &ServerEvent::UserCount {
                count: inner.board.count(),
            },
        );
    }

    /// Consistent point-in-time view of the log for non-realtime callers.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.inner.lock().await.board.list()
    }

    fn broadcast_all(inner: &Inner, event: &ServerEvent) {
        let Ok(frame) = serde_json::to_string(event) else {
            return;
        };
        for tx in inner.peers.values() {
            // A closed peer just drops the frame; its disconnect is handled
            // by its own reader task.
            let _ = tx.send(Frame::text(frame.clone()));
        }
    }

    fn send_to(inner: &Inner, session_id: &str, event: &ServerEvent) {
        let Ok(frame) = serde_json::to_string(event) else {
            return;
        };
        if let Some(tx) = inner.peers.get(session_id) {
            let _ = tx.send(Frame::text(frame));
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// The full route stack: websocket endpoint, read-only message snapshot,
/// and the static client files.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let ws_server = server.clone();
    let ws_route = warp::path("ws")
        .and(warp::ws())
        .map(move |ws: warp::ws::Ws| {
            let server = ws_server.clone();
            ws.on_upgrade(move |socket| async move {
                server.handle_connection(socket).await;
            })
        });

    let messages_route = warp::path("messages")
        .and(warp::get())
        .then(move || {
            let server = server.clone();
            async move { warp::reply::json(&server.snapshot().await) }
        });

    let static_files = warp::fs::dir("public");

    ws_route
        .or(messages_route)
        .or(static_files)
        .with(warp::cors().allow_any_origin())
}
