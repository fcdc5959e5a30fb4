//! The session layer: at most one round in progress, plus the roster of
//! connected clients and the notification fan-out to them.

use std::collections::BTreeMap;

use futures::channel::mpsc;
use futures::lock::Mutex;
use futures::SinkExt;
use log::error;
use rand::thread_rng;
use serde::Deserialize;

use crate::catalog::CardCatalog;
use crate::model::Player;
use crate::protocol;
use crate::round::{Round, DEFAULT_HAND_SIZE};
use Phase::*;

pub struct Engine {
    settings: Settings,
    catalog: CardCatalog,
    synced: Mutex<Synced>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct Settings {
    pub hand_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hand_size: DEFAULT_HAND_SIZE,
        }
    }
}

impl Engine {
    /// Create a new engine with no round in progress.
    pub fn new(settings: Settings, catalog: CardCatalog) -> Self {
        Engine {
            settings,
            catalog,
            synced: Mutex::new(Synced::new()),
        }
    }

    /// Register a new client with the engine.
    ///
    /// The response channel should have a consumer that somehow delivers the
    /// responses to the client. In the actual server, this would involve
    /// serializing and writing the response to a WebSocket; in a test, the
    /// client would have the receiving channel.
    ///
    /// The returned context provides the client-handling task the means to
    /// execute incoming requests.
    pub async fn register(&self, response_tx: mpsc::Sender<protocol::Response>) -> Context<'_> {
        Context::new(self, response_tx)
    }
}

/// The handle by which client tasks may send requests to the engine.
pub struct Context<'engine> {
    engine: &'engine Engine,
    response_tx: mpsc::Sender<protocol::Response>,
    phase: Phase,
}

impl<'engine> Context<'engine> {
    fn new(engine: &'engine Engine, response_tx: mpsc::Sender<protocol::Response>) -> Self {
        Context {
            engine,
            response_tx,
            phase: New,
        }
    }

    /// Send a request to the engine.
    ///
    /// This does not return a value, but rather sends a response to the
    /// channel provided to `Engine::register`.
    pub async fn execute(&mut self, req: protocol::Request) {
        let response = self.handle(req).await;
        self.response_tx
            .send(response)
            .await
            .map_err(|e| error!("while sending response: {}", e))
            .ok();
    }

    /// Cleanup data for this client from the engine, e.g. due to
    /// disconnection. A round the player had joined keeps their hand; only
    /// the notification roster forgets them.
    pub async fn cleanup(&mut self) {
        if let Named { player } = &self.phase {
            self.engine.synced.lock().await.clients.remove(player);
        }
        self.phase = New;
    }

    // Top-level request-handling function.
    async fn handle(&mut self, req: protocol::Request) -> protocol::Response {
        let phase = std::mem::replace(&mut self.phase, New);
        let (phase, response) = phase.handle(self, req).await;
        self.phase = phase;
        response
    }
}

// Represents the protocol phase of a client.
enum Phase {
    // A client that has just connected but not yet introduced themselves.
    // The only valid request from such clients is an introduction.
    New,
    // The client has a name, which serves as their player identity for
    // every round-related request.
    Named { player: Player },
}

impl Phase {
    // Main request handling function.
    async fn handle<'engine>(
        self,
        ctx: &mut Context<'engine>,
        req: protocol::Request,
    ) -> (Self, protocol::Response) {
        use protocol::Request::*;
        match self {
            New => {
                use protocol::IntroductionResponse::*;
                if let Introduction(intro) = req {
                    let mut synced = ctx.engine.synced.lock().await;
                    if synced.clients.contains_key(&intro.player) {
                        (New, NameInUse.into())
                    } else {
                        synced
                            .clients
                            .insert(intro.player.clone(), ctx.response_tx.clone());
                        (
                            Named {
                                player: intro.player,
                            },
                            Success.into(),
                        )
                    }
                } else {
                    (self, protocol::Response::Illegal)
                }
            }
            Named { player } => {
                let response = match req {
                    Introduction(_) => protocol::Response::Illegal,
                    Start => start(ctx, &player).await,
                    Join => join(ctx, &player).await,
                    Play(play_req) => play(ctx, &player, play_req).await,
                    Rank(rank_req) => rank(ctx, rank_req).await,
                };
                (Named { player }, response)
            }
        }
    }
}

// Begin a new round with the requester as judge, replacing any round in
// progress. Everyone else hears about it as a notification; the judge gets
// the prompt in the direct response.
async fn start(ctx: &mut Context<'_>, player: &Player) -> protocol::Response {
    let round = {
        let mut rng = thread_rng();
        Round::new(
            player.clone(),
            &ctx.engine.catalog,
            ctx.engine.settings.hand_size,
            &mut rng,
        )
    };
    let response = protocol::StartResponse {
        prompt: round.prompt().to_string(),
        blank_count: round.blank_count(),
    };
    let started = protocol::Notification::RoundStarted {
        judge: player.clone(),
        prompt: round.prompt().to_string(),
        blank_count: round.blank_count(),
    };
    let mut synced = ctx.engine.synced.lock().await;
    synced.round = Some(round);
    synced.broadcast_except(player, started.into()).await;
    response.into()
}

async fn join(ctx: &mut Context<'_>, player: &Player) -> protocol::Response {
    use protocol::JoinResponse::*;
    let mut synced = ctx.engine.synced.lock().await;
    match synced.round.as_mut() {
        None => NoActiveRound.into(),
        Some(round) => match round.join(player.clone()) {
            Ok(hand) => Dealt {
                cards: hand.cards().to_vec(),
            }
            .into(),
            Err(e) => Rejected {
                reason: e.to_string(),
            }
            .into(),
        },
    }
}

async fn play(
    ctx: &mut Context<'_>,
    player: &Player,
    req: protocol::PlayRequest,
) -> protocol::Response {
    use protocol::PlayResponse::*;
    let mut synced = ctx.engine.synced.lock().await;
    let (response, notification) = match synced.round.as_mut() {
        None => (NoActiveRound, None),
        Some(round) => match round.play(player, req.indices) {
            Ok(submission) => {
                let note = protocol::Notification::SubmissionReceived {
                    submission: submission.index,
                    player_count: submission.player_count,
                    answer: submission.answer,
                };
                (Accepted, Some((round.judge().clone(), note)))
            }
            Err(e) => (
                Rejected {
                    reason: e.to_string(),
                },
                None,
            ),
        },
    };
    if let Some((judge, note)) = notification {
        synced.notify(&judge, note.into()).await;
    }
    response.into()
}

// Validate the ranking while the round is still in place; only a fully
// valid ranking concludes the round and triggers the reveal broadcast.
async fn rank(ctx: &mut Context<'_>, req: protocol::RankRequest) -> protocol::Response {
    use protocol::RankResponse::*;
    let mut synced = ctx.engine.synced.lock().await;
    let outcome = synced
        .round
        .as_ref()
        .map(|round| round.rank(&req.ranking));
    match outcome {
        None => NoActiveRound.into(),
        Some(Err(e)) => Rejected {
            reason: e.to_string(),
        }
        .into(),
        Some(Ok(announcements)) => {
            synced.round = None;
            for a in announcements {
                let note = match a.place {
                    Some(place) => protocol::Notification::Placement {
                        place,
                        player: a.player,
                        answer: a.answer,
                    },
                    None => protocol::Notification::Winner {
                        player: a.player,
                        answer: a.answer,
                    },
                };
                synced.broadcast(note.into()).await;
            }
            Concluded.into()
        }
    }
}

// The mutex-synchronized state: the current round, if any, and the sender
// half of every connected client.
struct Synced {
    round: Option<Round>,
    clients: BTreeMap<Player, mpsc::Sender<protocol::Response>>,
}

impl Synced {
    fn new() -> Self {
        Synced {
            round: None,
            clients: BTreeMap::new(),
        }
    }

    // Fire-and-forget delivery to a single client.
    async fn notify(&mut self, target: &Player, response: protocol::Response) {
        if let Some(tx) = self.clients.get_mut(target) {
            tx.send(response)
                .await
                .map_err(|e| error!("while notifying {}: {}", target, e))
                .ok();
        }
    }

    async fn broadcast(&mut self, response: protocol::Response) {
        for (player, tx) in self.clients.iter_mut() {
            tx.send(response.clone())
                .await
                .map_err(|e| error!("while notifying {}: {}", player, e))
                .ok();
        }
    }

    async fn broadcast_except(&mut self, skip: &Player, response: protocol::Response) {
        for (player, tx) in self.clients.iter_mut() {
            if player == skip {
                continue;
            }
            tx.send(response.clone())
                .await
                .map_err(|e| error!("while notifying {}: {}", player, e))
                .ok();
        }
    }
}
