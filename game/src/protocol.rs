use std::convert::From;

use serde::{Deserialize, Serialize};

use crate::model::Player;

/// Every possible kind of request that a client may send.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Request {
    Introduction(IntroductionRequest),
    Start,
    Join,
    Play(PlayRequest),
    Rank(RankRequest),
}

/// Every possible kind of response or notification a client may receive.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Response {
    Illegal,
    Introduction(IntroductionResponse),
    Start(StartResponse),
    Join(JoinResponse),
    Play(PlayResponse),
    Rank(RankResponse),
    Notification(Notification),
}

// Auxillary macro for converting inner request/response types into their
// outermost counterparts.

macro_rules! derive_from {
    ($to:ident, $ty:ident, $r:ident) => {
        impl From<$r> for $to {
            fn from(r: $r) -> Self {
                $to::$ty(r)
            }
        }
    };
}

/// A client's first request: who they want to be known as.
///
/// The name doubles as the player identity within a round, so it must be
/// unique among connected clients.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct IntroductionRequest {
    pub player: Player,
}

derive_from!(Request, Introduction, IntroductionRequest);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum IntroductionResponse {
    Success,
    NameInUse,
}

derive_from!(Response, Introduction, IntroductionResponse);

/// Reply to a `Start` request. Starting always succeeds; the requester
/// becomes the judge of the new round, replacing any round in progress.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StartResponse {
    pub prompt: String,
    pub blank_count: usize,
}

derive_from!(Response, Start, StartResponse);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum JoinResponse {
    /// The dealt hand, in order; a card's selectable index is its position.
    Dealt { cards: Vec<String> },
    NoActiveRound,
    /// The join was refused; `reason` is ready to relay to the player.
    Rejected { reason: String },
}

derive_from!(Response, Join, JoinResponse);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlayRequest {
    /// Indices into the player's dealt hand, one per blank, in the order
    /// the cards should fill the blanks.
    pub indices: Vec<usize>,
}

derive_from!(Request, Play, PlayRequest);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum PlayResponse {
    Accepted,
    NoActiveRound,
    Rejected { reason: String },
}

derive_from!(Response, Play, PlayResponse);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RankRequest {
    /// Indices into the submissions in play order, worst first; the last
    /// entry is the winner.
    pub ranking: Vec<usize>,
}

derive_from!(Request, Rank, RankRequest);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum RankResponse {
    Concluded,
    NoActiveRound,
    Rejected { reason: String },
}

derive_from!(Response, Rank, RankResponse);

/// Messages pushed to clients outside their own request/response cycle.
///
/// Delivery is fire-and-forget; the engine neither paces these nor waits
/// for confirmation. A front end wanting a dramatic reveal inserts its own
/// pauses between consecutive `Placement`s.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Notification {
    /// Broadcast when a round begins.
    RoundStarted {
        judge: Player,
        prompt: String,
        blank_count: usize,
    },
    /// Sent to the judge each time a player plays.
    SubmissionReceived {
        /// 0-based index of the submission, usable in a later ranking.
        submission: usize,
        player_count: usize,
        answer: String,
    },
    /// Broadcast during the reveal, one per ranked submission except the
    /// winner, counting down to first place.
    Placement {
        place: usize,
        player: Player,
        answer: String,
    },
    /// Broadcast last: the round's winner.
    Winner { player: Player, answer: String },
}

derive_from!(Response, Notification, Notification);
