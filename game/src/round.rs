//! One game in progress: the prompt, the judge, the joined players with
//! their hands, and the submissions in play order.

use std::collections::HashMap;

use rand::Rng;
use snafu::{ensure, Snafu};

use crate::catalog::CardCatalog;
use crate::model::Player;

/// The literal placeholder substring marking an insertion point in a prompt.
pub const BLANK: &str = "__________";

/// Number of response cards dealt to each joining player, unless the engine
/// is configured otherwise.
pub const DEFAULT_HAND_SIZE: usize = 10;

#[derive(Debug, Snafu)]
pub enum RoundError {
    #[snafu(display("Looks like you've already joined."))]
    AlreadyJoined,

    #[snafu(display("The draw pile doesn't have enough cards left for another hand."))]
    DeckExhausted,

    #[snafu(display("You may not."))]
    NotAPlayer,

    #[snafu(display("You've already played your cards."))]
    AlreadyPlayed,

    #[snafu(display("All you had to do was choose {} damn card(s).", expected))]
    InvalidSelection { expected: usize },

    #[snafu(display("Try again."))]
    InvalidRanking,
}

/// What the judge needs to hear after a successful play: which submission
/// this was and how the filled-in prompt reads.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Submission {
    /// 0-based index of this submission in play order.
    pub index: usize,
    /// How many players have joined so far, for "n of m" style displays.
    pub player_count: usize,
    /// The prompt with the played cards spliced into its blanks.
    pub answer: String,
}

/// One entry of the reveal sequence produced by [`Round::rank`].
///
/// `place` is `None` for the final entry, the winner. Any pause between
/// entries is up to whoever presents them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Announcement {
    pub place: Option<usize>,
    pub player: Player,
    pub answer: String,
}

pub struct Round {
    judge: Player,
    prompt: String,
    blank_count: usize,
    hand_size: usize,
    draw_pile: Vec<String>,
    players: HashMap<Player, Hand>,
    submissions: Vec<Player>,
}

impl Round {
    /// Begin a round: pick a prompt uniformly at random and take a private
    /// shuffled copy of the response pool as this round's draw pile.
    pub fn new<R: Rng>(
        judge: Player,
        catalog: &CardCatalog,
        hand_size: usize,
        rng: &mut R,
    ) -> Self {
        let prompt = catalog.pick_prompt(rng);
        // A prompt without any written blank still takes one card, appended
        // after the prompt when the answer is rendered.
        let blank_count = prompt.matches(BLANK).count().max(1);
        Round {
            judge,
            prompt,
            blank_count,
            hand_size,
            draw_pile: catalog.working_copy(rng),
            players: HashMap::new(),
            submissions: Vec::new(),
        }
    }

    pub fn judge(&self) -> &Player {
        &self.judge
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn blank_count(&self) -> usize {
        self.blank_count
    }

    /// Cards left to deal. The pile only ever shrinks; it is never
    /// replenished, so enough joins will exhaust it.
    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    pub fn hand(&self, player: &Player) -> Option<&Hand> {
        self.players.get(player)
    }

    /// Add a player and deal them a fresh hand off the front of the pile.
    ///
    /// The judge may not join, and nobody joins twice. If fewer than a full
    /// hand of cards remain, the join fails outright; no short hand is dealt
    /// and the pile is left untouched.
    pub fn join(&mut self, player: Player) -> Result<&Hand, RoundError> {
        ensure!(
            player != self.judge && !self.players.contains_key(&player),
            AlreadyJoined
        );
        ensure!(self.draw_pile.len() >= self.hand_size, DeckExhausted);
        let cards: Vec<String> = self.draw_pile.drain(..self.hand_size).collect();
        let hand = Hand::deal(player.clone(), cards);
        Ok(self.players.entry(player).or_insert(hand))
    }

    /// Record a player's selection and append it to the submission order.
    pub fn play(&mut self, player: &Player, indices: Vec<usize>) -> Result<Submission, RoundError> {
        ensure!(
            *player != self.judge && self.players.contains_key(player),
            NotAPlayer
        );
        let blank_count = self.blank_count;
        let hand = self
            .players
            .get_mut(player)
            .expect("membership checked above");
        hand.submit(indices, blank_count)?;
        let answer = hand
            .answer(&self.prompt)
            .expect("selection was just recorded");
        self.submissions.push(player.clone());
        Ok(Submission {
            index: self.submissions.len() - 1,
            player_count: self.players.len(),
            answer,
        })
    }

    /// Turn a ranking into the ordered reveal sequence.
    ///
    /// `ranking` indexes into the submissions in play order, worst first:
    /// the entry at position `p` is announced with place `len - p`, except
    /// the final entry, which is the winner and gets no place number. The
    /// round itself is not consumed; the caller concludes it by dropping it
    /// once the announcements are out.
    pub fn rank(&self, ranking: &[usize]) -> Result<Vec<Announcement>, RoundError> {
        ensure!(
            !ranking.is_empty() && distinct_and_in_range(ranking, self.submissions.len()),
            InvalidRanking
        );
        let mut announcements = Vec::with_capacity(ranking.len());
        for (position, &submission) in ranking.iter().enumerate() {
            let player = &self.submissions[submission];
            let answer = self.players[player]
                .answer(&self.prompt)
                .expect("every submitted hand has a selection");
            let place = if position + 1 < ranking.len() {
                Some(ranking.len() - position)
            } else {
                None
            };
            announcements.push(Announcement {
                place,
                player: player.clone(),
                answer,
            });
        }
        Ok(announcements)
    }
}

/// A player's private, fixed set of drawn cards plus their eventual
/// selection.
#[derive(Debug)]
pub struct Hand {
    owner: Player,
    cards: Vec<String>,
    selection: Option<Vec<usize>>,
}

impl Hand {
    fn deal(owner: Player, cards: Vec<String>) -> Self {
        Hand {
            owner,
            cards,
            selection: None,
        }
    }

    pub fn owner(&self) -> &Player {
        &self.owner
    }

    pub fn cards(&self) -> &[String] {
        &self.cards
    }

    pub fn has_played(&self) -> bool {
        self.selection.is_some()
    }

    fn submit(&mut self, indices: Vec<usize>, blank_count: usize) -> Result<(), RoundError> {
        ensure!(self.selection.is_none(), AlreadyPlayed);
        ensure!(
            indices.len() == blank_count && distinct_and_in_range(&indices, self.cards.len()),
            InvalidSelection {
                expected: blank_count
            }
        );
        self.selection = Some(indices);
        Ok(())
    }

    /// The prompt with the selected cards spliced into its blanks, in
    /// selection order. `None` until the hand has been played.
    ///
    /// A space is appended to the prompt before splitting, so a prompt that
    /// ends on a blank (or contains none at all) still yields a final
    /// segment and the classic read-back comes out verbatim.
    pub fn answer(&self, prompt: &str) -> Option<String> {
        let selection = self.selection.as_ref()?;
        let padded = format!("{} ", prompt);
        let mut out = String::new();
        for (i, segment) in padded.split(BLANK).enumerate() {
            out.push_str(segment);
            if let Some(&card) = selection.get(i) {
                out.push_str(&self.cards[card]);
            }
        }
        Some(out)
    }
}

// Shared by selection and ranking validation: indices must be pairwise
// distinct and all below `bound`.
fn distinct_and_in_range(indices: &[usize], bound: usize) -> bool {
    let mut seen = vec![false; bound];
    indices
        .iter()
        .all(|&i| i < bound && !std::mem::replace(&mut seen[i], true))
}
