use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::Mutex;
use tokio::time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Messages,
    context,
    domain::{ChatId, Destination, MessageId, MessageRef, Participant, UserId},
    draw::{
        announcer::Announcer,
        ledger::{PrizeEntry, PrizeLedger},
        ordinal::ordinal_label,
        parse::PrizeSpec,
        selector::{self, PoolExhausted},
        DrawRejection,
    },
    formatting::escape_html,
};

/// Pacing of one draw. All values come from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawTiming {
    /// How long participants can join.
    pub join_window: Duration,
    /// Pause before the first winner of each prize is revealed.
    pub prize_announce_delay: Duration,
    /// Pause between consecutive winners of the same prize.
    pub inter_winner_delay: Duration,
    /// Spacing of "time left" reports during the window.
    pub report_interval: Duration,
    /// Reports are only sent once the remaining time is at most this.
    pub report_threshold: Duration,
}

/// Upper bound for any single wait. Keeps `Instant` arithmetic from overflowing
/// on absurd configured durations.
const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

impl Default for DrawTiming {
    fn default() -> Self {
        Self {
            join_window: Duration::from_secs(60),
            prize_announce_delay: Duration::from_secs(3),
            inter_winner_delay: Duration::from_secs(3),
            report_interval: Duration::from_secs(60),
            report_threshold: Duration::from_secs(180),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawStatus {
    /// Accepting joins.
    Open,
    /// Window closed, winners being drawn and announced.
    Resolving,
    /// Finished (or cancelled). Terminal.
    Closed,
}

impl DrawStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DrawStatus::Open => "open",
            DrawStatus::Resolving => "drawing winners",
            DrawStatus::Closed => "over",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => DrawStatus::Open,
            1 => DrawStatus::Resolving,
            _ => DrawStatus::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            DrawStatus::Open => 0,
            DrawStatus::Resolving => 1,
            DrawStatus::Closed => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
}

/// Winners drawn for one prize entry, in selection order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrizeDraw {
    pub prize: String,
    pub quantity: usize,
    pub winners: Vec<Participant>,
}

/// Outcome of the selection phase, replayed by the announcement phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionPlan {
    /// Roster size when the window closed.
    pub joined: usize,
    /// Processed prize entries, in declaration order.
    pub draws: Vec<PrizeDraw>,
    /// The roster ran dry before every entry was processed.
    pub exhausted: bool,
}

/// Read-only view of a session.
#[derive(Clone, Debug)]
pub struct DrawSnapshot {
    pub chat_id: ChatId,
    pub status: DrawStatus,
    pub organizer: Participant,
    pub opened_at: DateTime<Utc>,
    /// Still-eligible participants in join order.
    pub roster: Vec<Participant>,
    pub winners: Vec<Participant>,
    pub prizes: Vec<PrizeEntry>,
}

#[derive(Debug)]
struct DrawState {
    anchor: Option<MessageRef>,
    roster: HashMap<UserId, Participant>,
    /// Append-only sampling domain; may hold ids that already won.
    pending: Vec<UserId>,
    winners: HashMap<UserId, Participant>,
    ledger: PrizeLedger,
    rng: StdRng,
}

impl DrawState {
    fn resolve(&mut self) -> ResolutionPlan {
        let DrawState {
            roster,
            pending,
            winners,
            ledger,
            rng,
            ..
        } = self;

        let mut plan = ResolutionPlan {
            joined: roster.len(),
            draws: Vec::new(),
            exhausted: false,
        };
        if roster.is_empty() {
            return plan;
        }

        for idx in 0..ledger.len() {
            if roster.is_empty() {
                plan.exhausted = true;
                break;
            }

            while ledger.remaining_slots(idx) > 0 && !roster.is_empty() {
                let id = match selector::pick(&mut *rng, pending.as_slice(), |id| {
                    roster.contains_key(&id)
                }) {
                    Ok(id) => id,
                    Err(PoolExhausted) => break,
                };
                let Some(winner) = roster.remove(&id) else {
                    continue;
                };
                if let Err(e) = ledger.record_winner(idx, winner.clone()) {
                    tracing::warn!("dropping winner {}: {e}", id.0);
                    break;
                }
                winners.insert(id, winner);
            }

            if let Some(entry) = ledger.get(idx) {
                plan.draws.push(PrizeDraw {
                    prize: entry.name.clone(),
                    quantity: entry.quantity,
                    winners: entry.winners.clone(),
                });
            }
        }

        plan
    }
}

/// One timed draw in one chat.
///
/// All mutable state sits behind a single lock. The window task never holds it
/// across a sleep, so joins and status queries stay responsive.
///
/// `status` is only written with `state` locked, but can be read without it.
#[derive(Debug)]
pub struct DrawSession {
    chat_id: ChatId,
    chat_title: String,
    organizer: Participant,
    timing: DrawTiming,
    opened_at: DateTime<Utc>,
    cancel: CancellationToken,
    status: AtomicU8,
    state: Mutex<DrawState>,
}

impl DrawSession {
    pub fn new(
        chat_id: ChatId,
        chat_title: impl Into<String>,
        organizer: Participant,
        prizes: &[PrizeSpec],
        timing: DrawTiming,
    ) -> Self {
        Self::with_rng(
            chat_id,
            chat_title,
            organizer,
            prizes,
            timing,
            StdRng::from_entropy(),
        )
    }

    pub fn with_rng(
        chat_id: ChatId,
        chat_title: impl Into<String>,
        organizer: Participant,
        prizes: &[PrizeSpec],
        timing: DrawTiming,
        rng: StdRng,
    ) -> Self {
        let mut ledger = PrizeLedger::new();
        for p in prizes {
            ledger.add_entry(p.name.clone(), p.quantity);
        }

        Self {
            chat_id,
            chat_title: chat_title.into(),
            organizer,
            timing,
            opened_at: Utc::now(),
            cancel: CancellationToken::new(),
            status: AtomicU8::new(DrawStatus::Open.as_u8()),
            state: Mutex::new(DrawState {
                anchor: None,
                roster: HashMap::new(),
                pending: Vec::new(),
                winners: HashMap::new(),
                ledger,
                rng,
            }),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn organizer(&self) -> &Participant {
        &self.organizer
    }

    pub fn timing(&self) -> DrawTiming {
        self.timing
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Current status. Never waits on the state lock.
    pub fn status(&self) -> DrawStatus {
        DrawStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Caller must hold the state lock.
    fn set_status(&self, _state: &DrawState, status: DrawStatus) {
        self.status.store(status.as_u8(), Ordering::Release);
    }

    pub async fn set_anchor(&self, anchor: MessageRef) {
        self.state.lock().await.anchor = Some(anchor);
    }

    /// Whether `message_id` is the announcement participants reply to.
    pub async fn is_anchor(&self, message_id: MessageId) -> bool {
        self.state
            .lock()
            .await
            .anchor
            .map(|a| a.message_id == message_id)
            .unwrap_or(false)
    }

    /// Add a participant. Idempotent; refused once the window has closed.
    pub async fn join(&self, participant: Participant) -> Result<JoinOutcome, DrawRejection> {
        let mut st = self.state.lock().await;
        if self.status() != DrawStatus::Open {
            return Err(DrawRejection::AlreadyOver);
        }
        if st.roster.contains_key(&participant.id) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        tracing::debug!(
            "chat {}: {} joined the draw",
            self.chat_id.0,
            participant.mention_html()
        );
        st.pending.push(participant.id);
        st.roster.insert(participant.id, participant);
        Ok(JoinOutcome::Joined)
    }

    /// Open -> Resolving, then draw every prize. `None` if the session was not open,
    /// so resolution happens at most once.
    pub async fn begin_resolution(&self) -> Option<ResolutionPlan> {
        let mut st = self.state.lock().await;
        if self.status() != DrawStatus::Open {
            return None;
        }
        self.set_status(&st, DrawStatus::Resolving);
        Some(st.resolve())
    }

    pub async fn close(&self) {
        let st = self.state.lock().await;
        self.set_status(&st, DrawStatus::Closed);
    }

    /// Stop a draw that is still in its join window. Once resolution has begun it
    /// runs to completion and this is refused.
    pub async fn cancel(&self) -> Result<(), DrawRejection> {
        let st = self.state.lock().await;
        if self.status() != DrawStatus::Open {
            return Err(DrawRejection::AlreadyOver);
        }
        self.set_status(&st, DrawStatus::Closed);
        self.cancel.cancel();
        Ok(())
    }

    pub async fn snapshot(&self) -> DrawSnapshot {
        let st = self.state.lock().await;

        let mut roster = Vec::with_capacity(st.roster.len());
        for id in st.pending.iter() {
            if let Some(p) = st.roster.get(id) {
                if !roster.iter().any(|r: &Participant| r.id == p.id) {
                    roster.push(p.clone());
                }
            }
        }

        let mut winners: Vec<Participant> = st.winners.values().cloned().collect();
        winners.sort_by_key(|p| p.id);

        DrawSnapshot {
            chat_id: self.chat_id,
            status: self.status(),
            organizer: self.organizer.clone(),
            opened_at: self.opened_at,
            roster,
            winners,
            prizes: st.ledger.entries().to_vec(),
        }
    }

    /// Background task: wait out the join window, then draw and announce.
    pub async fn run(self: Arc<Self>, announcer: Arc<Announcer>, messages: Arc<Messages>) {
        if !self.wait_for_window(&announcer, &messages).await {
            tracing::info!("chat {}: draw cancelled during join window", self.chat_id.0);
            return;
        }

        let Some(plan) = self.begin_resolution().await else {
            return;
        };
        tracing::info!(
            "chat {}: window closed with {} participant(s), {} prize entr(ies) drawn",
            self.chat_id.0,
            plan.joined,
            plan.draws.len()
        );

        self.announce_results(&plan, &announcer, &messages).await;
        self.close().await;
        tracing::info!("chat {}: draw closed", self.chat_id.0);
    }

    /// Returns `true` once the deadline passes, `false` if cancelled first.
    async fn wait_for_window(&self, announcer: &Announcer, messages: &Messages) -> bool {
        let start = Instant::now();
        let deadline = start + self.timing.join_window.min(MAX_WAIT);
        let period = self
            .timing
            .report_interval
            .clamp(Duration::from_secs(1), MAX_WAIT);
        let mut ticker = interval_at(start + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = sleep_until(deadline) => return true,
                t = ticker.tick() => {
                    let left = deadline.saturating_duration_since(t);
                    if left.is_zero() || left > self.timing.report_threshold {
                        continue;
                    }
                    let minutes = (left.as_secs() + 30) / 60;
                    if minutes == 0 {
                        continue;
                    }
                    announcer
                        .announce(
                            Destination::Chat(self.chat_id),
                            &messages.time_left_for_join,
                            &context! { "timeLeft" => minutes },
                        )
                        .await;
                }
            }
        }
    }

    async fn announce_results(
        &self,
        plan: &ResolutionPlan,
        announcer: &Announcer,
        messages: &Messages,
    ) {
        let chat = Destination::Chat(self.chat_id);

        if plan.joined == 0 {
            announcer
                .announce(chat, &messages.no_one_joined, &context!())
                .await;
            return;
        }

        let joined_template = if plan.joined == 1 {
            &messages.there_is_one_member_joined
        } else {
            &messages.there_are_n_members_joined
        };
        announcer
            .announce(
                chat,
                joined_template,
                &context! { "numberOfMembers" => plan.joined },
            )
            .await;

        let organizer = self.organizer.mention_html();
        let chat_title = escape_html(&self.chat_title);

        for draw in plan.draws.iter() {
            let prize = escape_html(&draw.prize);
            let intro = if draw.quantity == 1 {
                &messages.will_choose_one_person
            } else {
                &messages.will_choose_number_of_persons
            };
            announcer
                .announce(
                    chat,
                    intro,
                    &context! { "quantity" => draw.quantity, "prize" => prize.clone() },
                )
                .await;

            // Reveal counts down: the last winner revealed takes first place.
            let count = draw.winners.len();
            for (idx, winner) in draw.winners.iter().enumerate() {
                let delay = if idx == 0 {
                    self.timing.prize_announce_delay
                } else {
                    self.timing.inter_winner_delay
                };
                sleep(delay).await;

                let place_number = count - idx;
                let place = ordinal_label(place_number);
                let mention = winner.mention_html();
                announcer
                    .announce(
                        chat,
                        &messages.winner_is,
                        &context! {
                            "place" => place.clone(),
                            "place_en" => place,
                            "place_number" => place_number,
                            "winner" => mention.clone(),
                        },
                    )
                    .await;

                announcer
                    .announce(
                        Destination::User(winner.id),
                        &messages.notify_winner,
                        &context! {
                            "prize" => prize.clone(),
                            "winner" => mention,
                            "organizer" => organizer.clone(),
                            "chat" => chat_title.clone(),
                        },
                    )
                    .await;
            }
        }

        if plan.exhausted {
            announcer
                .announce(chat, &messages.all_members_got_their_prize, &context!())
                .await;
        }

        announcer
            .announce(chat, &messages.the_draw_is_over, &context!())
            .await;
    }
}
