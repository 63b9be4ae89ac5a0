//! Room lifecycle state machine.
//!
//! A room carries one quiz session from the waiting lobby through its
//! timed questions to a terminal state. Every operation here runs under
//! the room's mutex (owned by the coordinator) and returns the ordered
//! outbound events it produced; delivery and timer plumbing stay
//! outside so the state machine itself remains synchronous and fully
//! deterministic under test.
//!
//! State graph: `waiting → active → completed`, with `cancelled`
//! reachable from both non-terminal states. The question cursor only
//! ever moves forward.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    OutboundMessage, constants, duration_from_wire_seconds,
    error::RoomError,
    leaderboard::{self, LeaderboardEntry},
    ledger::AnswerLedger,
    quiz::{ChoiceId, QuestionPayload, QuizSnapshot},
    registry::ParticipantId,
    room_code::RoomCode,
    roster::{Joined, Player, Roster},
};

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Lobby: players can join, no question is open
    Waiting,
    /// A game is in progress
    Active,
    /// The game ran to its end
    Completed,
    /// The game was aborted
    Cancelled,
}

impl Status {
    /// Whether this phase is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }
}

/// Addressee of one outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Host and all players
    All,
    /// The host only
    Host,
    /// All players, not the host
    Players,
    /// One specific participant
    Player(ParticipantId),
}

/// One outbound message with its addressee, in emission order.
#[derive(Debug, Clone)]
pub struct Event {
    /// Who should receive the message
    pub to: Recipient,
    /// The message itself
    pub message: OutboundMessage,
}

impl Event {
    fn all(message: OutboundMessage) -> Self {
        Self {
            to: Recipient::All,
            message,
        }
    }
}

/// Messages scheduled to fire after a delay.
///
/// Alarms carry the question index they were armed for; a room ignores
/// any alarm whose index no longer matches the open question, so a
/// stale timer can never advance past a question it did not time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The open question's time limit elapsed
    QuestionDeadline {
        /// Index of the question the timer was armed for
        question_index: usize,
    },
}

/// Aggregate statistics attached to the terminal `game_ended` message.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GameSummary {
    /// Questions the quiz contained
    pub question_count: usize,
    /// Players that ever joined, connected or not
    pub player_count: usize,
}

/// One quiz session: quiz snapshot, roster, ledger, and phase.
pub struct Room {
    code: RoomCode,
    quiz: Arc<QuizSnapshot>,
    host_id: ParticipantId,
    host_name: String,
    host_connected: bool,
    max_players: usize,
    status: Status,
    /// Index of the open question; `None` until the game starts
    cursor: Option<usize>,
    roster: Roster,
    ledger: AnswerLedger,
    created_at: SystemTime,
    started_at: Option<SystemTime>,
    ended_at: Option<SystemTime>,
}

impl Room {
    /// Creates a room in the waiting phase over a validated quiz.
    pub fn new(
        code: RoomCode,
        quiz: Arc<QuizSnapshot>,
        host_name: &str,
        max_players: usize,
    ) -> Result<Self, RoomError> {
        quiz.validate()
            .map_err(|report| RoomError::InvalidConfig(report.to_string()))?;
        if !(1..=constants::room::MAX_PLAYER_COUNT).contains(&max_players) {
            return Err(RoomError::InvalidConfig(format!(
                "max_players must be between 1 and {}",
                constants::room::MAX_PLAYER_COUNT
            )));
        }
        let host_name = crate::roster::sanitize_nickname(host_name)?;
        Ok(Self {
            code,
            quiz,
            host_id: ParticipantId::new(),
            host_name,
            host_connected: false,
            max_players,
            status: Status::Waiting,
            cursor: None,
            roster: Roster::default(),
            ledger: AnswerLedger::default(),
            created_at: SystemTime::now(),
            started_at: None,
            ended_at: None,
        })
    }

    /// Admits a player into the lobby.
    ///
    /// Only possible while waiting. A nickname held by a disconnected
    /// player is reclaimed silently; a brand-new player is announced to
    /// the whole room.
    pub fn join(&mut self, nickname: &str) -> Result<(ParticipantId, Vec<Event>), RoomError> {
        if self.status != Status::Waiting {
            return Err(RoomError::RoomNotJoinable);
        }
        let reclaimable = self.roster.nickname_holder(nickname).is_some();
        if !reclaimable && self.roster.len() >= self.max_players {
            return Err(RoomError::RoomFull);
        }
        let joined = self.roster.join(nickname)?;
        tracing::info!(room = %self.code, player_id = %joined.id(), "player joined");
        let events = match joined {
            Joined::New(id) => {
                let player = self.roster.get(id).ok_or(RoomError::GameStateError)?;
                vec![Event::all(OutboundMessage::PlayerJoined {
                    player_id: id,
                    nickname: player.nickname.clone(),
                })]
            }
            Joined::Rejoined(_) => vec![],
        };
        Ok((joined.id(), events))
    }

    /// Starts the game, opening the first question.
    ///
    /// Requires the waiting phase and at least one connected player.
    pub fn start(
        &mut self,
        schedule: &mut impl FnMut(AlarmMessage, Duration),
    ) -> Result<Vec<Event>, RoomError> {
        if self.status != Status::Waiting || self.roster.connected_count() == 0 {
            return Err(RoomError::GameStateError);
        }
        self.status = Status::Active;
        self.started_at = Some(SystemTime::now());
        tracing::info!(room = %self.code, players = self.roster.connected_count(), "game started");
        let mut events = vec![Event::all(OutboundMessage::GameStarted {
            quiz_title: self.quiz.title.clone(),
            question_count: self.quiz.len(),
        })];
        self.open_question(0, schedule, &mut events)?;
        Ok(events)
    }

    /// Records a player's answer for the open question.
    ///
    /// On acceptance the host gets an updated answer count; when every
    /// connected player has answered, the question closes early.
    pub fn submit_answer(
        &mut self,
        player: ParticipantId,
        question_index: usize,
        choice: Option<ChoiceId>,
        time_taken: f64,
        schedule: &mut impl FnMut(AlarmMessage, Duration),
    ) -> Result<Vec<Event>, RoomError> {
        if self.status != Status::Active {
            return Err(RoomError::GameStateError);
        }
        if !self.roster.contains(player) {
            return Err(RoomError::InvalidSubmission(
                "player is not in this room".to_owned(),
            ));
        }
        let latency = duration_from_wire_seconds(time_taken).ok_or_else(|| {
            RoomError::InvalidSubmission("time_taken is not a valid elapsed time".to_owned())
        })?;
        let open = self.cursor.ok_or(RoomError::GameStateError)?;
        let question = self.quiz.question(open).ok_or(RoomError::GameStateError)?;
        self.ledger.submit(
            open,
            question_index,
            question,
            player,
            choice,
            latency,
            Instant::now(),
        )?;
        let mut events = vec![Event {
            to: Recipient::Host,
            message: OutboundMessage::AnswerCount {
                count: self.ledger.answered_count(open),
            },
        }];
        let all_answered = self
            .roster
            .connected_ids()
            .all(|id| self.ledger.has_answered(open, id));
        if all_answered {
            self.close_question(schedule, &mut events)?;
        }
        Ok(events)
    }

    /// Closes the open question ahead of or at its deadline.
    ///
    /// Players who never answered get a zero-point sentinel entry, then
    /// the next question opens or the game completes.
    pub fn advance(
        &mut self,
        schedule: &mut impl FnMut(AlarmMessage, Duration),
    ) -> Result<Vec<Event>, RoomError> {
        if self.status != Status::Active {
            return Err(RoomError::GameStateError);
        }
        let mut events = vec![];
        self.close_question(schedule, &mut events)?;
        Ok(events)
    }

    /// Force-ends an active game, keeping all scores recorded so far.
    pub fn end(&mut self) -> Result<Vec<Event>, RoomError> {
        if self.status != Status::Active {
            return Err(RoomError::GameStateError);
        }
        if let Some(open) = self.cursor
            && let Some(question) = self.quiz.question(open)
        {
            let connected: Vec<_> = self.roster.connected_ids().collect();
            self.ledger
                .record_unanswered(open, question.time_limit, connected, Instant::now());
        }
        tracing::info!(room = %self.code, "game ended by host");
        let mut events = vec![];
        self.finish(Status::Completed, &mut events);
        Ok(events)
    }

    /// Aborts the room from any non-terminal state.
    ///
    /// Used when a transition fails irrecoverably; participants get a
    /// terminal notice with the partial standings.
    pub fn cancel(&mut self) -> Vec<Event> {
        if self.status.is_terminal() {
            return vec![];
        }
        tracing::warn!(room = %self.code, "room cancelled");
        let mut events = vec![Event::all(OutboundMessage::Error {
            message: "game cancelled".to_owned(),
        })];
        self.finish(Status::Cancelled, &mut events);
        events
    }

    /// Handles a fired timer.
    ///
    /// The alarm only advances the game if its question index still
    /// matches the open question; anything else is a stale timer and is
    /// ignored.
    pub fn receive_alarm(
        &mut self,
        alarm: AlarmMessage,
        schedule: &mut impl FnMut(AlarmMessage, Duration),
    ) -> Result<Vec<Event>, RoomError> {
        match alarm {
            AlarmMessage::QuestionDeadline { question_index } => {
                if self.status == Status::Active && self.cursor == Some(question_index) {
                    self.advance(schedule)
                } else {
                    tracing::debug!(room = %self.code, question_index, "stale alarm ignored");
                    Ok(vec![])
                }
            }
        }
    }

    /// Marks a participant's connection as lost.
    ///
    /// Soft by design: records and scores are kept, the game keeps
    /// running, and the participant may reconnect.
    pub fn disconnect(&mut self, participant: ParticipantId) -> Vec<Event> {
        if participant == self.host_id {
            self.host_connected = false;
            tracing::info!(room = %self.code, "host disconnected");
            return vec![Event {
                to: Recipient::Players,
                message: OutboundMessage::HostDisconnected {},
            }];
        }
        match self.roster.mark_disconnected(participant) {
            Some(player) => {
                tracing::info!(room = %self.code, player_id = %participant, "player disconnected");
                vec![Event::all(OutboundMessage::PlayerLeft {
                    player_id: player.id,
                    nickname: player.nickname.clone(),
                })]
            }
            None => vec![],
        }
    }

    /// Marks a participant as connected again.
    ///
    /// Emits nothing: a reconnect must not produce a second
    /// `player_joined` announcement.
    pub fn reconnect(&mut self, participant: ParticipantId) {
        if participant == self.host_id {
            self.host_connected = true;
        } else {
            self.roster.mark_connected(participant);
        }
    }

    fn open_question(
        &mut self,
        index: usize,
        schedule: &mut impl FnMut(AlarmMessage, Duration),
        events: &mut Vec<Event>,
    ) -> Result<(), RoomError> {
        let question = self.quiz.question(index).ok_or(RoomError::GameStateError)?;
        self.cursor = Some(index);
        events.push(Event::all(OutboundMessage::Question(QuestionPayload {
            question_index: index,
            question_text: question.text.clone(),
            choices: question.public_choices(),
            time_limit: question.time_limit,
        })));
        schedule(
            AlarmMessage::QuestionDeadline {
                question_index: index,
            },
            question.time_limit,
        );
        Ok(())
    }

    fn close_question(
        &mut self,
        schedule: &mut impl FnMut(AlarmMessage, Duration),
        events: &mut Vec<Event>,
    ) -> Result<(), RoomError> {
        let open = self.cursor.ok_or(RoomError::GameStateError)?;
        let question = self.quiz.question(open).ok_or(RoomError::GameStateError)?;
        let connected: Vec<_> = self.roster.connected_ids().collect();
        self.ledger
            .record_unanswered(open, question.time_limit, connected, Instant::now());
        if let Some(correct) = question.correct_choice_id() {
            events.push(Event::all(OutboundMessage::QuestionEnded {
                correct_choice_id: correct,
            }));
        }
        events.push(Event::all(OutboundMessage::LeaderboardUpdate {
            players: leaderboard::snapshot(&self.roster, &self.ledger),
        }));
        let next = open + 1;
        if next < self.quiz.len() {
            self.open_question(next, schedule, events)?;
        } else {
            self.finish(Status::Completed, events);
        }
        Ok(())
    }

    fn finish(&mut self, status: Status, events: &mut Vec<Event>) {
        self.status = status;
        self.ended_at = Some(SystemTime::now());
        events.push(Event::all(OutboundMessage::GameEnded {
            final_leaderboard: leaderboard::snapshot(&self.roster, &self.ledger),
            summary: GameSummary {
                question_count: self.quiz.len(),
                player_count: self.roster.len(),
            },
        }));
    }

    /// The room's join code.
    pub fn code(&self) -> RoomCode {
        self.code
    }

    /// The current lifecycle phase.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The host's participant id.
    pub fn host_id(&self) -> ParticipantId {
        self.host_id
    }

    /// The host's display name.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Whether the host currently has a live connection.
    pub fn host_connected(&self) -> bool {
        self.host_connected
    }

    /// Index of the open question, `None` before the game starts.
    pub fn current_question_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Whether this id belongs to a player of the room.
    pub fn has_player(&self, id: ParticipantId) -> bool {
        self.roster.contains(id)
    }

    /// Snapshot of all player records.
    pub fn players(&self) -> Vec<Player> {
        self.roster.iter().cloned().collect()
    }

    /// Current standings.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::snapshot(&self.roster, &self.ledger)
    }

    /// When the room reached a terminal state, if it has.
    pub fn ended_at(&self) -> Option<SystemTime> {
        self.ended_at
    }

    /// When the room was created.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// When the game started, if it has.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::tests::sample_quiz;

    fn room_with_questions(question_count: usize) -> Room {
        Room::new(
            RoomCode::new(),
            Arc::new(sample_quiz(question_count)),
            "Quizmaster",
            constants::room::DEFAULT_MAX_PLAYERS,
        )
        .unwrap()
    }

    fn no_alarm(_: AlarmMessage, _: Duration) {
        panic!("unexpected alarm scheduled");
    }

    fn correct_choice(room: &Room, index: usize) -> ChoiceId {
        room.quiz.question(index).unwrap().correct_choice_id().unwrap()
    }

    fn message_types(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .map(|event| {
                let value: serde_json::Value =
                    serde_json::from_str(&event.message.to_message()).unwrap();
                value["type"].as_str().unwrap().to_owned()
            })
            .collect()
    }

    #[test]
    fn test_room_rejects_empty_quiz() {
        let quiz = Arc::new(crate::quiz::QuizSnapshot {
            title: "Empty".to_owned(),
            questions: vec![],
        });
        let result = Room::new(RoomCode::new(), quiz, "Quizmaster", 10);
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));
    }

    #[test]
    fn test_join_announces_new_players() {
        let mut room = room_with_questions(1);
        let (_, events) = room.join("Alice").unwrap();
        assert_eq!(message_types(&events), ["player_joined"]);
    }

    #[test]
    fn test_join_respects_capacity() {
        let mut room =
            Room::new(RoomCode::new(), Arc::new(sample_quiz(1)), "Quizmaster", 2).unwrap();
        room.join("Alice").unwrap();
        room.join("Bob").unwrap();
        assert!(matches!(room.join("Carol"), Err(RoomError::RoomFull)));
    }

    #[test]
    fn test_join_only_while_waiting() {
        let mut room = room_with_questions(1);
        room.join("Alice").unwrap();
        let mut alarms = vec![];
        room.start(&mut |alarm, after| alarms.push((alarm, after)))
            .unwrap();
        assert!(matches!(
            room.join("Latecomer"),
            Err(RoomError::RoomNotJoinable)
        ));
    }

    #[test]
    fn test_start_requires_a_player() {
        let mut room = room_with_questions(1);
        assert!(matches!(
            room.start(&mut no_alarm),
            Err(RoomError::GameStateError)
        ));
    }

    #[test]
    fn test_start_opens_first_question_and_arms_timer() {
        let mut room = room_with_questions(2);
        room.join("Alice").unwrap();
        let mut alarms = vec![];
        let events = room
            .start(&mut |alarm, after| alarms.push((alarm, after)))
            .unwrap();
        assert_eq!(message_types(&events), ["game_started", "question"]);
        assert_eq!(room.status(), Status::Active);
        assert_eq!(room.current_question_index(), Some(0));
        assert_eq!(
            alarms,
            [(
                AlarmMessage::QuestionDeadline { question_index: 0 },
                Duration::from_secs(20)
            )]
        );
    }

    #[test]
    fn test_submit_notifies_host_of_answer_count() {
        let mut room = room_with_questions(1);
        let (alice, _) = room.join("Alice").unwrap();
        room.join("Bob").unwrap();
        let mut alarms = vec![];
        room.start(&mut |alarm, after| alarms.push((alarm, after)))
            .unwrap();

        let choice = correct_choice(&room, 0);
        let events = room
            .submit_answer(alice, 0, Some(choice), 5.0, &mut no_alarm)
            .unwrap();
        assert_eq!(message_types(&events), ["answer_count"]);
        assert!(matches!(
            events[0],
            Event {
                to: Recipient::Host,
                message: OutboundMessage::AnswerCount { count: 1 },
            }
        ));
    }

    #[test]
    fn test_all_answered_closes_question_early() {
        let mut room = room_with_questions(2);
        let (alice, _) = room.join("Alice").unwrap();
        let (bob, _) = room.join("Bob").unwrap();
        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();

        let choice = correct_choice(&room, 0);
        room.submit_answer(alice, 0, Some(choice), 5.0, &mut schedule)
            .unwrap();
        let events = room
            .submit_answer(bob, 0, None, 6.0, &mut schedule)
            .unwrap();

        assert_eq!(
            message_types(&events),
            ["answer_count", "question_ended", "leaderboard_update", "question"]
        );
        assert_eq!(room.current_question_index(), Some(1));
        assert_eq!(
            alarms.last(),
            Some(&(
                AlarmMessage::QuestionDeadline { question_index: 1 },
                Duration::from_secs(20)
            ))
        );
    }

    #[test]
    fn test_manual_advance_records_sentinels() {
        let mut room = room_with_questions(2);
        let (alice, _) = room.join("Alice").unwrap();
        let (bob, _) = room.join("Bob").unwrap();
        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();

        let choice = correct_choice(&room, 0);
        room.submit_answer(alice, 0, Some(choice), 5.0, &mut schedule)
            .unwrap();
        room.advance(&mut schedule).unwrap();

        assert_eq!(room.current_question_index(), Some(1));
        let sentinel = room.ledger.answer(0, bob).unwrap();
        assert_eq!(sentinel.points, 0);
        assert!(sentinel.choice.is_none());
        // the sentinel blocks any late submission for question 0
        assert!(matches!(
            room.submit_answer(bob, 0, Some(choice), 7.0, &mut schedule),
            Err(RoomError::StaleQuestion)
        ));
    }

    #[test]
    fn test_stale_alarm_is_ignored() {
        let mut room = room_with_questions(2);
        room.join("Alice").unwrap();
        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();
        room.advance(&mut schedule).unwrap();
        assert_eq!(room.current_question_index(), Some(1));

        // the question 0 deadline fires after the manual advance
        let events = room
            .receive_alarm(
                AlarmMessage::QuestionDeadline { question_index: 0 },
                &mut schedule,
            )
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(room.current_question_index(), Some(1));
    }

    #[test]
    fn test_deadline_alarm_advances() {
        let mut room = room_with_questions(1);
        room.join("Alice").unwrap();
        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();

        let events = room
            .receive_alarm(
                AlarmMessage::QuestionDeadline { question_index: 0 },
                &mut schedule,
            )
            .unwrap();
        assert_eq!(
            message_types(&events),
            ["question_ended", "leaderboard_update", "game_ended"]
        );
        assert_eq!(room.status(), Status::Completed);
    }

    #[test]
    fn test_host_end_mid_question_records_zeros() {
        let mut room = room_with_questions(3);
        let (alice, _) = room.join("Alice").unwrap();
        let (bob, _) = room.join("Bob").unwrap();
        let (carol, _) = room.join("Carol").unwrap();
        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();

        let choice = correct_choice(&room, 0);
        room.submit_answer(alice, 0, Some(choice), 5.0, &mut schedule)
            .unwrap();
        let events = room.end().unwrap();

        assert_eq!(message_types(&events), ["game_ended"]);
        assert_eq!(room.status(), Status::Completed);
        assert_eq!(room.ledger.answer(0, bob).unwrap().points, 0);
        assert_eq!(room.ledger.answer(0, carol).unwrap().points, 0);
        let board = room.leaderboard();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].player_id, alice);
    }

    #[test]
    fn test_submit_outside_active_rejected() {
        let mut room = room_with_questions(1);
        let (alice, _) = room.join("Alice").unwrap();
        assert!(matches!(
            room.submit_answer(alice, 0, None, 0.0, &mut no_alarm),
            Err(RoomError::GameStateError)
        ));

        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();
        room.end().unwrap();
        assert!(matches!(
            room.submit_answer(alice, 0, None, 0.0, &mut schedule),
            Err(RoomError::GameStateError)
        ));
    }

    #[test]
    fn test_cancel_is_terminal_and_idempotent() {
        let mut room = room_with_questions(1);
        room.join("Alice").unwrap();
        let events = room.cancel();
        assert_eq!(message_types(&events), ["error", "game_ended"]);
        assert_eq!(room.status(), Status::Cancelled);
        assert!(room.cancel().is_empty());
    }

    #[test]
    fn test_disconnect_keeps_record_and_announces() {
        let mut room = room_with_questions(1);
        let (alice, _) = room.join("Alice").unwrap();
        room.join("Bob").unwrap();
        let events = room.disconnect(alice);
        assert_eq!(message_types(&events), ["player_left"]);
        assert_eq!(room.players().len(), 2);
        assert!(!room.players().iter().find(|p| p.id == alice).unwrap().connected);

        // reconnect is silent
        room.reconnect(alice);
        assert!(room.players().iter().find(|p| p.id == alice).unwrap().connected);
    }

    #[test]
    fn test_host_disconnect_notifies_players_only() {
        let mut room = room_with_questions(1);
        room.join("Alice").unwrap();
        let events = room.disconnect(room.host_id());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to, Recipient::Players);
        assert!(!room.host_connected());
        room.reconnect(room.host_id());
        assert!(room.host_connected());
    }

    #[test]
    fn test_disconnected_player_skipped_by_sentinel_fill_only_if_absent() {
        let mut room = room_with_questions(2);
        let (alice, _) = room.join("Alice").unwrap();
        let (bob, _) = room.join("Bob").unwrap();
        let mut alarms = vec![];
        let mut schedule = |alarm: AlarmMessage, after: Duration| alarms.push((alarm, after));
        room.start(&mut schedule).unwrap();
        room.disconnect(bob);

        // with bob gone, alice answering means everyone answered
        let choice = correct_choice(&room, 0);
        let events = room
            .submit_answer(alice, 0, Some(choice), 2.0, &mut schedule)
            .unwrap();
        assert!(message_types(&events).contains(&"question".to_owned()));
        // bob has no entry for question 0, scored as zero on the board
        assert!(room.ledger.answer(0, bob).is_none());
        let board = room.leaderboard();
        let bob_row = board.iter().find(|e| e.player_id == bob).unwrap();
        assert_eq!(bob_row.total_score, 0);
        assert!(!bob_row.is_connected);
    }
}
