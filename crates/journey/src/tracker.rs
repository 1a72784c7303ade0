//! The active-session state machine.
//!
//! A [`SessionTracker`] is either idle or running exactly one session. While a
//! session runs, two tickers are alive: one refreshes elapsed time, the other
//! evaluates pace feedback. Both, and any fix stream attached through
//! [`follow`](SessionTracker::follow), share one cancellation token and are torn
//! down together by [`complete`](SessionTracker::complete) or
//! [`cancel`](SessionTracker::cancel).
//!
//! State is mutated only under a single lock, so updates from fix pumps and
//! tickers serialize. Cues are emitted after the lock is released.

use std::sync::{Arc, Weak};

use futures::StreamExt;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::QuestCatalog;
use crate::clock::{Clock, MonotonicClock};
use crate::config::TrackerConfig;
use crate::cues::{Cue, CueSink};
use crate::feedback::{self, FeedbackGate, PaceSignal};
use crate::geo_math::distance_km;
use crate::location::FixStream;
use crate::models::{ChallengeResult, Coordinate, LocationFix, Quest, Session};
use crate::outcome::{self, average_speed_mps};

/// Answer to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(Uuid),
    /// A session is already running; nothing changed.
    AlreadyActive,
    QuestNotFound,
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

struct ActiveSession {
    session: Session,
    required_speed_mps: f64,
    previous: Option<Coordinate>,
    gate: FeedbackGate,
    cancel: CancellationToken,
}

struct Shared {
    state: Mutex<Option<ActiveSession>>,
    snapshot: watch::Sender<Option<Session>>,
    clock: Arc<dyn Clock>,
    cues: Arc<dyn CueSink>,
    config: TrackerConfig,
    rng: Mutex<StdRng>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(active) = self.state.get_mut().take() {
            active.cancel.cancel();
        }
    }
}

fn elapsed_since(started_at_ms: i64, now_ms: i64) -> u64 {
    (now_ms - started_at_ms).max(0) as u64
}

/// Tracks at most one quest session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionTracker {
    shared: Arc<Shared>,
}

impl SessionTracker {
    pub fn new(config: TrackerConfig, cues: Arc<dyn CueSink>) -> Self {
        Self::with_clock(config, cues, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: TrackerConfig, cues: Arc<dyn CueSink>, clock: Arc<dyn Clock>) -> Self {
        let (snapshot, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(None),
                snapshot,
                clock,
                cues,
                config,
                rng: Mutex::new(StdRng::from_entropy()),
            }),
        }
    }

    /// Makes dialogue selection reproducible.
    pub fn seed_dialogue(&self, seed: u64) {
        *self.shared.rng.lock() = StdRng::seed_from_u64(seed);
    }

    /// Starts a session for `quest` unless one is already running.
    ///
    /// Tickers are spawned on the current tokio runtime. Without a runtime the
    /// session still works, but elapsed time only refreshes on updates and on
    /// completion, and no pace feedback is produced.
    pub fn start(&self, quest: &Quest) -> StartOutcome {
        let now = self.shared.clock.now_millis();
        let (id, token) = {
            let mut state = self.shared.state.lock();
            if let Some(active) = state.as_ref() {
                info!(
                    quest_id = %quest.id,
                    active_quest = %active.session.quest_id,
                    "Start rejected, a session is already active"
                );
                return StartOutcome::AlreadyActive;
            }

            let session = Session::begin(&quest.id, now);
            let id = session.id;
            let token = CancellationToken::new();
            self.shared.snapshot.send_replace(Some(session.clone()));
            *state = Some(ActiveSession {
                session,
                required_speed_mps: quest.targets.required_speed_mps,
                previous: None,
                gate: FeedbackGate::new(now, &self.shared.config.feedback),
                cancel: token.clone(),
            });
            (id, token)
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(elapsed_ticker(
                    Arc::downgrade(&self.shared),
                    id,
                    token.clone(),
                    self.shared.config.elapsed_tick(),
                ));
                handle.spawn(feedback_ticker(
                    Arc::downgrade(&self.shared),
                    id,
                    token,
                    self.shared.config.feedback.poll_interval(),
                ));
            }
            Err(_) => warn!("No tokio runtime, session tickers are disabled"),
        }

        info!(session_id = %id, quest_id = %quest.id, "Challenge started");
        self.emit(Cue::ChallengeStart);
        StartOutcome::Started(id)
    }

    /// Looks the quest up in `catalog` and starts it.
    pub fn start_by_id(&self, catalog: &dyn QuestCatalog, quest_id: &str) -> StartOutcome {
        match catalog.get(quest_id) {
            Some(quest) => self.start(&quest),
            None => {
                info!(quest_id, "Quest not found");
                StartOutcome::QuestNotFound
            }
        }
    }

    /// Feeds one fix into the active session. Returns false when idle.
    pub fn update(&self, fix: LocationFix) -> bool {
        debug_assert!(fix.is_valid(), "invalid fix passed to update: {fix:?}");
        if !fix.is_valid() {
            warn!(?fix, "Dropping invalid fix");
            return false;
        }
        self.apply(None, fix)
    }

    fn apply(&self, expected: Option<Uuid>, fix: LocationFix) -> bool {
        let now = self.shared.clock.now_millis();
        let mut state = self.shared.state.lock();
        let Some(active) = state.as_mut() else {
            debug!("Dropping fix, no active session");
            return false;
        };
        if expected.is_some_and(|id| id != active.session.id) {
            debug!("Dropping fix from a previous session");
            return false;
        }

        if let Some(previous) = active.previous {
            let delta = distance_km(previous, fix.coordinate());
            if delta.is_finite() && delta > 0.0 {
                active.session.distance_km += delta;
            }
        }
        active.previous = Some(fix.coordinate());

        let session = &mut active.session;
        session.route.push(fix);
        session.current_speed_mps = fix.speed_mps.max(0.0);
        session.elapsed_ms = elapsed_since(session.started_at_ms, now);
        debug!(
            distance_km = session.distance_km,
            speed_mps = session.current_speed_mps,
            fixes = session.route.len(),
            "Fix applied"
        );
        self.shared.snapshot.send_replace(Some(session.clone()));
        true
    }

    /// Pumps `stream` into the active session until the session ends.
    ///
    /// The stream is dropped together with the session's tickers. Returns
    /// false when idle or when no tokio runtime is available.
    pub fn follow(&self, stream: FixStream) -> bool {
        let Some((id, token)) = self
            .shared
            .state
            .lock()
            .as_ref()
            .map(|a| (a.session.id, a.cancel.clone()))
        else {
            return false;
        };

        let Ok(handle) = Handle::try_current() else {
            warn!("No tokio runtime, cannot follow a fix stream");
            return false;
        };
        handle.spawn(fix_pump(Arc::downgrade(&self.shared), id, token, stream));
        true
    }

    /// Ends the active session and evaluates it against `quest`.
    ///
    /// When idle, returns the canonical failed result instead.
    pub fn complete(&self, quest: &Quest) -> ChallengeResult {
        let now = self.shared.clock.now_millis();
        let Some(active) = self.shared.state.lock().take() else {
            info!(quest_id = %quest.id, "Nothing to complete, no active session");
            return outcome::no_session_result(&quest.id);
        };
        active.cancel.cancel();
        self.shared.snapshot.send_replace(None);

        if active.session.quest_id != quest.id {
            warn!(
                started = %active.session.quest_id,
                completed = %quest.id,
                "Completing a session with a different quest than it was started with"
            );
        }

        let elapsed = elapsed_since(active.session.started_at_ms, now);
        let (result, evaluation) = outcome::build_result(
            quest,
            elapsed,
            active.session.distance_km,
            &mut *self.shared.rng.lock(),
        );

        info!(
            session_id = %active.session.id,
            quest_id = %quest.id,
            completed = result.completed,
            time_ok = evaluation.time_ok,
            distance_ok = evaluation.distance_ok,
            speed_ok = evaluation.speed_ok,
            "Challenge finished in {:.1}s, {:.3} km at {:.2} m/s",
            elapsed as f64 / 1000.0,
            result.distance_km,
            result.average_speed_mps
        );
        self.emit(if result.completed {
            Cue::ChallengeSuccess
        } else {
            Cue::ChallengeFail
        });
        result
    }

    /// Discards the active session without a result. Returns whether one existed.
    pub fn cancel(&self) -> bool {
        let Some(active) = self.shared.state.lock().take() else {
            return false;
        };
        active.cancel.cancel();
        self.shared.snapshot.send_replace(None);
        info!(session_id = %active.session.id, "Challenge cancelled");
        true
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.lock().is_some()
    }

    /// Snapshot of the active session.
    pub fn session(&self) -> Option<Session> {
        self.shared.snapshot.borrow().clone()
    }

    /// Receives a new snapshot on every fix, tick and transition.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.shared.snapshot.subscribe()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.read(|s| s.elapsed_ms)
    }

    /// Instantaneous speed reported by the latest fix.
    pub fn current_speed_mps(&self) -> f64 {
        self.read(|s| s.current_speed_mps)
    }

    pub fn distance_km(&self) -> f64 {
        self.read(|s| s.distance_km)
    }

    /// Distance over elapsed time so far, measured against the clock.
    pub fn average_speed_mps(&self) -> f64 {
        let now = self.shared.clock.now_millis();
        self.shared.state.lock().as_ref().map_or(0.0, |a| {
            average_speed_mps(
                a.session.distance_km,
                elapsed_since(a.session.started_at_ms, now),
            )
        })
    }

    /// Classifies the current pace without waiting for the feedback cadence.
    pub fn pace_signal(&self) -> Option<PaceSignal> {
        let required = self
            .shared
            .state
            .lock()
            .as_ref()
            .map(|a| a.required_speed_mps)?;
        feedback::classify(
            self.average_speed_mps(),
            required,
            self.shared.config.feedback.warning_ratio,
        )
    }

    fn read<T: Default>(&self, f: impl FnOnce(&Session) -> T) -> T {
        self.shared
            .state
            .lock()
            .as_ref()
            .map(|a| f(&a.session))
            .unwrap_or_default()
    }

    fn emit(&self, cue: Cue) {
        self.shared.emit(cue);
    }
}

impl Shared {
    fn emit(&self, cue: Cue) {
        if let Err(e) = self.cues.emit(cue) {
            warn!(?cue, "Cue sink failed: {e}");
        }
    }

    /// Refreshes elapsed time. False once `id` is no longer the active session.
    fn refresh_elapsed(&self, id: Uuid) -> bool {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();
        let Some(active) = state.as_mut().filter(|a| a.session.id == id) else {
            return false;
        };
        let elapsed = elapsed_since(active.session.started_at_ms, now);
        active.session.elapsed_ms = elapsed;
        self.snapshot.send_modify(|snapshot| {
            if let Some(session) = snapshot {
                session.elapsed_ms = elapsed;
            }
        });
        true
    }

    /// Runs a gated pace check. `Err` once `id` is no longer active.
    fn check_pace(&self, id: Uuid) -> Result<Option<PaceSignal>, ()> {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();
        let active = state.as_mut().filter(|a| a.session.id == id).ok_or(())?;
        if !active.gate.try_pass(now) {
            return Ok(None);
        }
        let average = average_speed_mps(
            active.session.distance_km,
            elapsed_since(active.session.started_at_ms, now),
        );
        let signal = feedback::classify(
            average,
            active.required_speed_mps,
            self.config.feedback.warning_ratio,
        );
        debug!(average_speed_mps = average, ?signal, "Pace check");
        Ok(signal)
    }
}

async fn elapsed_ticker(shared: Weak<Shared>, id: Uuid, token: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                if !shared.refresh_elapsed(id) {
                    break;
                }
            }
        }
    }
    debug!(session_id = %id, "Elapsed ticker stopped");
}

async fn feedback_ticker(shared: Weak<Shared>, id: Uuid, token: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                match shared.check_pace(id) {
                    Ok(Some(signal)) => shared.emit(signal.cue()),
                    Ok(None) => {}
                    Err(()) => break,
                }
            }
        }
    }
    debug!(session_id = %id, "Feedback ticker stopped");
}

async fn fix_pump(shared: Weak<Shared>, id: Uuid, token: CancellationToken, mut stream: FixStream) {
    loop {
        let fix = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = stream.next() => match next {
                Some(fix) => fix,
                None => break,
            },
        };
        if !fix.is_valid() {
            warn!(?fix, "Dropping invalid fix from stream");
            continue;
        }
        let Some(shared) = shared.upgrade() else { break };
        if !(SessionTracker { shared }).apply(Some(id), fix) {
            break;
        }
    }
    debug!(session_id = %id, "Fix pump stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::clock::ManualClock;
    use crate::cues::RecordingCueSink;
    use crate::errors::CueError;
    use crate::geo_math::path_length_km;
    use crate::location::receiver_stream;
    use crate::models::QuestTargets;
    use crate::outcome::NO_SESSION_MESSAGE;
    use tokio::sync::mpsc;

    /// Kilometres per degree of latitude on the haversine sphere.
    const KM_PER_DEGREE: f64 = 6_371.0088 * std::f64::consts::PI / 180.0;

    fn jogger() -> Quest {
        Quest {
            id: "easy_jogger1".into(),
            targets: QuestTargets {
                distance_km: 1.0,
                time_min: 8,
                required_speed_mps: 2.1,
            },
            reward_gold: 25,
            reward_xp: 30,
            dialogue_win: vec!["You made it!".into()],
            dialogue_lose: vec!["Not this time.".into()],
            ..Default::default()
        }
    }

    /// Fixes heading due north, `step_km` apart.
    fn northbound(count: usize, step_km: f64, speed_mps: f64) -> Vec<LocationFix> {
        (0..count)
            .map(|i| {
                let lat = 51.0 + i as f64 * step_km / KM_PER_DEGREE;
                LocationFix::new(Coordinate::new(lat, 7.5), i as i64 * 1000, speed_mps)
            })
            .collect()
    }

    fn manual_tracker() -> (SessionTracker, Arc<ManualClock>, Arc<RecordingCueSink>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cues = Arc::new(RecordingCueSink::new());
        let tracker = SessionTracker::with_clock(TrackerConfig::default(), cues.clone(), clock.clone());
        tracker.seed_dialogue(9);
        (tracker, clock, cues)
    }

    #[test]
    fn test_second_start_is_rejected() {
        let (tracker, _, cues) = manual_tracker();
        assert!(tracker.start(&jogger()).is_started());
        assert_eq!(tracker.start(&jogger()), StartOutcome::AlreadyActive);
        assert_eq!(cues.count(Cue::ChallengeStart), 1);
    }

    #[test]
    fn test_start_by_unknown_id() {
        let (tracker, _, _) = manual_tracker();
        let catalog = StaticCatalog::builtin();
        assert_eq!(tracker.start_by_id(&catalog, "nope"), StartOutcome::QuestNotFound);
        assert!(!tracker.is_active());
        assert!(tracker.start_by_id(&catalog, "medium_runner").is_started());
        assert_eq!(tracker.session().unwrap().quest_id, "medium_runner");
    }

    #[test]
    fn test_complete_while_idle() {
        let (tracker, _, cues) = manual_tracker();
        let result = tracker.complete(&jogger());
        assert!(!result.completed);
        assert_eq!(result.time_taken_ms, 0);
        assert_eq!(result.distance_km, 0.0);
        assert_eq!(result.average_speed_mps, 0.0);
        assert_eq!((result.gold_earned, result.xp_earned), (0, 0));
        assert_eq!(result.npc_message, NO_SESSION_MESSAGE);
        assert!(cues.cues().is_empty());
    }

    #[test]
    fn test_update_while_idle_is_ignored() {
        let (tracker, _, _) = manual_tracker();
        assert!(!tracker.update(northbound(1, 0.0, 2.0)[0]));
        assert!(tracker.session().is_none());
        assert_eq!(tracker.distance_km(), 0.0);
    }

    #[test]
    fn test_distance_is_sum_of_pairs() {
        let (tracker, _, _) = manual_tracker();
        let fixes = northbound(11, 0.05, 2.0);
        tracker.start(&jogger());
        for fix in &fixes {
            assert!(tracker.update(*fix));
        }

        let session = tracker.session().unwrap();
        assert!((session.distance_km - path_length_km(&fixes)).abs() < 1e-9);
        assert!((session.distance_km - 0.5).abs() < 1e-6);
        assert_eq!(session.route, fixes);
    }

    #[test]
    fn test_replay_without_restart_keeps_accumulating() {
        let (tracker, _, _) = manual_tracker();
        let fixes = northbound(5, 0.1, 2.0);
        let once = path_length_km(&fixes);

        tracker.start(&jogger());
        fixes.iter().for_each(|f| {
            tracker.update(*f);
        });
        fixes.iter().for_each(|f| {
            tracker.update(*f);
        });
        // Second pass adds the jump from the last fix back to the first
        let jump = distance_km(fixes[4].coordinate(), fixes[0].coordinate());
        assert!((tracker.distance_km() - (2.0 * once + jump)).abs() < 1e-9);

        tracker.cancel();
        tracker.start(&jogger());
        fixes.iter().for_each(|f| {
            tracker.update(*f);
        });
        assert!((tracker.distance_km() - once).abs() < 1e-9);
    }

    #[test]
    fn test_backtracking_never_reduces_distance() {
        let (tracker, _, _) = manual_tracker();
        let mut fixes = northbound(4, 0.1, 2.0);
        fixes.reverse();
        fixes.extend(northbound(4, 0.1, 2.0));

        tracker.start(&jogger());
        let mut last = 0.0;
        for fix in fixes {
            tracker.update(fix);
            assert!(tracker.distance_km() >= last);
            last = tracker.distance_km();
        }
    }

    #[test]
    fn test_instantaneous_and_average_speed_are_distinct() {
        let (tracker, clock, _) = manual_tracker();
        tracker.start(&jogger());
        let fixes = northbound(2, 0.1, 5.0);
        tracker.update(fixes[0]);
        clock.advance(Duration::from_secs(100));
        tracker.update(fixes[1]);

        // Reported by the fix
        assert_eq!(tracker.current_speed_mps(), 5.0);
        // 100 m over 100 s
        assert!((tracker.average_speed_mps() - 1.0).abs() < 1e-6);
        assert_eq!(tracker.elapsed_ms(), 100_000);
    }

    #[test]
    fn test_jogger_quest_succeeds_in_seven_minutes() {
        let (tracker, clock, cues) = manual_tracker();
        let quest = jogger();
        tracker.start(&quest);
        for fix in northbound(11, 0.101, 2.4) {
            tracker.update(fix);
        }
        clock.advance(Duration::from_secs(7 * 60));

        let result = tracker.complete(&quest);
        assert!(result.completed);
        assert_eq!(result.time_taken_ms, 7 * 60 * 1000);
        assert!(result.average_speed_mps > 2.1);
        assert_eq!((result.gold_earned, result.xp_earned), (25, 30));
        assert_eq!(result.npc_message, "You made it!");
        assert_eq!(
            cues.cues(),
            vec![Cue::ChallengeStart, Cue::ChallengeSuccess]
        );
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_jogger_quest_fails_in_nine_minutes() {
        let (tracker, clock, cues) = manual_tracker();
        let quest = jogger();
        tracker.start(&quest);
        for fix in northbound(11, 0.101, 2.4) {
            tracker.update(fix);
        }
        clock.advance(Duration::from_secs(9 * 60));

        let result = tracker.complete(&quest);
        assert!(!result.completed);
        assert_eq!((result.gold_earned, result.xp_earned), (0, 0));
        assert_eq!(result.npc_message, "Not this time.");
        assert_eq!(cues.count(Cue::ChallengeFail), 1);
    }

    #[test]
    fn test_cancel_clears_history() {
        let (tracker, _, cues) = manual_tracker();
        tracker.start(&jogger());
        for fix in northbound(5, 0.1, 2.0) {
            tracker.update(fix);
        }
        assert!(tracker.cancel());
        assert!(!tracker.is_active());
        assert!(tracker.session().is_none());
        assert!(!tracker.cancel());

        tracker.start(&jogger());
        let session = tracker.session().unwrap();
        assert_eq!(session.distance_km, 0.0);
        assert!(session.route.is_empty());
        assert_eq!(cues.count(Cue::ChallengeSuccess) + cues.count(Cue::ChallengeFail), 0);
    }

    #[test]
    fn test_pace_signal_on_demand() {
        let (tracker, clock, _) = manual_tracker();
        assert_eq!(tracker.pace_signal(), None);

        tracker.start(&jogger());
        let fixes = northbound(2, 0.01, 1.0);
        tracker.update(fixes[0]);
        tracker.update(fixes[1]);
        clock.advance(Duration::from_secs(10));
        // 10 m in 10 s
        assert_eq!(tracker.pace_signal(), Some(PaceSignal::Warning));
    }

    #[test]
    fn test_huge_time_limit_from_catalog() {
        let json = r#"[{ "id": "long", "target_distance_km": 1.0, "target_time_min": 400000000000000 }]"#;
        let catalog = StaticCatalog::from_json_str(json).unwrap();
        let (tracker, clock, _) = manual_tracker();

        assert!(tracker.start_by_id(&catalog, "long").is_started());
        for fix in northbound(11, 0.101, 2.4) {
            tracker.update(fix);
        }
        clock.advance(Duration::from_secs(3_600));
        let result = tracker.complete(&catalog.get("long").unwrap());
        assert!(result.completed);
    }

    struct BrokenSink {
        attempts: parking_lot::Mutex<Vec<Cue>>,
    }

    impl CueSink for BrokenSink {
        fn emit(&self, cue: Cue) -> Result<(), CueError> {
            self.attempts.lock().push(cue);
            Err(CueError("speaker unplugged".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_cue_sink_is_contained() {
        let sink = Arc::new(BrokenSink {
            attempts: parking_lot::Mutex::new(Vec::new()),
        });
        let clock = Arc::new(MonotonicClock::starting_at(0));
        let tracker = SessionTracker::with_clock(TrackerConfig::default(), sink.clone(), clock);
        let quest = jogger();

        assert!(tracker.start(&quest).is_started());
        let fixes = northbound(2, 0.01, 1.0);
        tracker.update(fixes[0]);
        tracker.update(fixes[1]);

        // Feedback ticker keeps running after a failed emit
        tokio::time::sleep(Duration::from_millis(20_050)).await;
        assert!(tracker.is_active());
        assert_eq!(
            sink.attempts.lock().iter().filter(|&&c| c == Cue::SpeedWarning).count(),
            2
        );

        let result = tracker.complete(&quest);
        assert!(!result.completed);
        assert_eq!(sink.attempts.lock().last(), Some(&Cue::ChallengeFail));
        assert!(!tracker.is_active());
    }

    fn paused_tracker() -> (SessionTracker, Arc<RecordingCueSink>) {
        let cues = Arc::new(RecordingCueSink::new());
        let clock = Arc::new(MonotonicClock::starting_at(0));
        let tracker = SessionTracker::with_clock(TrackerConfig::default(), cues.clone(), clock);
        (tracker, cues)
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_ticker_publishes() {
        let (tracker, _) = paused_tracker();
        let mut rx = tracker.subscribe();
        tracker.start(&jogger());

        tokio::time::sleep(Duration::from_millis(1_050)).await;
        let elapsed = tracker.elapsed_ms();
        assert!((1_000..=1_050).contains(&elapsed), "elapsed {elapsed}");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().elapsed_ms, elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_waits_ten_seconds_then_warns() {
        let (tracker, cues) = paused_tracker();
        tracker.start(&jogger());
        let fixes = northbound(2, 0.01, 1.0);
        tracker.update(fixes[0]);
        tracker.update(fixes[1]);

        tokio::time::sleep(Duration::from_millis(9_950)).await;
        assert_eq!(cues.count(Cue::SpeedWarning), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cues.count(Cue::SpeedWarning), 1);

        // Poll at 15 s is gated, next check at 20 s
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cues.count(Cue::SpeedWarning), 1);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cues.count(Cue::SpeedWarning), 2);
        assert_eq!(cues.count(Cue::SpeedGood), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_good_pace() {
        let (tracker, cues) = paused_tracker();
        tracker.start(&jogger());
        let fixes = northbound(2, 0.025, 2.5);
        tracker.update(fixes[0]);
        tracker.update(fixes[1]);

        tokio::time::sleep(Duration::from_millis(10_050)).await;
        assert_eq!(cues.count(Cue::SpeedGood), 1);
        assert_eq!(cues.count(Cue::SpeedWarning), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tickers_after_complete() {
        let (tracker, cues) = paused_tracker();
        tracker.start(&jogger());
        let fixes = northbound(2, 0.01, 1.0);
        tracker.update(fixes[0]);
        tracker.update(fixes[1]);
        tracker.complete(&jogger());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(cues.count(Cue::SpeedWarning), 0);
        assert!(tracker.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_pumps_and_tears_down() {
        let (tracker, _) = paused_tracker();
        assert!(!tracker.follow(receiver_stream(mpsc::channel(1).1)));

        tracker.start(&jogger());
        let (tx, rx) = mpsc::channel(8);
        assert!(tracker.follow(receiver_stream(rx)));

        for fix in northbound(3, 0.1, 2.0) {
            tx.send(fix).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(tracker.session().unwrap().route.len(), 3);

        tracker.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(tx.is_closed());

        // A new session is not fed by the old subscription
        tracker.start(&jogger());
        assert!(tx.send(northbound(1, 0.0, 2.0)[0]).await.is_err());
        assert!(tracker.session().unwrap().route.is_empty());
    }
}
