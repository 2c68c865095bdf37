//! Tick-driven timers: focus countdown, idle detection, prompt display and
//! simulated interventions
//!
//! None of these spawn threads. The owner calls `tick`/`poll` with the
//! current monotonic time and acts on what comes back.

use rand::Rng;
use std::time::Duration;
use taskdefender_api::{CallResponse, FocusSettings, SarcasticPrompt, SessionKind, VoiceCall};
use taskdefender_config::TimerConfig;
use taskdefender_util::{CallId, MonotonicInstant, SessionId, Timestamp, UserId};
use tracing::{debug, info};

use crate::generate_call;

/// Countdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Ready,
    Running { deadline: MonotonicInstant },
    Paused { remaining: Duration },
    Finished,
}

/// What a countdown tick observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Not running (ready, paused or already finished)
    Inactive,
    Remaining(Duration),
    /// Reached zero on this tick. Reported once.
    Finished,
}

/// Focus countdown with start, pause, resume and reset. Optionally bound to
/// the focus session it times.
#[derive(Debug, Clone)]
pub struct FocusCountdown {
    length: Duration,
    state: CountdownState,
    session_id: Option<SessionId>,
}

impl FocusCountdown {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            state: CountdownState::Ready,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Countdown length for a session kind: pomodoro and break lengths come
    /// from the user's focus settings, deep work from configuration.
    pub fn for_session(kind: SessionKind, focus: &FocusSettings, deep_work: Duration) -> Self {
        let length = match kind {
            SessionKind::Pomodoro => minutes(focus.pomodoro_length),
            SessionKind::Break => minutes(focus.short_break_length),
            SessionKind::DeepWork => deep_work,
        };
        Self::new(length)
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    /// Start from ready, or resume from paused
    pub fn start(&mut self, now: MonotonicInstant) {
        self.state = match self.state {
            CountdownState::Ready => CountdownState::Running {
                deadline: now + self.length,
            },
            CountdownState::Paused { remaining } => CountdownState::Running {
                deadline: now + remaining,
            },
            other => other,
        };
    }

    pub fn pause(&mut self, now: MonotonicInstant) {
        if let CountdownState::Running { deadline } = self.state {
            self.state = CountdownState::Paused {
                remaining: deadline.saturating_duration_until(now),
            };
        }
    }

    pub fn resume(&mut self, now: MonotonicInstant) {
        if matches!(self.state, CountdownState::Paused { .. }) {
            self.start(now);
        }
    }

    /// Back to the full length, not running
    pub fn reset(&mut self) {
        self.state = CountdownState::Ready;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, CountdownState::Running { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.state == CountdownState::Finished
    }

    pub fn remaining(&self, now: MonotonicInstant) -> Duration {
        match self.state {
            CountdownState::Ready => self.length,
            CountdownState::Running { deadline } => deadline.saturating_duration_until(now),
            CountdownState::Paused { remaining } => remaining,
            CountdownState::Finished => Duration::ZERO,
        }
    }

    pub fn tick(&mut self, now: MonotonicInstant) -> CountdownTick {
        let CountdownState::Running { deadline } = self.state else {
            return CountdownTick::Inactive;
        };

        if now >= deadline {
            self.state = CountdownState::Finished;
            return CountdownTick::Finished;
        }
        CountdownTick::Remaining(deadline.saturating_duration_until(now))
    }
}

fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}

/// Detects inactivity. Fires once per idle period; any recorded activity
/// starts a new period.
#[derive(Debug, Clone)]
pub struct IdleDetector {
    threshold: Duration,
    check_interval: Duration,
    last_activity: MonotonicInstant,
    next_check: MonotonicInstant,
    fired: bool,
}

impl IdleDetector {
    pub fn new(threshold: Duration, check_interval: Duration, now: MonotonicInstant) -> Self {
        Self {
            threshold,
            check_interval,
            last_activity: now,
            next_check: now + check_interval,
            fired: false,
        }
    }

    pub fn record_activity(&mut self, now: MonotonicInstant) {
        self.last_activity = now;
        self.fired = false;
    }

    pub fn is_idle(&self) -> bool {
        self.fired
    }

    /// Returns true when this check finds the user idle for the first time
    /// in the current period. Between check intervals it always returns false.
    pub fn poll(&mut self, now: MonotonicInstant) -> bool {
        if now < self.next_check {
            return false;
        }
        self.next_check = now + self.check_interval;

        if !self.fired && now.duration_since(self.last_activity) > self.threshold {
            self.fired = true;
            debug!(
                idle_secs = now.duration_since(self.last_activity).as_secs(),
                "User went idle"
            );
            return true;
        }
        false
    }
}

/// The prompt currently on screen, taken down automatically after a while
#[derive(Debug, Clone)]
pub struct PromptSlot {
    display_for: Duration,
    current: Option<(SarcasticPrompt, MonotonicInstant)>,
}

impl PromptSlot {
    pub fn new(display_for: Duration) -> Self {
        Self {
            display_for,
            current: None,
        }
    }

    /// Show `prompt`, replacing whatever was shown
    pub fn show(&mut self, prompt: SarcasticPrompt, now: MonotonicInstant) {
        self.current = Some((prompt, now + self.display_for));
    }

    pub fn current(&self) -> Option<&SarcasticPrompt> {
        self.current.as_ref().map(|(prompt, _)| prompt)
    }

    pub fn dismiss(&mut self) -> Option<SarcasticPrompt> {
        self.current.take().map(|(prompt, _)| prompt)
    }

    /// Takes the prompt down once its display time is over
    pub fn tick(&mut self, now: MonotonicInstant) -> Option<SarcasticPrompt> {
        match &self.current {
            Some((_, until)) if now >= *until => self.dismiss(),
            _ => None,
        }
    }
}

/// Rolls for a simulated intervention call at a fixed interval
#[derive(Debug, Clone)]
pub struct InterventionSimulator {
    interval: Duration,
    probability: f64,
    next_check: MonotonicInstant,
    current: Option<VoiceCall>,
}

impl InterventionSimulator {
    pub fn new(interval: Duration, probability: f64, now: MonotonicInstant) -> Self {
        Self {
            interval,
            probability: probability.clamp(0.0, 1.0),
            next_check: now + interval,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&VoiceCall> {
        self.current.as_ref()
    }

    /// On each interval boundary, draws against the probability and rings
    /// with a new call on success. No new call rings while one is up.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now_mono: MonotonicInstant,
        now: Timestamp,
        user_id: &UserId,
        rng: &mut R,
    ) -> Option<VoiceCall> {
        if now_mono < self.next_check {
            return None;
        }
        self.next_check = now_mono + self.interval;

        if self.current.is_some() || !rng.gen_bool(self.probability) {
            return None;
        }

        let call = generate_call(rng, user_id.clone(), now);
        info!(call_id = %call.id, character = %call.character, "Intervention call");
        self.current = Some(call.clone());
        Some(call)
    }

    fn matching(&mut self, id: &CallId) -> Option<&mut VoiceCall> {
        self.current.as_mut().filter(|c| &c.id == id)
    }

    /// Pick up the ringing call. Returns false if `id` is not the current call.
    pub fn answer(&mut self, id: &CallId) -> bool {
        match self.matching(id) {
            Some(call) => {
                call.user_response = Some(CallResponse::Answered);
                true
            }
            None => false,
        }
    }

    /// Decline the call. Returns the finished call.
    pub fn decline(&mut self, id: &CallId) -> Option<VoiceCall> {
        let call = self.matching(id)?;
        call.user_response = Some(CallResponse::Declined);
        call.completed = true;
        self.current.take()
    }

    /// Hang up. Returns the finished call.
    pub fn end(&mut self, id: &CallId) -> Option<VoiceCall> {
        let call = self.matching(id)?;
        call.completed = true;
        self.current.take()
    }
}

/// Timers belonging to one running view. After `teardown` every tick is a
/// no-op.
#[derive(Debug, Clone)]
pub struct TimerSet {
    pub countdown: Option<FocusCountdown>,
    pub idle: IdleDetector,
    pub prompt: PromptSlot,
    pub intervention: InterventionSimulator,
    torn_down: bool,
}

impl TimerSet {
    pub fn new(config: &TimerConfig, now: MonotonicInstant) -> Self {
        Self {
            countdown: None,
            idle: IdleDetector::new(config.idle_threshold, config.idle_check_interval, now),
            prompt: PromptSlot::new(config.prompt_display),
            intervention: InterventionSimulator::new(
                config.intervention_check_interval,
                config.intervention_probability,
                now,
            ),
            torn_down: false,
        }
    }

    /// Cancel everything. Pending prompts and calls are dropped.
    pub fn teardown(&mut self) {
        self.countdown = None;
        self.prompt.dismiss();
        self.intervention.current = None;
        self.torn_down = true;
        debug!("Timers torn down");
    }

    pub fn is_active(&self) -> bool {
        !self.torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use taskdefender_api::{Persona, Trigger};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn countdown_runs_to_zero_once() {
        let t0 = MonotonicInstant::now();
        let mut countdown = FocusCountdown::new(secs(60));

        assert_eq!(countdown.tick(t0), CountdownTick::Inactive);
        countdown.start(t0);
        assert_eq!(countdown.tick(t0 + secs(20)), CountdownTick::Remaining(secs(40)));
        assert_eq!(countdown.tick(t0 + secs(60)), CountdownTick::Finished);
        assert_eq!(countdown.tick(t0 + secs(61)), CountdownTick::Inactive);
        assert!(countdown.is_finished());
        assert_eq!(countdown.remaining(t0 + secs(90)), Duration::ZERO);
    }

    #[test]
    fn countdown_pause_and_resume() {
        let t0 = MonotonicInstant::now();
        let mut countdown = FocusCountdown::new(secs(100));
        countdown.start(t0);

        countdown.pause(t0 + secs(30));
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining(t0 + secs(500)), secs(70));
        assert_eq!(countdown.tick(t0 + secs(500)), CountdownTick::Inactive);

        countdown.resume(t0 + secs(500));
        assert_eq!(countdown.tick(t0 + secs(560)), CountdownTick::Remaining(secs(10)));
        assert_eq!(countdown.tick(t0 + secs(570)), CountdownTick::Finished);
    }

    #[test]
    fn countdown_reset() {
        let t0 = MonotonicInstant::now();
        let mut countdown = FocusCountdown::new(secs(100));
        countdown.start(t0);
        countdown.reset();

        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining(t0 + secs(50)), secs(100));
    }

    #[test]
    fn countdown_keeps_its_session_across_reset() {
        let t0 = MonotonicInstant::now();
        let mut countdown = FocusCountdown::new(secs(10)).with_session(SessionId::new("s-1"));
        countdown.start(t0);
        countdown.reset();

        assert_eq!(countdown.session_id().map(SessionId::as_str), Some("s-1"));
        assert!(FocusCountdown::new(secs(10)).session_id().is_none());
    }

    #[test]
    fn zero_length_countdown_finishes_immediately() {
        let t0 = MonotonicInstant::now();
        let mut countdown = FocusCountdown::new(Duration::ZERO);
        countdown.start(t0);
        assert_eq!(countdown.tick(t0), CountdownTick::Finished);
    }

    #[test]
    fn countdown_length_per_session_kind() {
        let focus = FocusSettings::default();
        let deep = secs(3600);

        assert_eq!(
            FocusCountdown::for_session(SessionKind::Pomodoro, &focus, deep).length(),
            secs(25 * 60)
        );
        assert_eq!(
            FocusCountdown::for_session(SessionKind::Break, &focus, deep).length(),
            secs(5 * 60)
        );
        assert_eq!(
            FocusCountdown::for_session(SessionKind::DeepWork, &focus, deep).length(),
            deep
        );
    }

    #[test]
    fn idle_fires_once_per_period() {
        let t0 = MonotonicInstant::now();
        let mut idle = IdleDetector::new(secs(300), secs(30), t0);

        // Checks only happen on the interval
        assert!(!idle.poll(t0 + secs(10)));
        assert!(!idle.poll(t0 + secs(300)));
        assert!(idle.poll(t0 + secs(330)));
        assert!(idle.is_idle());
        assert!(!idle.poll(t0 + secs(360)));
        assert!(!idle.poll(t0 + secs(900)));

        idle.record_activity(t0 + secs(1000));
        assert!(!idle.is_idle());
        assert!(!idle.poll(t0 + secs(1200)));
        assert!(idle.poll(t0 + secs(1301)));
    }

    #[test]
    fn prompt_auto_dismisses() {
        let t0 = MonotonicInstant::now();
        let mut slot = PromptSlot::new(secs(10));
        let prompt = crate::generate_prompt(
            Trigger::Procrastination,
            Persona::SarcasticFriend,
            &mut StdRng::seed_from_u64(0),
        );

        slot.show(prompt.clone(), t0);
        assert_eq!(slot.tick(t0 + secs(9)), None);
        assert_eq!(slot.current(), Some(&prompt));
        assert_eq!(slot.tick(t0 + secs(10)), Some(prompt));
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn intervention_certain_and_impossible() {
        let t0 = MonotonicInstant::now();
        let now = taskdefender_util::now();
        let user = UserId::new("u");
        let mut rng = StdRng::seed_from_u64(5);

        let mut never = InterventionSimulator::new(secs(300), 0.0, t0);
        for i in 1..=10 {
            assert!(never.tick(t0 + secs(300 * i), now, &user, &mut rng).is_none());
        }

        let mut always = InterventionSimulator::new(secs(300), 1.0, t0);
        assert!(always.tick(t0 + secs(299), now, &user, &mut rng).is_none());
        let call = always.tick(t0 + secs(300), now, &user, &mut rng).unwrap();
        assert_eq!(always.current(), Some(&call));

        // Busy line: nothing new rings while a call is up
        assert!(always.tick(t0 + secs(600), now, &user, &mut rng).is_none());
    }

    #[test]
    fn call_answer_decline_end() {
        let t0 = MonotonicInstant::now();
        let now = taskdefender_util::now();
        let user = UserId::new("u");
        let mut rng = StdRng::seed_from_u64(5);
        let mut sim = InterventionSimulator::new(secs(1), 1.0, t0);

        let call = sim.tick(t0 + secs(1), now, &user, &mut rng).unwrap();
        assert!(!sim.answer(&CallId::new("other")));
        assert!(sim.answer(&call.id));
        assert_eq!(
            sim.current().and_then(|c| c.user_response),
            Some(CallResponse::Answered)
        );

        let ended = sim.end(&call.id).unwrap();
        assert!(ended.completed);
        assert!(sim.current().is_none());

        let call = sim.tick(t0 + secs(2), now, &user, &mut rng).unwrap();
        let declined = sim.decline(&call.id).unwrap();
        assert!(declined.completed);
        assert_eq!(declined.user_response, Some(CallResponse::Declined));
    }

    #[test]
    fn teardown_cancels_everything() {
        let t0 = MonotonicInstant::now();
        let mut timers = TimerSet::new(&TimerConfig::default(), t0);
        let mut countdown = FocusCountdown::new(secs(10));
        countdown.start(t0);
        timers.countdown = Some(countdown);

        timers.teardown();
        assert!(!timers.is_active());
        assert!(timers.countdown.is_none());
        assert!(timers.prompt.current().is_none());
    }
}
