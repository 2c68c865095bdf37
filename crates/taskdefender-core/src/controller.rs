//! Application controller: store, persistence and timers in one place
//!
//! The controller is the only writer. It applies actions to the store,
//! persists the tree after every applied action, and drives the timers.

use rand::Rng;
use std::time::Duration;
use taskdefender_api::{
    Action, AppState, Dispatch, SarcasticPrompt, SessionKind, StoreEvent, Trigger, VoiceCall,
};
use taskdefender_config::TimerConfig;
use taskdefender_store::{StatePersistence, StoreError};
use taskdefender_util::{
    whole_seconds_between, CallId, MonotonicInstant, SessionId, TaskId, Timestamp,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{generate_prompt, AppStore, CoreEvent, CountdownTick, FocusCountdown, TimerSet};

/// Controller errors
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The action was applied in memory but writing it out failed
    #[error("State updated but not saved: {0}")]
    Persist(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Where the state came from at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateSource {
    Primary,
    /// The primary copy was unreadable; the backup was used
    Backup,
    /// Nothing usable was stored; defaults were used
    Fresh,
}

pub struct AppController {
    store: AppStore,
    persistence: StatePersistence,
    timer_config: TimerConfig,
    timers: TimerSet,
}

impl AppController {
    pub fn new(
        persistence: StatePersistence,
        timer_config: TimerConfig,
        now_mono: MonotonicInstant,
    ) -> Self {
        let timers = TimerSet::new(&timer_config, now_mono);
        Self {
            store: AppStore::default(),
            persistence,
            timer_config,
            timers,
        }
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn persistence(&self) -> &StatePersistence {
        &self.persistence
    }

    /// Load persisted state into the store. A damaged primary copy falls back
    /// to the backup; if neither is usable the defaults stay in place.
    pub fn hydrate(&mut self, now: Timestamp) -> HydrateSource {
        let (state, source) = match self.persistence.load() {
            Ok(Some(state)) => (state, HydrateSource::Primary),
            Ok(None) => (AppState::default(), HydrateSource::Fresh),
            Err(e) => {
                warn!(error = %e, "Stored state unreadable, trying backup");
                match self.persistence.restore_from_backup() {
                    Ok(Some(state)) => (state, HydrateSource::Backup),
                    Ok(None) => (AppState::default(), HydrateSource::Fresh),
                    Err(e) => {
                        warn!(error = %e, "Backup unreadable, starting fresh");
                        (AppState::default(), HydrateSource::Fresh)
                    }
                }
            }
        };

        self.store.dispatch(Action::LoadState(Box::new(state)), now);
        info!(source = ?source, tasks = self.state().tasks.len(), "State hydrated");
        source
    }

    /// Apply an action and persist the result. Ignored actions leave the
    /// state unchanged and are not written.
    ///
    /// On a write failure the in-memory state keeps the change and
    /// [`ControllerError::Persist`] is returned.
    pub fn dispatch(&mut self, action: Action, now: Timestamp) -> ControllerResult<Dispatch> {
        let outcome = self.store.dispatch(action, now);
        if outcome.is_applied() {
            self.persistence
                .save(self.store.state(), now)
                .map_err(ControllerError::Persist)?;
        }
        Ok(outcome)
    }

    pub fn export(&self, now: Timestamp) -> ControllerResult<String> {
        Ok(self.persistence.export(now)?)
    }

    /// Replace the state with the contents of an export document
    pub fn import(&mut self, text: &str, now: Timestamp) -> ControllerResult<Dispatch> {
        let state = self.persistence.import(text, now)?;
        Ok(self.store.dispatch(Action::LoadState(Box::new(state)), now))
    }

    /// Wipe persisted data and reset the in-memory state to defaults
    pub fn clear(&mut self, now: Timestamp) -> ControllerResult<()> {
        self.persistence.clear_all()?;
        self.store
            .dispatch(Action::LoadState(Box::new(AppState::default())), now);
        Ok(())
    }

    /// Load the backup copy and make it current. Returns false when there is
    /// no backup.
    pub fn restore_from_backup(&mut self, now: Timestamp) -> ControllerResult<bool> {
        let Some(state) = self.persistence.restore_from_backup()? else {
            return Ok(false);
        };
        self.dispatch(Action::LoadState(Box::new(state)), now)?;
        Ok(true)
    }

    // Focus countdown

    /// Fresh timers after a teardown, so a new focus run is driven again
    fn rearm(&mut self, now_mono: MonotonicInstant) {
        if !self.timers.is_active() {
            debug!("Re-arming timers");
            self.timers = TimerSet::new(&self.timer_config, now_mono);
        }
    }

    fn full_length(&self, kind: SessionKind) -> Duration {
        FocusCountdown::for_session(
            kind,
            &self.store.state().settings.focus,
            self.timer_config.deep_work_length,
        )
        .length()
    }

    /// Open a focus session and start its countdown
    pub fn start_focus(
        &mut self,
        task_id: Option<TaskId>,
        kind: SessionKind,
        now_mono: MonotonicInstant,
        now: Timestamp,
    ) -> ControllerResult<Dispatch> {
        self.rearm(now_mono);
        let outcome = self.dispatch(Action::StartFocusSession { task_id, kind }, now)?;
        if let Dispatch::Applied(StoreEvent::FocusSessionStarted { session_id }) = &outcome {
            let mut countdown =
                FocusCountdown::new(self.full_length(kind)).with_session(session_id.clone());
            countdown.start(now_mono);
            self.timers.countdown = Some(countdown);
        }
        Ok(outcome)
    }

    /// Attach a countdown to a session left open by an earlier run. The
    /// countdown covers what remains of the session's full length at `now`;
    /// an overdue session finishes on the next tick.
    pub fn adopt_open_session(
        &mut self,
        now_mono: MonotonicInstant,
        now: Timestamp,
    ) -> Option<SessionId> {
        let (id, kind, start) = self
            .store
            .state()
            .active_session
            .as_ref()
            .map(|s| (s.id.clone(), s.kind, s.start_time))?;

        self.rearm(now_mono);
        let elapsed = Duration::from_secs(whole_seconds_between(start, now));
        let remaining = self.full_length(kind).saturating_sub(elapsed);

        let mut countdown = FocusCountdown::new(remaining).with_session(id.clone());
        countdown.start(now_mono);
        self.timers.countdown = Some(countdown);

        info!(session_id = %id, remaining_secs = remaining.as_secs(), "Adopted open focus session");
        Some(id)
    }

    /// Replace the countdown of the open session, e.g. for a custom length.
    /// An unbound countdown is bound to the session open right now.
    pub fn set_countdown(&mut self, countdown: FocusCountdown) {
        let countdown = match (countdown.session_id(), &self.store.state().active_session) {
            (None, Some(open)) => countdown.with_session(open.id.clone()),
            _ => countdown,
        };
        self.timers.countdown = Some(countdown);
    }

    pub fn countdown(&self) -> Option<&FocusCountdown> {
        self.timers.countdown.as_ref()
    }

    pub fn pause_focus(&mut self, now_mono: MonotonicInstant) {
        if let Some(countdown) = self.timers.countdown.as_mut() {
            countdown.pause(now_mono);
        }
    }

    pub fn resume_focus(&mut self, now_mono: MonotonicInstant) {
        if let Some(countdown) = self.timers.countdown.as_mut() {
            countdown.resume(now_mono);
        }
    }

    /// Close the open session early and drop its countdown
    pub fn stop_focus(&mut self, now: Timestamp) -> ControllerResult<Option<Dispatch>> {
        self.timers.countdown = None;
        let Some(id) = self.store.state().active_session.as_ref().map(|s| s.id.clone()) else {
            return Ok(None);
        };
        self.dispatch(Action::EndFocusSession(id), now).map(Some)
    }

    // Prompts and calls

    pub fn record_activity(&mut self, now_mono: MonotonicInstant) {
        self.timers.idle.record_activity(now_mono);
    }

    pub fn current_prompt(&self) -> Option<&SarcasticPrompt> {
        self.timers.prompt.current()
    }

    pub fn dismiss_prompt(&mut self) -> Option<SarcasticPrompt> {
        self.timers.prompt.dismiss()
    }

    pub fn current_call(&self) -> Option<&VoiceCall> {
        self.timers.intervention.current()
    }

    pub fn answer_call(&mut self, id: &CallId) -> bool {
        self.timers.intervention.answer(id)
    }

    pub fn decline_call(&mut self, id: &CallId) -> Option<VoiceCall> {
        self.timers.intervention.decline(id)
    }

    pub fn end_call(&mut self, id: &CallId) -> Option<VoiceCall> {
        self.timers.intervention.end(id)
    }

    /// Advance every timer. Countdown expiry closes the open session; going
    /// idle puts up a procrastination prompt in the user's chosen persona
    /// (unless sarcasm is switched off); interventions ring at random.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now_mono: MonotonicInstant,
        now: Timestamp,
        rng: &mut R,
    ) -> ControllerResult<Vec<CoreEvent>> {
        let mut events = Vec::new();
        if !self.timers.is_active() {
            return Ok(events);
        }

        let mut finished = None;
        if let Some(countdown) = self.timers.countdown.as_mut() {
            if countdown.tick(now_mono) == CountdownTick::Finished {
                finished = Some(countdown.session_id().cloned());
            }
        }
        if let Some(bound_to) = finished {
            events.push(CoreEvent::CountdownFinished);
            // Only the session this countdown was timing is closed
            let open = self.store.state().active_session.as_ref().map(|s| s.id.clone());
            if let Some(id) = open.filter(|id| bound_to.as_ref() == Some(id)) {
                if let Dispatch::Applied(StoreEvent::FocusSessionEnded {
                    session_id,
                    duration_secs,
                }) = self.dispatch(Action::EndFocusSession(id), now)?
                {
                    events.push(CoreEvent::FocusSessionEnded {
                        session_id,
                        duration_secs,
                    });
                }
            }
        }

        if let Some(prompt) = self.timers.prompt.tick(now_mono) {
            debug!(prompt_id = %prompt.id, "Prompt timed out");
            events.push(CoreEvent::PromptDismissed {
                prompt_id: prompt.id,
            });
        }

        if self.timers.idle.poll(now_mono) {
            let sarcasm = &self.store.state().settings.sarcasm;
            if sarcasm.enabled {
                let prompt = generate_prompt(Trigger::Procrastination, sarcasm.persona, rng);
                self.timers.prompt.show(prompt.clone(), now_mono);
                events.push(CoreEvent::PromptShown { prompt });
            }
        }

        let user_id = self.store.state().user_id();
        if let Some(call) = self.timers.intervention.tick(now_mono, now, &user_id, rng) {
            events.push(CoreEvent::CallIncoming { call });
        }

        Ok(events)
    }

    /// Cancel every timer. Later ticks do nothing.
    pub fn teardown(&mut self) {
        self.timers.teardown();
    }
}
