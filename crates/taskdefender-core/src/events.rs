//! Core events emitted by the controller's tick

use taskdefender_api::{SarcasticPrompt, VoiceCall};
use taskdefender_util::{PromptId, SessionId};

/// Events emitted while timers run
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// The focus countdown reached zero
    CountdownFinished,

    /// The open focus session was closed because its countdown finished
    FocusSessionEnded {
        session_id: SessionId,
        duration_secs: u64,
    },

    /// The user went idle and a prompt is now on screen
    PromptShown { prompt: SarcasticPrompt },

    /// A prompt timed out and was taken down
    PromptDismissed { prompt_id: PromptId },

    /// A simulated intervention call is ringing
    CallIncoming { call: VoiceCall },
}
