//! Persona prompts and simulated intervention calls
//!
//! Every random choice takes an explicit [`Rng`] so callers (and tests) decide
//! where randomness comes from.

use rand::Rng;
use rand::seq::SliceRandom;
use taskdefender_api::{
    CallCharacter, Persona, PromptCategory, SarcasticPrompt, Trigger, VoiceCall,
};
use taskdefender_util::{CallId, PromptId, Timestamp, UserId};

/// Display information for a persona
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaInfo {
    pub id: Persona,
    pub name: &'static str,
    pub description: &'static str,
}

const PERSONAS: [PersonaInfo; 4] = [
    PersonaInfo {
        id: Persona::DrillSergeant,
        name: "Drill Sergeant",
        description: "Tough love with military precision. No excuses, just results.",
    },
    PersonaInfo {
        id: Persona::DisappointedParent,
        name: "Disappointed Parent",
        description: "Gentle guilt trips and loving disappointment to motivate you.",
    },
    PersonaInfo {
        id: Persona::SarcasticFriend,
        name: "Sarcastic Friend",
        description: "Witty remarks and playful mockery to keep you on track.",
    },
    PersonaInfo {
        id: Persona::MotivationalCoach,
        name: "Motivational Coach",
        description: "Positive energy and encouraging words to boost your confidence.",
    },
];

/// All personas, in display order
pub fn available_personas() -> &'static [PersonaInfo] {
    &PERSONAS
}

/// Fixed harshness of each persona, 1 (gentle) to 5 (harsh)
pub fn persona_intensity(persona: Persona) -> u8 {
    match persona {
        Persona::DrillSergeant => 5,
        Persona::DisappointedParent => 3,
        Persona::SarcasticFriend => 4,
        Persona::MotivationalCoach => 2,
    }
}

pub fn category_for(trigger: Trigger) -> PromptCategory {
    match trigger {
        Trigger::Procrastination => PromptCategory::Motivation,
        Trigger::Distraction => PromptCategory::Intervention,
        Trigger::LowProductivity | Trigger::MissedDeadline => PromptCategory::Accountability,
        Trigger::Achievement => PromptCategory::Celebration,
    }
}

/// Message table for a persona and trigger. Triggers without their own table
/// use the procrastination messages.
fn messages(persona: Persona, trigger: Trigger) -> &'static [&'static str] {
    use Persona::*;
    use Trigger::*;

    match (persona, trigger) {
        (DrillSergeant, Distraction) => &[
            "EYES ON THE PRIZE, RECRUIT! That notification can wait!",
            "FOCUS! You're scattered like leaves in a hurricane!",
            "PUT DOWN THAT PHONE AND PICK UP YOUR PRODUCTIVITY!",
            "ATTENTION! Your brain is AWOL - bring it back to base!",
        ],
        (DrillSergeant, Achievement) => &[
            "OUTSTANDING! You actually did something productive today!",
            "WELL DONE, SOLDIER! You've earned a 5-minute break!",
            "IMPRESSIVE! I almost thought you'd forgotten how to work!",
            "EXCELLENT EXECUTION! Now drop and give me another task!",
        ],
        (DrillSergeant, _) => &[
            "DROP AND GIVE ME TWENTY! And by twenty, I mean twenty minutes of actual work!",
            "WHAT ARE YOU WAITING FOR, SOLDIER? Those tasks won't complete themselves!",
            "I've seen glaciers move faster than your productivity today!",
            "MOVE IT, MOVE IT, MOVE IT! Time is ticking and so is my patience!",
        ],

        (DisappointedParent, Distraction) => &[
            "Really? You're checking social media again? I raised you better than this.",
            "I can see you're not focusing. Do I need to take away your internet privileges?",
            "This is exactly why you can't have nice things... like free time.",
            "I'm watching you, and I'm not impressed with what I see.",
        ],
        (DisappointedParent, Achievement) => &[
            "Well, look who finally decided to be productive! I'm proud of you.",
            "See? I knew you had it in you all along. Good job, kiddo.",
            "Finally! A reason to brag about you to the neighbors.",
            "I'm genuinely surprised and pleased. Keep it up!",
        ],
        (DisappointedParent, _) => &[
            "I'm not angry, I'm just... disappointed. Again.",
            "You know, when I was your age, we actually finished what we started.",
            "I had such high hopes for you today. *sigh*",
            "Your potential is showing, but so is your procrastination.",
        ],

        (SarcasticFriend, Distraction) => &[
            "Oh look, another shiny object caught your attention. Shocking.",
            "Your focus is like a goldfish - impressive 3-second attention span.",
            "I see you've mastered the art of being busy without being productive.",
            "Multitasking champion right here! Too bad none of those tasks are getting done.",
        ],
        (SarcasticFriend, Achievement) => &[
            "Wow, you actually did something! Mark your calendar, this is historic.",
            "Look who decided to join the land of the productive! Welcome back.",
            "I'm genuinely shocked. In a good way. Don't let it go to your head.",
            "Finally! I was starting to think you'd forgotten how to work.",
        ],
        (SarcasticFriend, _) => &[
            "Oh wow, another 'productive' day of staring at your screen. Impressive.",
            "Let me guess, you're 'thinking about' starting that task? Revolutionary approach.",
            "I love how you've turned procrastination into an art form. Truly inspiring.",
            "Are you waiting for the task to complete itself? Because that's not how this works.",
        ],

        (MotivationalCoach, Distraction) => &[
            "Stay strong! Your goals are bigger than your distractions!",
            "Focus is your superpower! Use it to achieve greatness!",
            "You're in control! Choose progress over procrastination!",
            "Channel that energy into your tasks! You're unstoppable!",
        ],
        (MotivationalCoach, Achievement) => &[
            "YES! That's what I'm talking about! You're on fire!",
            "INCREDIBLE! You're proving that hard work pays off!",
            "AMAZING! Keep this momentum going - you're unstoppable!",
            "FANTASTIC! You're showing the world what you're made of!",
        ],
        (MotivationalCoach, _) => &[
            "Champions don't wait for motivation - they create it! Let's GO!",
            "Every second you wait is a second your future self will thank you for using!",
            "You've got this! The only thing standing between you and success is action!",
            "Believe in yourself! You're capable of amazing things when you focus!",
        ],
    }
}

/// Pick a message for `persona` reacting to `trigger`
pub fn generate_prompt<R: Rng + ?Sized>(
    trigger: Trigger,
    persona: Persona,
    rng: &mut R,
) -> SarcasticPrompt {
    let message = messages(persona, trigger)
        .choose(rng)
        .copied()
        .unwrap_or_default();

    SarcasticPrompt {
        id: PromptId::generate(),
        persona,
        trigger,
        message: message.to_string(),
        intensity: persona_intensity(persona),
        category: category_for(trigger),
    }
}

/// What each character says when the call is answered
pub fn call_script(character: CallCharacter) -> &'static str {
    match character {
        CallCharacter::Boss => {
            "Hey, I noticed you've been procrastinating on that project. We need to talk about \
             your productivity. This is affecting the team's performance."
        }
        CallCharacter::Parent => {
            "Sweetie, I'm worried about you. You seem to be avoiding your responsibilities \
             lately. Is everything okay? You know you can talk to me."
        }
        CallCharacter::Friend => {
            "Dude, what's going on? You've been putting off everything lately. This isn't like \
             you. Want to grab coffee and talk about it?"
        }
        CallCharacter::Coach => {
            "Listen up! Champions don't make excuses, they make progress. You've got the \
             potential, but you need to push through this resistance. Let's go!"
        }
        CallCharacter::Therapist => {
            "I've noticed some patterns in your behavior that suggest you might be struggling \
             with task avoidance. Would you like to explore what might be underlying this?"
        }
    }
}

/// Reason attached to every simulated call
pub const CALL_TRIGGER: &str = "Prolonged procrastination detected";

/// A simulated call from a uniformly chosen character
pub fn generate_call<R: Rng + ?Sized>(rng: &mut R, user_id: UserId, now: Timestamp) -> VoiceCall {
    let character = CallCharacter::ALL
        .choose(rng)
        .copied()
        .unwrap_or(CallCharacter::Friend);

    VoiceCall {
        id: CallId::generate(),
        user_id,
        character,
        trigger: CALL_TRIGGER.to_string(),
        script: call_script(character).to_string(),
        duration: 0,
        scheduled_for: now,
        completed: false,
        user_response: None,
    }
}

const INVITE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six uppercase alphanumerics for a new team
pub fn invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..6)
        .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}
