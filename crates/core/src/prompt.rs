//! Prompt construction for the reasoning service.
//!
//! Pure, deterministic functions from a canonical request to the structured
//! instruction text sent to the service. Each instruction embeds the
//! learner's age band and accommodation tag as explicit constraints and
//! demands a single JSON reply matching the per-mode schema that the
//! validation stage checks. Host secrets never appear here.

use crate::conversation::{ChatEntry, ChatRole};
use crate::request::{AccommodationTag, AgeBand, ArtifactMode, GenerationRequest, LearnerProfile};
use std::fmt::Write;

/// Builds the full instruction text for a generation request.
pub fn build_instruction(request: &GenerationRequest) -> String {
    match request.mode {
        ArtifactMode::Game => game_instruction(request),
        ArtifactMode::Quiz => quiz_instruction(request),
        ArtifactMode::Lesson => lesson_instruction(request),
        ArtifactMode::Chat => chat_turn_instruction(request),
    }
}

/// Age-band constraints shared by every mode.
fn age_guidance(band: AgeBand) -> &'static str {
    match band {
        AgeBand::Early => {
            "For ages 3-6: use large clickable elements, bright colors, very simple \
             instructions, and strong visual and auditory feedback. Keep text minimal."
        }
        AgeBand::Middle => {
            "For ages 7-10: introduce slightly more complex rules, points, and short text. \
             Keep the pacing forgiving."
        }
        AgeBand::Upper => {
            "For ages 11 and up: richer logic, timers, and detailed explanations are fine."
        }
    }
}

/// Accommodation constraints shared by every mode.
fn accommodation_guidance(tag: &AccommodationTag) -> String {
    match tag {
        AccommodationTag::Visual => {
            "The learner has a visual impairment: use high-contrast colors \
             (black/white/yellow), font sizes of at least 24px, and ARIA labels on every \
             interactive element."
                .to_string()
        }
        AccommodationTag::Motor => {
            "The learner has a motor impairment: make every target large and easy to click \
             or drag, and avoid fast-timed events."
                .to_string()
        }
        AccommodationTag::Adhd => {
            "The learner has ADHD: use engaging visuals, one clear goal at a time, and \
             frequent positive feedback to maintain focus."
                .to_string()
        }
        AccommodationTag::Hearing => {
            "The learner has a hearing impairment: never rely on sound alone; every audio \
             cue must have a visual equivalent."
                .to_string()
        }
        AccommodationTag::Other(text) => format!(
            "The learner noted this accommodation need, adapt content accordingly: \"{}\".",
            text
        ),
        AccommodationTag::None => "No specific accommodation is needed.".to_string(),
    }
}

fn learner_block(request: &GenerationRequest) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "Learner:");
    let _ = writeln!(block, "- Age: {}", request.profile.age);
    let _ = writeln!(block, "- Subject: {}", request.subject);
    let _ = writeln!(block, "- Topic: \"{}\"", request.topic);
    let _ = writeln!(block, "- {}", age_guidance(request.profile.age_band()));
    let _ = writeln!(
        block,
        "- {}",
        accommodation_guidance(&request.profile.accommodation)
    );
    block
}

fn game_instruction(request: &GenerationRequest) -> String {
    format!(
        r#"You are an expert game developer who creates fun, educational, accessible web mini-games for children.

Generate a complete, self-contained mini-game for the learner below. The entire game (HTML, CSS, JavaScript) must live in a single markup document with no external references.

{learner}
The game runs inside a sandboxed iframe and MUST report progress to the parent application with `window.parent.postMessage`:
- when the score changes: `window.parent.postMessage({{ type: 'scoreUpdate', payload: {{ score: newScore }} }}, '*');`
- when an achievement is unlocked: `window.parent.postMessage({{ type: 'achievement', payload: {{ title: 'Achievement Name' }} }}, '*');`
- when the game is completed: `window.parent.postMessage({{ type: 'gameEnd', payload: {{ finalScore: score }} }}, '*');`

Do not use a fixed template; invent a mechanic that fits the topic (drag-and-drop sorting, matching pairs, sequencing, click-to-collect, and so on).

Reply with a single JSON object and nothing else, matching exactly this shape:
{{
    "title": "A fun title for the game",
    "description": "A one-sentence description of the goal.",
    "instructions": "Simple step-by-step instructions.",
    "learningGoals": ["goal one", "goal two"],
    "achievements": ["First Correct Answer!", "Topic Champion"],
    "htmlCode": "<!DOCTYPE html>..."
}}"#,
        learner = learner_block(request)
    )
}

fn quiz_instruction(request: &GenerationRequest) -> String {
    format!(
        r#"Create 5 fun, interactive quiz questions about "{topic}" ({subject}) for a {age}-year-old child.

{learner}
Reply with a single JSON array and nothing else, matching exactly this shape:
[
    {{"question": "Fun question with emojis", "options": ["Option A", "Option B", "Option C"], "correctAnswer": 0, "explanation": "Simple explanation", "difficulty": "easy", "points": 1}}
]
`correctAnswer` is the zero-based index into `options`. `difficulty` and `points` are optional."#,
        topic = request.topic,
        subject = request.subject,
        age = request.profile.age,
        learner = learner_block(request)
    )
}

fn lesson_instruction(request: &GenerationRequest) -> String {
    format!(
        r#"Create a simple, engaging explanation about "{topic}" for a {age}-year-old child.

{learner}
Reply with a single JSON object and nothing else, matching exactly this shape:
{{"title": "Title", "content": "Simple explanation", "achievement_unlocked": "Curious Explorer", "fun_fact": "Cool fact!"}}"#,
        topic = request.topic,
        age = request.profile.age,
        learner = learner_block(request)
    )
}

fn chat_turn_instruction(request: &GenerationRequest) -> String {
    format!(
        r#"You are a warm, patient learning coach for a child.

{learner}
The learner wants to talk about "{topic}". Reply with plain text only: one short, encouraging coaching message. No JSON, no markdown."#,
        learner = learner_block(request),
        topic = request.topic
    )
}

/// The hidden system priming entry for a conversation session.
pub fn conversation_priming(profile: &LearnerProfile) -> String {
    let name = if profile.name.is_empty() {
        "the learner".to_string()
    } else {
        profile.name.clone()
    };
    format!(
        "You are a warm, patient learning coach talking with {name}, who is {age} years old. \
         {age_hint} {accommodation} Keep every reply short, positive, and end with a gentle \
         question that keeps the conversation going. Reply with plain text only.",
        name = name,
        age = profile.age,
        age_hint = age_guidance(profile.age_band()),
        accommodation = accommodation_guidance(&profile.accommodation),
    )
}

/// Instruction for the single-turn text generation endpoint.
pub fn text_instruction(prompt: &str, profile: &LearnerProfile) -> String {
    format!(
        "Write a short piece of text for a {age}-year-old child. {age_hint} {accommodation}\n\n\
         Request: {prompt}\n\nReply with plain text only.",
        age = profile.age,
        age_hint = age_guidance(profile.age_band()),
        accommodation = accommodation_guidance(&profile.accommodation),
        prompt = prompt.trim(),
    )
}

/// Renders a conversation transcript for providers that take one instruction
/// string. The system entry always leads.
pub fn render_transcript(entries: &[ChatEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let role = match entry.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        let _ = writeln!(out, "{}: {}", role, entry.content);
    }
    out
}
