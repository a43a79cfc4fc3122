use crate::models::question::Difficulty;
use rand::seq::SliceRandom;

// Rotated by attempt index so retries for the same subject change the
// structure of the question instead of re-rolling the same shape.
const ARCHETYPES: [&str; 6] = [
    "a scenario-based question that applies the concept to a concrete real-world situation",
    "a multi-step calculation question that requires at least two distinct operations",
    "a conceptual question built around a common misconception students fall for",
    "a comparison question that contrasts two closely related concepts",
    "a prediction question asking what happens when one condition is changed",
    "an error-spotting question presenting a flawed worked solution to critique",
];

const FRAMINGS: [&str; 5] = [
    "Frame it around a student preparing for a final exam.",
    "Frame it around a practical everyday situation.",
    "Frame it around a laboratory or workshop setting.",
    "Frame it as an abstract textbook exercise.",
    "Frame it around a short data or measurement summary.",
];

pub fn archetype_for(attempt_index: usize) -> &'static str {
    ARCHETYPES[attempt_index % ARCHETYPES.len()]
}

/// Builds the full generation instruction for one attempt. Pure except for
/// the pseudo-random framing pick, which only affects lexical variety.
pub fn build_generation_prompt(
    subject: &str,
    objective: Option<&str>,
    difficulty: Difficulty,
    attempt_index: usize,
) -> String {
    let archetype = archetype_for(attempt_index);
    let framing = FRAMINGS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FRAMINGS[0]);

    let mut prompt = format!(
        "Write one challenging {} multiple-choice exam question on the subject \"{}\".\n",
        difficulty.label(),
        subject
    );
    if let Some(objective) = objective {
        prompt.push_str(&format!("Learning objective: {}.\n", objective));
    }
    prompt.push_str(&format!("The question must be {}. {}\n", archetype, framing));
    prompt.push_str(
        "\nRules:\n\
         1. Exactly one option is unambiguously correct.\n\
         2. The three distractors must be plausible and grounded in common misconceptions.\n\
         3. The question must be structurally dissimilar from typical textbook phrasings of prior questions.\n\
         4. Vary which letter holds the correct answer; do not default to A.\n",
    );
    prompt.push_str(
        "\nRespond with ONLY a JSON object in exactly this shape, no prose before or after:\n\
         {\"question_text\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \
         \"correct_answer\": \"A\", \"explanation\": \"...\"}\n",
    );
    prompt
}
