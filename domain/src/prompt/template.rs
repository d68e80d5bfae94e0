//! Prompt templates for synthesis and judging

use crate::consensus::EnsembleResponse;

/// Templates for generating summarizer and judge prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the summarizer
    pub fn synthesis_system() -> &'static str {
        r#"You are synthesizing several candidate answers to the same question into one final answer.
Write the answer itself, as if you were answering the question directly.
Do not mention the candidate answers, and do not comment on agreement or disagreement between them.
If the question requires a specific output format (a single letter, a number, JSON, a short phrase), reply in exactly that format."#
    }

    /// User prompt merging all `responses` into one answer
    pub fn synthesis_prompt(question: &str, responses: &[EnsembleResponse]) -> String {
        let mut prompt = format!(
            r#"Original question:
{}

Candidate answers:
"#,
            question
        );

        push_numbered(&mut prompt, responses);

        prompt.push_str(
            r#"
Combine the strongest reasoning from the candidates into one unified answer.
Preserve any output format the original question asks for."#,
        );

        prompt
    }

    /// System prompt for pairwise ELO comparisons
    pub fn pairwise_system() -> &'static str {
        r#"You are an impartial judge comparing two answers to the same question.
Judge correctness first, then completeness and clarity. Ignore answer length and position."#
    }

    /// User prompt asking the judge to pick the better of two responses
    pub fn pairwise_prompt(question: &str, a: &str, b: &str) -> String {
        format!(
            r#"Question:
{}

--- Response A ---
{}

--- Response B ---
{}

Which response is better? Reply with exactly one of: A, B, TIE."#,
            question, a, b
        )
    }

    /// System prompt for majority alignment scoring
    pub fn alignment_system() -> &'static str {
        r#"You identify the position shared by most answers in a group and rate how closely each answer agrees with it."#
    }

    /// User prompt asking for one 0-10 alignment score per response, in order
    pub fn alignment_prompt(question: &str, responses: &[EnsembleResponse]) -> String {
        let mut prompt = format!(
            r#"Question:
{}

Answers:
"#,
            question
        );

        push_numbered(&mut prompt, responses);

        prompt.push_str(&format!(
            r#"
Determine the majority position among these {} answers. Score each answer from 0 (contradicts the majority) to 10 (fully agrees).
Reply with JSON only, in answer order: {{"scores": [..]}}"#,
            responses.len()
        ));

        prompt
    }

    /// User prompt synthesizing an answer that follows the majority position
    ///
    /// `scores` are alignment scores parallel to `responses`.
    pub fn majority_synthesis_prompt(
        question: &str,
        responses: &[EnsembleResponse],
        scores: &[f64],
    ) -> String {
        let mut prompt = format!(
            r#"Original question:
{}

Candidate answers with their agreement score (0-10) against the majority position:
"#,
            question
        );

        for (i, response) in responses.iter().enumerate() {
            let score = scores.get(i).copied().unwrap_or(crate::consensus::NEUTRAL_ALIGNMENT);
            prompt.push_str(&format!(
                "\n--- Response {} (agreement {:.1}) ---\n{}\n",
                i + 1,
                score,
                response.content
            ));
        }

        prompt.push_str(
            r#"
Write one final answer that follows the majority position. Give low-agreement answers little weight.
Do not mention the candidates or the scores. Preserve any output format the original question asks for."#,
        );

        prompt
    }

    /// System prompt for open-ended grading
    pub fn judge_system() -> &'static str {
        r#"You are a strict grader. Decide whether a submitted answer matches the reference answer in meaning.
Minor wording differences are fine; missing or wrong key facts are not."#
    }

    /// User prompt asking the judge for a CORRECT / INCORRECT verdict
    pub fn judge_prompt(question: &str, expected: &str, answer: &str) -> String {
        format!(
            r#"Question:
{}

Reference answer:
{}

Submitted answer:
{}

Reply with exactly one word: CORRECT or INCORRECT."#,
            question, expected, answer
        )
    }
}

fn push_numbered(prompt: &mut String, responses: &[EnsembleResponse]) {
    for (i, response) in responses.iter().enumerate() {
        prompt.push_str(&format!("\n--- Response {} ---\n{}\n", i + 1, response.content));
    }
}
