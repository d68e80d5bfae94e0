//! Question value object

use serde::{Deserialize, Serialize};

/// A benchmark question (Value Object)
///
/// Loaded from an external dataset source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub ground_truth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl Question {
    /// Create a new question
    ///
    /// # Panics
    /// Panics if the id or prompt is empty or only whitespace
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        ground_truth: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let prompt = prompt.into();
        assert!(
            !id.trim().is_empty() && !prompt.trim().is_empty(),
            "Question id and prompt cannot be empty"
        );
        Self {
            id,
            prompt,
            ground_truth: ground_truth.into(),
            category: None,
            difficulty: None,
        }
    }

    /// Try to create a new question, returning None if invalid
    pub fn try_new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        ground_truth: impl Into<String>,
    ) -> Option<Self> {
        let id = id.into();
        let prompt = prompt.into();
        if id.trim().is_empty() || prompt.trim().is_empty() {
            return None;
        }
        Some(Self {
            id,
            prompt,
            ground_truth: ground_truth.into(),
            category: None,
            difficulty: None,
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    /// Whether this question is structurally valid (non-empty id and prompt)
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.prompt.trim().is_empty()
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation() {
        let q = Question::new("gsm8k-1", "What is 2 + 2?", "4").with_category("math");
        assert_eq!(q.id, "gsm8k-1");
        assert_eq!(q.ground_truth, "4");
        assert_eq!(q.category.as_deref(), Some("math"));
        assert!(q.is_valid());
    }

    #[test]
    fn test_try_new_rejects_blank() {
        assert!(Question::try_new("", "prompt", "x").is_none());
        assert!(Question::try_new("id", "   ", "x").is_none());
    }

    #[test]
    #[should_panic(expected = "cannot be empty")]
    fn test_new_panics_on_blank() {
        Question::new("", "", "");
    }

    #[test]
    fn test_camel_case_json() {
        let q = Question::new("q1", "Pick one", "B");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["groundTruth"], "B");
        assert!(json.get("category").is_none());
    }
}
