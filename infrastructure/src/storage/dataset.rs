//! Dataset loading
//!
//! Three layouts are accepted:
//!
//! - a JSON object `{"name": .., "evaluator": .., "questions": [..]}`
//! - a JSON array of questions
//! - JSONL, one question per line (blank lines ignored)
//!
//! Question records use `id`, `prompt` (alias `question`) and `groundTruth`
//! (aliases `ground_truth`, `answer`).

use quorum_domain::{EvaluatorKind, Question};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset {path} (line {line}): {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset {path}: question {index} has an empty id or prompt")]
    InvalidQuestion { path: PathBuf, index: usize },

    #[error("Dataset {path}: duplicate question id '{id}'")]
    DuplicateId { path: PathBuf, id: String },

    #[error("Dataset {path} contains no questions")]
    Empty { path: PathBuf },
}

/// A loaded question set
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    /// Evaluator declared by the file, if any
    pub evaluator: Option<EvaluatorKind>,
    pub questions: Vec<Question>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: serde_json::Value,
    #[serde(alias = "question")]
    prompt: String,
    #[serde(alias = "ground_truth", alias = "answer")]
    ground_truth: serde_json::Value,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Deserialize)]
struct DatasetFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    evaluator: Option<EvaluatorKind>,
    questions: Vec<QuestionRecord>,
}

/// Ids and answers may be numbers in the wild
fn scalar_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |line: usize, source: serde_json::Error| DatasetError::Parse {
        path: path.to_path_buf(),
        line,
        source,
    };

    let trimmed = content.trim_start();
    let wrapped = if trimmed.starts_with('{') && !is_jsonl(path) {
        serde_json::from_str::<DatasetFile>(trimmed).ok()
    } else {
        None
    };
    let (name, evaluator, records) = match wrapped {
        Some(file) => (file.name, file.evaluator, file.questions),
        None if trimmed.starts_with('[') => {
            let records = serde_json::from_str(trimmed).map_err(|e| parse_err(e.line(), e))?;
            (None, None, records)
        }
        None => (None, None, parse_jsonl(&content).map_err(|(line, e)| parse_err(line, e))?),
    };

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let id = scalar_to_string(record.id);
        let mut question = Question::try_new(id, record.prompt, scalar_to_string(record.ground_truth))
            .ok_or_else(|| DatasetError::InvalidQuestion {
                path: path.to_path_buf(),
                index,
            })?;
        question.category = record.category;
        question.difficulty = record.difficulty;
        if !seen.insert(question.id.clone()) {
            return Err(DatasetError::DuplicateId {
                path: path.to_path_buf(),
                id: question.id,
            });
        }
        questions.push(question);
    }

    if questions.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string())
    });
    debug!(dataset = %name, questions = questions.len(), "Loaded dataset");

    Ok(Dataset {
        name,
        evaluator,
        questions,
    })
}

fn parse_jsonl(content: &str) -> Result<Vec<QuestionRecord>, (usize, serde_json::Error)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| (i + 1, e)))
        .collect()
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
}
