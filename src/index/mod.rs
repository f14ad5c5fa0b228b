// Card index module
// LanceDB-backed storage for embedded card texts


pub mod vector_store;

use chrono::Utc;
use uuid::Uuid;

use crate::{AugurError, Result};

pub use vector_store::{CardMatch, VectorStore};

/// One indexed card: the flattened deck row and its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct CardEntry {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub created_at: String,
}

impl CardEntry {
    #[inline]
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            vector,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Pair card texts with their embeddings, in order. The two sequences
/// must have equal length.
#[inline]
pub fn build_entries(texts: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Vec<CardEntry>> {
    if texts.len() != vectors.len() {
        return Err(AugurError::Index(format!(
            "text/vector count mismatch: {} texts, {} vectors",
            texts.len(),
            vectors.len()
        )));
    }

    Ok(texts
        .into_iter()
        .zip(vectors)
        .map(|(text, vector)| CardEntry::new(text, vector))
        .collect())
}
