// Card corpus loading
// Reads tabular deck files and flattens each row into one descriptive line


use anyhow::{Context, Result};
use itertools::Itertools;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One row of deck data, column order preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub fields: Vec<(String, String)>,
}

impl CardRecord {
    /// Flatten the record into a single `"key: value; key: value"` line
    #[inline]
    pub fn to_text(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .join("; ")
    }
}

/// Load one deck file. The header row names the columns; a file with no
/// data rows yields an empty list.
#[inline]
pub fn load_deck(path: &Path) -> Result<Vec<CardRecord>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open deck file: {}", path.display()))?;

    let records = read_deck(reader)
        .with_context(|| format!("Failed to parse deck file: {}", path.display()))?;

    debug!("Loaded {} cards from {}", records.len(), path.display());
    Ok(records)
}

/// Load every `*.csv` deck in a directory, in lexicographic file order,
/// merged into one corpus.
#[inline]
pub fn load_corpus(dir: &Path) -> Result<Vec<CardRecord>> {
    let mut deck_paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read deck directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_deck = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_deck {
            deck_paths.push(path);
        }
    }
    deck_paths.sort();

    let mut corpus = Vec::new();
    for path in &deck_paths {
        corpus.extend(load_deck(path)?);
    }

    info!(
        "Loaded {} cards from {} decks in {}",
        corpus.len(),
        deck_paths.len(),
        dir.display()
    );
    Ok(corpus)
}

/// Flatten a corpus into the card texts stored in the index
#[inline]
pub fn card_texts(records: &[CardRecord]) -> Vec<String> {
    records.iter().map(CardRecord::to_text).collect()
}

fn read_deck<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<CardRecord>> {
    let headers = reader.headers().context("Failed to read header row")?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.context("Failed to read deck row")?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        records.push(CardRecord { fields });
    }

    Ok(records)
}
