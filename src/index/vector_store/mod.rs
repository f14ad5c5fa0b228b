use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info};

use super::CardEntry;
use crate::config::Config;
use crate::{AugurError, Result};

const TABLE_NAME: &str = "cards";

/// LanceDB-backed store for the card corpus. Built once by the index
/// command and read-only afterward.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
}

/// One nearest-neighbor hit, distance ascending from the query vector
#[derive(Debug, Clone, PartialEq)]
pub struct CardMatch {
    pub text: String,
    pub distance: f32,
}

impl VectorStore {
    /// Connect to the card index under the configured base directory.
    /// Does not create or verify the table; `search` reports a missing
    /// index as `NotReady`.
    #[inline]
    pub async fn open(config: &Config) -> Result<Self> {
        let db_path = config.vector_database_path();
        debug!("Opening LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AugurError::Index(format!("failed to create vector database directory: {e}"))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AugurError::Index(format!("failed to connect to LanceDB: {e}")))?;

        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
        })
    }

    /// Replace the card table with a fresh one built from `entries`.
    /// Always a full rebuild; an empty corpus leaves no table behind.
    #[inline]
    pub async fn rebuild(&self, entries: &[CardEntry]) -> Result<()> {
        self.drop_table_if_exists().await?;

        if entries.is_empty() {
            info!("Rebuilt card index with an empty corpus; no table created");
            return Ok(());
        }

        let dimension = entries[0].vector.len();
        if let Some(entry) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(AugurError::Index(format!(
                "inconsistent vector dimensions: expected {}, found {} for card {:?}",
                dimension,
                entry.vector.len(),
                entry.text
            )));
        }

        let schema = card_schema(dimension);
        self.connection
            .create_empty_table(&self.table_name, Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| AugurError::Index(format!("failed to create card table: {e}")))?;

        let batch = create_record_batch(entries, dimension, schema)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);

        let table = self.open_table().await?;
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| AugurError::Index(format!("failed to insert card entries: {e}")))?;

        info!(
            "Rebuilt card index with {} entries ({} dimensions)",
            entries.len(),
            dimension
        );
        Ok(())
    }

    /// Return the `limit` nearest cards to the query vector, distance
    /// ascending. Fails with `NotReady` when the index has never been
    /// built or holds no entries.
    #[inline]
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<CardMatch>> {
        if !self.table_exists().await? {
            return Err(AugurError::NotReady(
                "the card index has not been built; run `augur index` first".to_string(),
            ));
        }

        let table = self.open_table().await?;
        let rows = table
            .count_rows(None)
            .await
            .map_err(|e| AugurError::Index(format!("failed to count card entries: {e}")))?;
        if rows == 0 {
            return Err(AugurError::NotReady(
                "the card index is empty; run `augur index` first".to_string(),
            ));
        }

        debug!("Searching card index with limit: {}", limit);

        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| AugurError::Index(format!("failed to create vector search: {e}")))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AugurError::Index(format!("failed to execute search: {e}")))?;

        let mut matches = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| AugurError::Index(format!("failed to read result stream: {e}")))?
        {
            matches.extend(parse_match_batch(&batch)?);
        }

        debug!("Search returned {} matches", matches.len());
        Ok(matches)
    }

    /// Number of indexed cards; 0 when the index has never been built
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.open_table().await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| AugurError::Index(format!("failed to count card entries: {e}")))
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AugurError::Index(format!("failed to list tables: {e}")))?;
        Ok(table_names.contains(&self.table_name))
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| AugurError::Index(format!("failed to open card table: {e}")))
    }

    async fn drop_table_if_exists(&self) -> Result<()> {
        if self.table_exists().await? {
            debug!("Dropping existing card table");
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| AugurError::Index(format!("failed to drop card table: {e}")))?;
        }
        Ok(())
    }
}

fn card_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                dimension as i32,
            ),
            false,
        ),
        Field::new("text", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(
    entries: &[CardEntry],
    dimension: usize,
    schema: Arc<Schema>,
) -> Result<RecordBatch> {
    let mut ids = Vec::with_capacity(entries.len());
    let mut texts = Vec::with_capacity(entries.len());
    let mut created_ats = Vec::with_capacity(entries.len());
    let mut flat_values = Vec::with_capacity(entries.len() * dimension);

    for entry in entries {
        ids.push(entry.id.as_str());
        texts.push(entry.text.as_str());
        created_ats.push(entry.created_at.as_str());
        flat_values.extend_from_slice(&entry.vector);
    }

    let values_array = Float32Array::from(flat_values);
    let item_field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(item_field, dimension as i32, Arc::new(values_array), None)
            .map_err(|e| AugurError::Index(format!("failed to create vector array: {e}")))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(texts)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| AugurError::Index(format!("failed to create record batch: {e}")))
}

fn parse_match_batch(batch: &RecordBatch) -> Result<Vec<CardMatch>> {
    let texts = batch
        .column_by_name("text")
        .ok_or_else(|| AugurError::Index("missing text column".to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AugurError::Index("invalid text column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut matches = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        matches.push(CardMatch {
            text: texts.value(row).to_string(),
            distance,
        });
    }

    Ok(matches)
}
