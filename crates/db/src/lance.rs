use std::{path::Path, sync::Arc};

use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use docagent_core::{DocumentId, NewDocument, RetrievedDocument, SourceTag, StoredDocument};
use futures::TryStreamExt;
use lancedb::{
  DistanceType, Table, connect,
  query::{ExecutableQuery, QueryBase},
};
use tracing::{debug, error, info};

use crate::{
  DbError, Result, VectorIndex, check_dimensions,
  schema::{documents_schema, vector_dim_of},
};

/// Vector index persisted in a LanceDB table
pub struct LanceIndex {
  table: Table,
  vector_dim: usize,
}

impl LanceIndex {
  /// Open the table at `db_path`, creating it when missing.
  ///
  /// An existing table whose vector column has a different width is refused.
  pub async fn open(db_path: &Path, table_name: &str, vector_dim: usize) -> Result<Self> {
    if vector_dim == 0 {
      return Err(DbError::InvalidInput("vector dimension must be greater than 0".into()));
    }
    if let Some(parent) = db_path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    info!(path = %db_path.display(), table = table_name, vector_dim, "Opening database connection");
    let connection = match connect(db_path.to_string_lossy().as_ref()).execute().await {
      Ok(conn) => conn,
      Err(e) => {
        error!(path = %db_path.display(), err = %e, "Failed to connect to database");
        return Err(e.into());
      }
    };

    let table_names = connection.table_names().execute().await?;
    let table = if table_names.iter().any(|t| t == table_name) {
      let table = connection.open_table(table_name).execute().await?;
      let schema = table.schema().await?;
      match vector_dim_of(&schema) {
        Some(dim) if dim == vector_dim => {}
        Some(dim) => {
          return Err(DbError::DimensionMismatch {
            expected: vector_dim,
            actual: dim,
          });
        }
        None => return Err(DbError::NotFound(format!("vector column in table {}", table_name))),
      }
      table
    } else {
      debug!(table = table_name, "Creating documents table");
      connection
        .create_empty_table(table_name, documents_schema(vector_dim))
        .execute()
        .await?
    };

    Ok(Self { table, vector_dim })
  }
}

#[async_trait]
impl VectorIndex for LanceIndex {
  fn dimensions(&self) -> usize {
    self.vector_dim
  }

  #[tracing::instrument(level = "trace", skip(self, doc), fields(filename = %doc.filename))]
  async fn insert(&self, doc: NewDocument) -> Result<DocumentId> {
    check_dimensions(self.vector_dim, &doc.vector)?;

    let stored = StoredDocument::from_new(doc);
    let batch = document_to_batch(&stored, self.vector_dim)?;
    let iter = RecordBatchIterator::new(vec![Ok(batch)], documents_schema(self.vector_dim));
    self.table.add(Box::new(iter)).execute().await?;

    debug!(table = "documents", operation = "insert", id = %stored.id, "Inserted document");
    Ok(stored.id)
  }

  #[tracing::instrument(level = "trace", skip(self, vector))]
  async fn query_similar(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
    check_dimensions(self.vector_dim, vector)?;
    if k == 0 {
      return Ok(Vec::new());
    }

    let results: Vec<RecordBatch> = self
      .table
      .vector_search(vector.to_vec())?
      .distance_type(DistanceType::L2)
      .limit(k)
      .execute()
      .await?
      .try_collect()
      .await?;

    let mut docs = Vec::new();
    for batch in results {
      for row in 0..batch.num_rows() {
        docs.push(batch_to_retrieved(&batch, row)?);
      }
    }
    // Batches arrive per fragment; restore a single ascending order
    docs.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    docs.truncate(k);

    debug!(table = "documents", operation = "search", results = docs.len(), "Search complete");
    Ok(docs)
  }

  async fn count(&self) -> Result<usize> {
    Ok(self.table.count_rows(None).await?)
  }
}

fn document_to_batch(doc: &StoredDocument, vector_dim: usize) -> Result<RecordBatch> {
  let id = StringArray::from(vec![doc.id.to_string()]);
  let filename = StringArray::from(vec![doc.filename.clone()]);
  let source = StringArray::from(vec![doc.source.as_str().to_string()]);
  let content = StringArray::from(vec![doc.content.clone()]);
  let created_at = Int64Array::from(vec![doc.created_at.timestamp_millis()]);

  let vector_arr = Float32Array::from(doc.vector.clone());
  let field = Arc::new(arrow_schema::Field::new("item", arrow_schema::DataType::Float32, true));
  let vector_list = FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(vector_arr), None)?;

  let batch = RecordBatch::try_new(
    documents_schema(vector_dim),
    vec![
      Arc::new(id),
      Arc::new(filename),
      Arc::new(source),
      Arc::new(content),
      Arc::new(created_at),
      Arc::new(vector_list),
    ],
  )?;

  Ok(batch)
}

fn batch_to_retrieved(batch: &RecordBatch, row: usize) -> Result<RetrievedDocument> {
  let get_string = |name: &str| -> Result<String> {
    batch
      .column_by_name(name)
      .and_then(|c| c.as_any().downcast_ref::<StringArray>())
      .map(|a| a.value(row).to_string())
      .ok_or_else(|| DbError::NotFound(format!("column {}", name)))
  };

  let id = get_string("id")?
    .parse::<DocumentId>()
    .map_err(|_| DbError::NotFound("invalid id".into()))?;
  let distance = batch
    .column_by_name("_distance")
    .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
    .map(|arr| arr.value(row))
    .ok_or_else(|| DbError::NotFound("column _distance".into()))?;

  Ok(RetrievedDocument {
    id,
    filename: get_string("filename")?,
    source: SourceTag::new(get_string("source")?),
    content: get_string("content")?,
    distance,
  })
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn doc(name: &str, vector: Vec<f32>) -> NewDocument {
    NewDocument::new(name, SourceTag::default(), format!("text of {name}"), vector)
  }

  #[tokio::test]
  async fn test_open_creates_empty_table() {
    let temp_dir = TempDir::new().unwrap();
    let index = LanceIndex::open(&temp_dir.path().join("lancedb"), "documents", 4)
      .await
      .unwrap();
    assert_eq!(index.dimensions(), 4);
    assert_eq!(index.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_insert_and_query_nearest_first() {
    let temp_dir = TempDir::new().unwrap();
    let index = LanceIndex::open(&temp_dir.path().join("lancedb"), "documents", 3)
      .await
      .unwrap();

    index.insert(doc("far.txt", vec![9.0, 9.0, 9.0])).await.unwrap();
    let near_id = index.insert(doc("near.txt", vec![1.0, 0.0, 0.0])).await.unwrap();
    index.insert(doc("mid.txt", vec![2.0, 2.0, 0.0])).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 3);

    let hits = index.query_similar(&[1.0, 0.0, 0.0], 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, near_id);
    assert_eq!(hits[0].filename, "near.txt");
    assert_eq!(hits[0].content, "text of near.txt");
    assert_eq!(hits[0].source.as_str(), "local");
    assert_eq!(hits[1].filename, "mid.txt");
  }

  #[tokio::test]
  async fn test_wrong_dimension_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let index = LanceIndex::open(&temp_dir.path().join("lancedb"), "documents", 3)
      .await
      .unwrap();

    assert!(matches!(
      index.insert(doc("bad.txt", vec![1.0, 2.0])).await,
      Err(DbError::DimensionMismatch {
        expected: 3,
        actual: 2
      })
    ));
    assert!(matches!(
      index.query_similar(&[1.0], 1).await,
      Err(DbError::DimensionMismatch { .. })
    ));
    assert_eq!(index.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_reopen_with_other_dimension_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lancedb");
    {
      let index = LanceIndex::open(&path, "documents", 3).await.unwrap();
      index.insert(doc("a.txt", vec![1.0, 2.0, 3.0])).await.unwrap();
    }

    let reopened = LanceIndex::open(&path, "documents", 3).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);

    assert!(matches!(
      LanceIndex::open(&path, "documents", 5).await,
      Err(DbError::DimensionMismatch {
        expected: 5,
        actual: 3
      })
    ));
  }

  #[tokio::test]
  async fn test_zero_k_returns_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let index = LanceIndex::open(&temp_dir.path().join("lancedb"), "documents", 2)
      .await
      .unwrap();
    index.insert(doc("a.txt", vec![0.0, 1.0])).await.unwrap();
    assert!(index.query_similar(&[0.0, 1.0], 0).await.unwrap().is_empty());
  }
}
