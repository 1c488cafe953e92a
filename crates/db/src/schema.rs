use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// Schema for the documents table
pub fn documents_schema(vector_dim: usize) -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("id", DataType::Utf8, false),
    Field::new("filename", DataType::Utf8, false),
    Field::new("source", DataType::Utf8, false),
    Field::new("content", DataType::Utf8, false),
    Field::new("created_at", DataType::Int64, false), // Unix timestamp ms
    Field::new(
      "vector",
      DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), vector_dim as i32),
      false,
    ),
  ]))
}

/// Vector width declared by an existing table's schema
pub(crate) fn vector_dim_of(schema: &Schema) -> Option<usize> {
  match schema.field_with_name("vector").ok()?.data_type() {
    DataType::FixedSizeList(_, size) => Some(*size as usize),
    _ => None,
  }
}
