mod error;
mod lance;
mod memory;
mod schema;
mod vector_index;

pub use error::{DbError, Result};
pub use lance::LanceIndex;
pub use memory::MemoryIndex;
pub use schema::documents_schema;
pub use vector_index::{VectorIndex, check_dimensions};
