// Documents: models, persistence and the cache-coordinating service
// Author: kelexine (https://github.com/kelexine)

pub mod models;
pub mod repository;
pub mod service;

pub use models::{CreateDocument, Document, UpdateDocument};
pub use repository::{DocumentRepository, InMemoryDocumentRepository};
pub use service::DocumentService;
