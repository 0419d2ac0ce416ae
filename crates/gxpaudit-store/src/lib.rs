//! Storage layer: an in-memory observation repository with pluggable id
//! allocation.

mod error;
pub use error::StoreError;

pub mod ids;
pub use ids::{IdAllocator, SequentialIds};

mod repository;
pub use repository::ObservationRepository;
