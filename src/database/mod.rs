pub mod admission_store;
pub mod manager;
pub mod models;
pub mod repository;

pub use admission_store::PgAdmissionStore;
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{Filter, Model, Page, PageRequest, Repository};
