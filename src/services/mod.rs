pub mod lease_admission;
pub mod property_cache;

pub use lease_admission::{AdmissionError, AdmissionStore, AdmissionTx, LeaseAdmission};
pub use property_cache::{listing_key, NoopCache, PropertyCache, TtlCache};
