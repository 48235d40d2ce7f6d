pub mod lease;
pub mod payment;
pub mod property;
pub mod tenant;
pub mod unit;
pub mod user;

pub use lease::{Lease, LeaseChanges, LeaseDetail, NewLease};
pub use payment::{NewPayment, PaymentChanges, PaymentDetail};
pub use property::{NewProperty, PropertyChanges, PropertyDetail};
pub use tenant::{NewTenant, TenantChanges, TenantDetail};
pub use unit::{NewUnit, Unit, UnitChanges, UnitDetail};
pub use user::{NewUser, User};
