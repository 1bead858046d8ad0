//! Instrument reference data: snapshot, resolver, and calendar rules.

pub mod calendar;
pub mod lots;
pub mod resolver;
pub mod snapshot;

pub use calendar::{expiry_rule, monthly_expiry, next_expiry, ExpiryCadence, ExpiryRule};
pub use resolver::{resolve, Resolution, ResolveError, ResolveRequest};
pub use snapshot::{ReferenceRow, ReferenceSnapshot};
