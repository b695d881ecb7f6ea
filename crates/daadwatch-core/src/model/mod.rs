//! Programme record model
//!
//! - [`ProgrammeRecord`]: a raw catalog entry exactly as the listing returned it
//! - [`CanonicalRecord`]: the normalized, order-stable form used for equality
//! - [`ProgrammeId`]: the join key across snapshots

pub mod canonical;
pub mod id;
pub mod record;

pub use canonical::{CanonicalRecord, CanonicalValue, OfferingDate};
pub use id::ProgrammeId;
pub use record::{ProgrammeRecord, ID_FIELD};
