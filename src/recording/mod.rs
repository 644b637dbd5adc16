//! Recording domain: session records, the in-memory registry of every known
//! session, and the supervisor that owns the external encoder process.

pub mod registry;
pub mod supervisor;
pub mod types;
