//! sea-orm entities and the queries that go with them
pub mod campaigns;
pub mod free_usage;
