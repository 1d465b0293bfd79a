pub mod efficiency;
pub mod ledger;
pub mod profile;
pub mod reporting;
pub mod time_accounting;
pub mod tracking;
