//! Profile reconciliation: merging parsed resumes and manual edits into the
//! persisted alumni profile.

pub mod completeness;
pub mod handlers;
pub mod merge;
pub mod service;
pub mod storage;
pub mod store;
