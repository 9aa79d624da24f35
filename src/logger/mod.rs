//! Run log: timestamped line file in the trash directory, fed by a
//! dedicated logger thread.

pub mod activity;
pub mod line;
