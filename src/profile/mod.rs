//! Descriptive profiling of metric groups.

mod groups;

pub use groups::{profile_group, profile_groups, GroupStats};
