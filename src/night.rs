//! Night phase: prompt collection and effect resolution

pub mod collector;
pub mod options;
pub mod report;
pub mod resolver;

#[cfg(test)]
mod proptests;

pub use collector::{plan_jail, plan_night, ActionCollector};
pub use options::Choice;
pub use report::{Cause, LogEntry, NightReport, Notice, PrivateNotice};
pub use resolver::resolve_night;
