//! Darwin Push Port timetable service.
//!
//! Mirrors the published timetable snapshots into a cache, builds the
//! newest complete snapshot pair into an in-memory [`domain::TimeTable`],
//! and serves journey queries over it as a JSON API.

pub mod cache;
pub mod config;
pub mod darwin;
pub mod domain;
pub mod ingest;
pub mod published;
pub mod refresh;
pub mod store;
pub mod web;

#[cfg(test)]
mod test_fixtures;
