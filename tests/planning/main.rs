#![allow(clippy::wildcard_enum_match_arm)]

mod common;
mod config;
mod derived_tables;
mod explain;
mod joins;
mod unions;
