//! Core domain types for the scribe document pipeline.
//!
//! Everything here is pure data: rubric schema and validation, stylesheet
//! and template types, layout text blocks, agent tool outcomes, and the
//! turn reply envelope. No I/O.

pub mod blocks;
pub mod ids;
pub mod outcome;
pub mod reply;
pub mod rubric;
pub mod style;
