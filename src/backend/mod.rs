//! The backends consume the immutable IR built by the front end (or, for the
//! token dumper, the raw source) and render complete output text in a single
//! pass. Every backend is pure: on failure no partial output escapes.

pub mod assemblers;
pub mod targets;
pub mod token_dump;
