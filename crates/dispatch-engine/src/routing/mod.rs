//! Agent selection strategies

pub mod selector;

pub use selector::{select_next, Selection};
