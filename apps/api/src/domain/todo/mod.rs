// Todo domain module
// Contains the todo aggregate root and its update command

#![allow(clippy::module_inception)]

pub mod todo;

pub use todo::{Todo, TodoError, TodoUpdate};
