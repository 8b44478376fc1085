//! Stock components
//!
//! - [`collate`]: folds input values into an accumulator
//! - [`map`]: applies a function to each value
//! - [`take`]: forwards a fixed number of values, then drops until reset
//! - [`terminal`]: a leaf whose ports are allocated on request

pub mod collate;
pub mod map;
pub mod ops;
pub mod take;
pub mod terminal;

pub use collate::collate;
pub use map::map;
pub use take::take;
pub use terminal::{Terminal, TerminalKind};
