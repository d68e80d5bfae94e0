//! Report formatting for the terminal and for machines

pub mod console;
pub mod formatter;
