#[macro_use]
extern crate log;

#[macro_use]
mod macros;

pub type Result<T> = anyhow::Result<T>;

pub mod connection;
pub mod error;
pub mod hints;
pub mod icon;
pub mod property;
pub mod reader;
pub mod stack;
pub mod window;
pub mod writer;
pub mod xdata;

#[cfg(test)]
mod fake;
