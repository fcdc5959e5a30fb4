#![warn(rust_2018_idioms)]

pub mod server;
pub mod settings;

pub use server::{run, Stats};
