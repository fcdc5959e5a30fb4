#![warn(rust_2018_idioms)]

pub mod catalog;
pub mod engine;
pub mod model;
pub mod protocol;
pub mod round;
