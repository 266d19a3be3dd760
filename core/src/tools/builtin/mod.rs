//! Built-in tools

pub mod arithmetic;

pub use arithmetic::{ArithmeticTool, ArithmeticToolFactory};
