#![doc = include_str!("../README.md")]

mod code;
mod error;
mod label;
mod page;
mod pipeline;
mod pool;
mod press;
mod symbol;

pub use crate::code::*;
pub use crate::error::*;
pub use crate::label::*;
pub use crate::page::*;
pub use crate::pipeline::*;
pub use crate::press::*;
pub use crate::symbol::*;
