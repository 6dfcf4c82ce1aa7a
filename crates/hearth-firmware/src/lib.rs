#![no_std]

extern crate alloc;

pub mod broker;
pub mod net;
pub mod pixel;
pub mod store;
