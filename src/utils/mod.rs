//! Utility functions and helpers

pub mod atomic;
pub mod time;

pub use atomic::atomic_write;
pub use time::{decode_time, encode_time, now};
