#![forbid(unsafe_code)]

pub mod model;
pub mod pomodoro;
pub mod time;

pub use time::Clock;
