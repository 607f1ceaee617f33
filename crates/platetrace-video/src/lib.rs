pub mod backends;
pub mod config;
pub mod core;

pub use crate::config::{Backend, Configuration};
pub use crate::core::{
    DynFrameProvider, FrameStream, FrameStreamProvider, spawn_stream_from_channel,
};
pub use platetrace_types::{FrameError, FrameResult, GrayFrame};
