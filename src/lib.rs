pub mod commands;
pub mod config;
pub mod discovery;
pub mod ffmpeg;
pub mod job;
pub mod progress;
pub mod queue;
pub mod scratch;
pub mod worker;
