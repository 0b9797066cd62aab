//! vidsub - Batch bilingual subtitle workflow
//!
//! Extracts the audio of each video with ffmpeg, transcribes the English
//! speech with whisper, translates every segment to Chinese, writes a
//! bilingual SRT file and burns it into a copy of the video.

pub mod batch;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod media;
pub mod process;
pub mod segment;
pub mod setup;
pub mod subtitle;
pub mod timecode;
pub mod transcribe;
pub mod translate;
pub mod workflow;
