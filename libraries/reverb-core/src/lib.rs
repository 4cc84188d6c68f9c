//! Reverb EQ Core
//!
//! Platform-agnostic types, traits, and error handling shared by the
//! equalizer library and its hosts.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Audio Types**: `AudioBuffer`, `AudioFormat`, `SampleRate`
//! - **Core Traits**: `AudioTask`, a processing stage that runs over a buffer
//! - **Error Handling**: Unified `ReverbError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use reverb_core::{AudioBuffer, SampleRate};
//!
//! // One second of silence on a single reference channel
//! let buffer = AudioBuffer::mono(vec![0.0; 48_000], SampleRate::DVD_QUALITY);
//! assert_eq!(buffer.frames(), 48_000);
//! assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ReverbError, Result};
pub use traits::AudioTask;
pub use types::{AudioBuffer, AudioFormat, SampleRate};
