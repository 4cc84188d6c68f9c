//! Reverb EQ - gain-corrected filter cascade
//!
//! Shapes a reverb impulse response with a small cascade of biquad
//! sections (low shelf, peaks, high shelf). Neighbouring bands overlap, so
//! the requested gains are not the gains designed into the filters: before
//! processing, [`Equalizer::update_filters`] solves a small linear system so
//! that the combined response hits each band's requested level at its
//! evaluation frequency.
//!
//! # Example
//!
//! ```
//! use reverb_core::{AudioBuffer, AudioTask, SampleRate};
//! use reverb_eq::{Equalizer, PEAK1};
//!
//! let mut eq = Equalizer::new(SampleRate::DVD_QUALITY)?;
//! eq.set_filter_gain(PEAK1, 3.0)?;
//!
//! let mut ir = AudioBuffer::mono(vec![1.0, 0.0, 0.0, 0.0], SampleRate::DVD_QUALITY);
//! eq.exec(&mut ir)?;
//!
//! assert_eq!(eq.target_gain(PEAK1)?, 3.0);
//! # Ok::<(), reverb_eq::EqError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod equalizer;
pub mod error;
pub mod filter;
pub mod settings;
pub mod solver;
pub mod units;

pub use equalizer::{Equalizer, HIGH, LOW, MAX_BANDS, PEAK1, PEAK2};
pub use error::{EqError, FilterParameter, Result};
pub use filter::{max_frequency, BiquadFilter, Coefficients, FilterKind};
pub use settings::{BandSettings, CorrectionSettings, EqualizerSettings};
pub use solver::LinearSystem;
