/// Core traits for Reverb EQ
use crate::types::AudioBuffer;

/// A processing stage that runs in place over an audio buffer
///
/// Stages are owned by a single processing context: the host drives
/// `exec` and parameter changes from the same thread, so implementers
/// provide no internal synchronization.
///
/// # Real-Time Constraints
/// - No allocations in `exec` once the stage is constructed
/// - No blocking operations
/// - Bounded, deterministic execution time
pub trait AudioTask: Send {
    /// Error reported when the buffer or the stage state is unusable
    type Error: std::error::Error;

    /// Process `buffer` in place
    ///
    /// # Errors
    /// Returns an error if the buffer layout is not supported by the stage
    /// or the stage cannot prepare its parameters. The buffer is left
    /// unmodified in that case.
    fn exec(&mut self, buffer: &mut AudioBuffer) -> Result<(), Self::Error>;

    /// Clear processing state (delay lines, envelopes) without touching parameters
    fn reset(&mut self);

    /// Get stage name (for logging)
    fn name(&self) -> &str;
}
