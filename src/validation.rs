//! Aggregate checks on a candidate stream set.
//!
//! The hardware handles at most one input stream and needs at least one
//! output stream. A bidirectional stream counts toward both limits.
//! Per-format stream limits are not checked here.

use thiserror::Error;

use crate::stream::Stream;

/// Why a stream set cannot be supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamSetError {
    /// The set contains no streams.
    #[error("stream set is empty")]
    Empty,
    /// No stream carries output from the camera.
    #[error("stream set must have at least one output stream")]
    NoOutput,
    /// More than one stream feeds the camera.
    #[error("stream set must have at most one input stream, found {0}")]
    TooManyInputs(usize),
}

/// Validates a candidate stream set.
///
/// # Errors
///
/// Returns the first rule the set breaks: [`StreamSetError::Empty`],
/// [`StreamSetError::NoOutput`] or [`StreamSetError::TooManyInputs`].
pub fn validate_stream_set<'a, I>(streams: I) -> Result<(), StreamSetError>
where
    I: IntoIterator<Item = &'a Stream>,
{
    let mut count = 0usize;
    let mut inputs = 0usize;
    let mut outputs = 0usize;

    for stream in streams {
        count += 1;
        if stream.is_input_type() {
            inputs += 1;
        }
        if stream.is_output_type() {
            outputs += 1;
        }
    }

    if count == 0 {
        return Err(StreamSetError::Empty);
    }
    if outputs < 1 {
        return Err(StreamSetError::NoOutput);
    }
    if inputs > 1 {
        return Err(StreamSetError::TooManyInputs(inputs));
    }
    Ok(())
}

/// Boolean form of [`validate_stream_set`].
pub fn is_valid_stream_set<'a, I>(streams: I) -> bool
where
    I: IntoIterator<Item = &'a Stream>,
{
    validate_stream_set(streams).is_ok()
}
