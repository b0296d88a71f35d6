use async_trait::async_trait;
use thiserror::Error;

use crate::config::RecognizerConfig;

/// Failures reported by a recognizer. The display text is what callers see.
#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("{0}")]
    Transport(String),

    #[error("timeout")]
    Timeout,

    #[error("recognition service returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("requested range {offset}+{length} exceeds buffer of {available} bytes")]
    InvalidRange {
        offset: usize,
        length: usize,
        available: usize,
    },
}

/// External audio recognition service
///
/// Implementations receive the raw upload and return the service's JSON
/// document as text. The result is never parsed by this crate.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize `audio[offset..offset + length]`
    ///
    /// # Arguments
    /// * `audio` - The full uploaded payload
    /// * `offset` - First byte to submit
    /// * `length` - Number of bytes to submit
    /// * `config` - Host, credentials and timeout for this call
    async fn recognize_by_buffer(
        &self,
        audio: &[u8],
        offset: usize,
        length: usize,
        config: &RecognizerConfig,
    ) -> Result<String, RecognizerError>;
}

/// Borrow the requested window of `audio`, checking bounds
pub fn slice_range(audio: &[u8], offset: usize, length: usize) -> Result<&[u8], RecognizerError> {
    offset
        .checked_add(length)
        .and_then(|end| audio.get(offset..end))
        .ok_or(RecognizerError::InvalidRange {
            offset,
            length,
            available: audio.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_within_bounds() {
        let audio = [1u8, 2, 3, 4];
        assert_eq!(slice_range(&audio, 0, 4).unwrap(), &audio[..]);
        assert_eq!(slice_range(&audio, 1, 2).unwrap(), &[2u8, 3][..]);
        assert!(slice_range(&audio, 4, 0).unwrap().is_empty());
    }

    #[test]
    fn slice_out_of_bounds() {
        let audio = [1u8, 2, 3];
        assert!(matches!(
            slice_range(&audio, 2, 5),
            Err(RecognizerError::InvalidRange { available: 3, .. })
        ));
        assert!(slice_range(&audio, usize::MAX, 2).is_err());
    }
}
