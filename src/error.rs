use thiserror::Error;

/// Everything that can go wrong while turning a byte buffer into a [`crate::module::Module`].
///
/// Once a [`crate::player::Player`] exists, decoding cannot fail — malformed
/// notes are clamped or ignored instead, per the effect table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module buffer too short: got {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error(
        "module buffer inconsistent with its own header: {len} bytes supplied, \
         but {expected} are implied by the pattern and sample-length fields"
    )]
    SizeMismatch { len: usize, expected: usize },

    #[error("failed to read module file: {0}")]
    Io(#[from] std::io::Error),
}
