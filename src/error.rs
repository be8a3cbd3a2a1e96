use thiserror::Error;

/// Errors surfaced by the editor core.
///
/// Every fallible operation returns `Result<_, EditorError>` instead of
/// panicking; the UI layer translates these into user-visible messages.
#[derive(Error, Debug)]
pub enum EditorError {
    /// Crop was requested without a single image entity selected
    #[error("select an image before cropping")]
    NoImageSelected,

    /// A crop operation was invoked with no session in progress
    #[error("no crop session is active")]
    NoCropSession,

    /// The crop target disappeared while the session was open
    #[error("the image being cropped is no longer on the canvas")]
    CropTargetMissing,

    /// The computed crop region does not overlap the source pixels
    #[error("crop region is outside the image")]
    EmptyCropRegion,

    /// Export was requested on a scene with no entities
    #[error("cannot export: canvas is empty")]
    EmptyCanvas,

    /// Deep-cloning an entity for a snapshot failed; the snapshot is dropped
    #[error("snapshot failed: {0}")]
    Snapshot(String),

    /// A saved document could not be read or written
    #[error("serialization error: {0}")]
    Serde(String),

    /// Image bytes could not be decoded
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// A raster result could not be encoded
    #[error("failed to encode image: {0}")]
    ImageEncode(String),

    /// Rasterizing the scene failed (zero-sized surface, bad geometry)
    #[error("render failed: {0}")]
    Render(String),
}

/// Convenience result alias used across the editor core.
pub type EditorResult<T> = Result<T, EditorError>;
