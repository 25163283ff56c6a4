use std::io;
use thiserror::Error;

/// Root error type for the engine and its export/config layers.
#[derive(Error, Debug)]
pub enum Error {
    /// A grid dimension was zero.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// The grid does not fit the index or coordinate range.
    #[error("grid dimensions {width}x{height} are too large")]
    DimensionsTooLarge { width: usize, height: usize },

    /// A field, kernel or scratch buffer could not be reserved.
    #[error("failed to allocate {what} buffer of {cells} cells")]
    Allocation { what: &'static str, cells: usize },

    /// A buffer handed to a transform does not match its plan size.
    #[error("buffer of {actual} values does not match the {expected}-cell plan")]
    BufferSize { expected: usize, actual: usize },

    /// Another writer (normally the simulation loop) owns the back buffer.
    #[error("engine is busy: the simulation loop is running")]
    Busy,

    /// The simulation thread could not be created.
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[source] io::Error),

    /// The simulation thread panicked before it could be joined.
    #[error("simulation thread panicked")]
    LoopPanicked,

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("gif error: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("export error: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, Error>;
