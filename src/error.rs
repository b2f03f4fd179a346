use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Encoder error: {0}")]
    Encoder(String),
}

pub type Result<T> = std::result::Result<T, Error>;
