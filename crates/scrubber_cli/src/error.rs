use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a decodable GIF: {0}")]
    NotAGif(scrubber::Error),

    #[error("{0}")]
    Scrubber(scrubber::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<scrubber::Error> for Error {
    fn from(err: scrubber::Error) -> Self {
        match err {
            err @ scrubber::Error::MalformedContainer { .. } => Error::NotAGif(err),
            err => Error::Scrubber(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
