use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Image decode failed: {0}")]
    ImageDecode(String),
}
