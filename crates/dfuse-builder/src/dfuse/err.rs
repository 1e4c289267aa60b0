use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    #[error("Payload is too large: {0} bytes, expected <= 0xFFFFFFFF")]
    PayloadTooLarge(usize),
    #[error("Image is too large: {0} bytes, expected <= 0xFFFFFFFF")]
    ImageTooLarge(usize),
}
