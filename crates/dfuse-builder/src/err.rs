use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    /// DfuSe layout error
    #[error("DfuSe error: {0}")]
    DfuSe(#[from] crate::dfuse::err::Error),

    /// bincode crate error
    #[error("Bincode encode error: {0}")]
    Bincode(#[from] bincode::error::EncodeError),
}
