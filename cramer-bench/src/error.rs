use derive_more::From;

use cramer_core::error::CramerCoreError;

pub type Result<T> = core::result::Result<T, BenchError>;

#[derive(Debug, From)]
pub enum BenchError {
    // -- Externals
    #[from]
    Io(std::io::Error),

    #[from]
    Csv(csv::Error),

    #[from]
    CramerCoreError(CramerCoreError),

    Usage(String),

    InvalidArgument(String),
}

// region:    --- Error Boilerplate

impl core::fmt::Display for BenchError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for BenchError {}

// endregion: --- Error Boilerplate
