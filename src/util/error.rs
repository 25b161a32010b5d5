use std::io;

#[derive(Debug, Fail)]
pub enum PlotError {
    #[fail(display = "invalid configuration: {}", _0)]
    Configuration(String),
    #[fail(display = "out of resources: {}", _0)]
    ResourceExhaustion(String),
    #[fail(display = "{} failed at offset {}: {}", op, offset, cause)]
    Io {
        op: &'static str,
        offset: u64,
        #[fail(cause)]
        cause: io::Error,
    },
    #[fail(display = "plot file does not support resuming: {}", _0)]
    ResumeFormatMismatch(String),
}

impl PlotError {
    pub fn io(op: &'static str, offset: u64, cause: io::Error) -> Self {
        PlotError::Io { op, offset, cause }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        PlotError::Configuration(message.into())
    }
}
