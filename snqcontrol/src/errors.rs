use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// Discovery produced no candidates at all.
    #[error("no devices found")]
    NoDevicesFound,

    /// Candidates were discovered but none matched the requested room.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("invalid control URL {0}: {1}")]
    InvalidControlUrl(String, String),

    #[error("I/O error talking to {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("malformed HTTP response from {0}: {1}")]
    MalformedResponse(String, String),

    /// Hard failure of one control call; aborts any pending commands.
    #[error("{path}: {status}")]
    CommandFailed { path: String, status: u16 },

    #[error("failed to build SOAP request: {0}")]
    SoapBuild(#[from] xmltree::Error),
}
