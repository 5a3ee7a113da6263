/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
///
/// All variants carry owned strings so an error can be kept as observable session state
/// (see [Session::last_error()](crate::Session::last_error)).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The transport rejected the control mode change. The String contains the reason.
    ModeEnableFailure(String),
    /// A per-tick command could not be sent, the stream has been stopped. The String contains the reason.
    DispatchFailure(String),
    /// A pattern was armed before control mode was successfully enabled.
    ControlModeDisabled,
    /// Stream configuration is out of range. The String contains the reason.
    InvalidConfig(String),
    /// Pattern name not recognized.
    UnknownPattern(String),
    /// Crazyflie link error. Contains the [error from the Link](crazyflie_link::Error) formatted.
    LinkError(String),
    /// The transport is currently disconnected.
    Disconnected,
    /// The Crazyflie did not answer in time.
    Timeout,
    /// The supervisor did not arm the system after an arming request.
    ArmingRefused,
    /// Error with the async runtime.
    SystemError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ModeEnableFailure(reason) => write!(f, "control mode change failed: {}", reason),
            Error::DispatchFailure(reason) => write!(f, "command dispatch failed: {}", reason),
            Error::ControlModeDisabled => write!(f, "control mode is not enabled"),
            Error::InvalidConfig(reason) => write!(f, "invalid stream configuration: {}", reason),
            Error::UnknownPattern(name) => write!(f, "unknown pattern '{}'", name),
            Error::LinkError(reason) => write!(f, "link error: {}", reason),
            Error::Disconnected => write!(f, "disconnected"),
            Error::Timeout => write!(f, "timeout waiting for the Crazyflie"),
            Error::ArmingRefused => write!(f, "arming refused by the supervisor"),
            Error::SystemError(reason) => write!(f, "system error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

impl From<crazyflie_link::Error> for Error {
    fn from(error: crazyflie_link::Error) -> Self {
        Self::LinkError(format!("{:?}", error))
    }
}

impl<T> From<flume::SendError<T>> for Error {
    fn from(_: flume::SendError<T>) -> Self {
        self::Error::Disconnected
    }
}

impl From<flume::RecvError> for Error {
    fn from(_: flume::RecvError) -> Self {
        self::Error::Disconnected
    }
}

impl From<tokio::runtime::TryCurrentError> for Error {
    fn from(error: tokio::runtime::TryCurrentError) -> Self {
        Self::SystemError(format!("{}", error))
    }
}
