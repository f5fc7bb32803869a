use std::fmt;
use std::io;

use wasmpipe_frame::FrameError;
use wasmpipe_host::{BridgeError, HostError};
use wasmpipe_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const GUEST_FAULT: i32 = 70;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. } | TransportError::Create { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn bridge_error(context: &str, err: BridgeError) -> CliError {
    match err {
        BridgeError::Frame(err) => frame_error(context, err),
        other => CliError::new(GUEST_FAULT, format!("{context}: {other}")),
    }
}

pub fn host_error(context: &str, err: HostError) -> CliError {
    match err {
        HostError::Transport(err) => transport_error(context, err),
        HostError::Bridge(err) => bridge_error(context, err),
        HostError::Io(err) => io_error(context, err),
        HostError::Config(_) | HostError::ModuleEncoding(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        HostError::MissingExport(_) | HostError::GuestTrap(_) => {
            CliError::new(GUEST_FAULT, format!("{context}: {err}"))
        }
        HostError::GuestExit(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        HostError::Engine(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_are_data_invalid() {
        let err = host_error(
            "guest run failed",
            HostError::Bridge(BridgeError::Frame(FrameError::InvalidLength {
                header: "12a".to_string(),
            })),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("guest run failed: "));
    }

    #[test]
    fn bounds_and_traps_are_guest_faults() {
        let bounds = BridgeError::MemoryBounds {
            offset: 65534,
            len: 5,
            size: 65536,
        };
        assert_eq!(host_error("run", HostError::Bridge(bounds)).code, GUEST_FAULT);
        assert_eq!(
            host_error("run", HostError::GuestTrap("unreachable".to_string())).code,
            GUEST_FAULT
        );
    }

    #[test]
    fn closed_peer_is_failure() {
        let err = frame_error("read", FrameError::ConnectionClosed);
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn transport_open_codes() {
        let denied = TransportError::Open {
            path: "/tmp/x.pipe".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("open", denied).code, PERMISSION_DENIED);

        let missing = TransportError::Open {
            path: "/tmp/x.pipe".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(transport_error("open", missing).code, TRANSPORT_ERROR);

        let not_fifo = TransportError::NotAFifo {
            path: "/tmp/x.pipe".into(),
        };
        assert_eq!(transport_error("create", not_fifo).code, TRANSPORT_ERROR);
    }

    #[test]
    fn config_errors_are_usage() {
        let err = host_error("config", HostError::Config("bad".to_string()));
        assert_eq!(err.code, USAGE);
    }
}
