//! Crate-wide error type.
//!
//! Every fallible operation returns `AppError`, which carries the process exit
//! code the `kpi` binary should terminate with:
//!
//! - `2`: configuration or input error (bad registry, missing source, bad sheet)
//! - `4`: transport failure while fetching CSV text

/// Exit code for configuration/input errors.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for transport (fetch) failures.
pub const EXIT_TRANSPORT: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(EXIT_TRANSPORT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn is_transport(&self) -> bool {
        self.exit_code == EXIT_TRANSPORT
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
