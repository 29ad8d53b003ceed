use thiserror::Error;

/// Wallet gateway error
///
/// `Rejected` is a structured wallet-domain answer; the rest are transport
/// level failures where the remote outcome is unknown or unreadable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("wallet call timed out")]
    Timeout,

    #[error("wallet transport failure: {0}")]
    Transport(String),

    #[error("undecodable wallet response: {0}")]
    Decode(String),

    /// Request never sent: the reference cannot be addressed safely
    #[error("invalid wallet reference: {0:?}")]
    InvalidReference(String),
}

impl From<reqwest::Error> for WalletError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WalletError::Timeout
        } else if e.is_decode() {
            WalletError::Decode(e.to_string())
        } else {
            WalletError::Transport(e.to_string())
        }
    }
}
