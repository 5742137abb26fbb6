/// Transport failures, split so the worker can tell a retryable hiccup from
/// a reason to stop.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("read timeout")]
    Timeout,

    #[error("session expired")]
    SessionExpired,

    #[error("credentials rejected: {0}")]
    Credentials(String),

    #[error("http status {0}")]
    Http(u16),

    #[error("malformed xml: {0}")]
    Xml(String),
}

impl TransportError {
    /// Retryable kinds. Credential and parse failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Timeout => true,
            TransportError::SessionExpired => true,
            TransportError::Http(status) => *status >= 500,
            TransportError::Credentials(_) => false,
            TransportError::Xml(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transience_split() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::SessionExpired.is_transient());
        assert!(TransportError::Http(502).is_transient());
        assert!(!TransportError::Http(404).is_transient());
        assert!(!TransportError::Credentials("bad password".into()).is_transient());
    }
}
