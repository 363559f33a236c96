use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    #[error("Price key unavailable for scope {0}")]
    PriceKeyUnavailable(u32),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Json(e.to_string())
    }
}

impl BridgeError {
    /// Whether a search can still be answered, with fewer filters or facets,
    /// after this error. Only a failed engine call ends the request.
    pub fn is_degradable(&self) -> bool {
        !matches!(self, BridgeError::Engine(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let e: BridgeError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, BridgeError::Io(ref m) if m.contains("gone")));
    }

    #[test]
    fn json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: BridgeError = parse.into();
        assert!(matches!(e, BridgeError::Json(_)));
    }

    #[test]
    fn display_includes_scope() {
        let e = BridgeError::PriceKeyUnavailable(3);
        assert_eq!(e.to_string(), "Price key unavailable for scope 3");
    }

    #[test]
    fn only_engine_errors_end_a_search() {
        assert!(BridgeError::ScopeNotFound("x".into()).is_degradable());
        assert!(BridgeError::PriceKeyUnavailable(1).is_degradable());
        assert!(!BridgeError::Engine("timeout".into()).is_degradable());
    }
}
