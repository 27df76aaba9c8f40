use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
};

/// The single error kind raised whenever a cube/message cannot be mapped
/// across the codec boundary.
///
/// The translation engine does not distinguish failure sub-kinds externally;
/// the carried reason string is for humans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationError(String);

impl TranslationError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Returns the human-readable reason for the failure.
    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl Display for TranslationError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TranslationError {}

impl From<io::Error> for TranslationError {
    fn from(e: io::Error) -> Self {
        Self::new(format!("read/write error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_displayed() {
        let err = TranslationError::new("grid is irregular");
        assert_eq!(format!("{err}"), "grid is irregular");
        assert_eq!(err.reason(), "grid is irregular");
    }
}
