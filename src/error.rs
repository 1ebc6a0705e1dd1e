use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the gas engine.
///
/// `Configuration` is raised before the first tick. `InvariantViolation` is fatal
/// mid-run. `DegenerateCollision` describes a recoverable anomaly: the stepper
/// counts and logs it but never returns it from `step`.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameters, or no non-overlapping layout found within the attempt budget.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Two colliding particles share the exact same center.
    #[error("degenerate collision at tick {tick} between particles {i} and {j}: coincident centers")]
    DegenerateCollision { tick: u64, i: usize, j: usize },

    /// Physics state no longer satisfies the ensemble invariants.
    #[error("invariant violation at tick {tick}: {detail}")]
    InvariantViolation { tick: u64, detail: String },

    /// Report or state-dump serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that end a run abnormally once ticking has started.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::Configuration("could not place particle 7".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("configuration"));
        assert!(msg.contains("particle 7"));

        let e = Error::DegenerateCollision { tick: 3, i: 1, j: 4 };
        assert!(e.to_string().contains("particles 1 and 4"));
    }

    #[test]
    fn invariant_violation_is_flagged() {
        let e = Error::InvariantViolation { tick: 12, detail: "x out of range".into() };
        assert!(e.is_invariant_violation());
        assert!(e.to_string().contains("tick 12"));
        assert!(!Error::Configuration(String::new()).is_invariant_violation());
    }
}
