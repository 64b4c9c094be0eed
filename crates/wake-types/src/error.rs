use thiserror::Error;

#[derive(Error, Debug)]
pub enum WakeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Component '{name}' is not allocated in slice role {role}. Fields allocated:{registered}")]
    UnregisteredField {
        role: String,
        name: String,
        registered: String,
    },

    #[error("Shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("{solver} did not converge after {iterations} iterations (residual {residual:e})")]
    NonConvergence {
        solver: String,
        iterations: usize,
        residual: f64,
    },

    #[error("Overflow detected when casting {what} = {value} to {target}")]
    Overflow {
        what: String,
        value: f64,
        target: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WakeResult<T> = Result<T, WakeError>;

/// Fail with [`WakeError::ShapeMismatch`] unless `found == expected`.
pub fn ensure_shape(what: &str, expected: (usize, usize), found: (usize, usize)) -> WakeResult<()> {
    if expected != found {
        return Err(WakeError::ShapeMismatch {
            what: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
