//! Errors from proving and from verifier-side checks.

use amw_core::ErrorClass;
use thiserror::Error;

/// Error during base proof generation or challenge binding.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The private attribute does not meet the public predicate. Terminal:
    /// the attribute cannot change, so retrying cannot succeed.
    #[error("attribute does not satisfy predicate")]
    PredicateUnsatisfied,

    /// The selected prover backend cannot run in this build.
    #[error("prover backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Binding was requested before any base proof was computed.
    #[error("no base proof has been computed")]
    NoBaseProof,

    /// `now + validity` is not representable.
    #[error("proof expiry overflows the timestamp range")]
    TimestampOverflow,

    #[error("proof payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ProofError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::PredicateUnsatisfied => ErrorClass::BusinessRule,
            Self::BackendUnavailable(_) => ErrorClass::Resource,
            Self::NoBaseProof | Self::TimestampOverflow | Self::Encoding(_) => {
                ErrorClass::MalformedInput
            }
        }
    }

    /// `false` for business-rule and resource failures.
    pub fn is_retriable(&self) -> bool {
        self.class().is_retriable()
    }
}

/// Why a verifier rejected a presented proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("proof expired at {0}")]
    Expired(String),

    #[error("proof is bound to verifier {0}, not this verifier")]
    WrongVerifier(String),

    #[error("proof answers a different challenge")]
    WrongChallenge,

    #[error("proof threshold {got} is below the required {required}")]
    ThresholdTooLow { got: u32, required: u32 },

    #[error("nullifier does not match the proof's secret material")]
    NullifierMismatch,

    #[error("nullifier already presented (replay)")]
    Replay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_failure_is_terminal() {
        let err = ProofError::PredicateUnsatisfied;
        assert_eq!(err.class(), ErrorClass::BusinessRule);
        assert!(!err.is_retriable());
        assert_eq!(err.to_string(), "attribute does not satisfy predicate");
    }

    #[test]
    fn backend_unavailable_is_not_retriable() {
        assert!(!ProofError::BackendUnavailable("circuit".into()).is_retriable());
        assert!(ProofError::NoBaseProof.is_retriable());
    }
}
