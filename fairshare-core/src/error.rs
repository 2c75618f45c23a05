//! Boundary errors for malformed engine inputs and configuration.
//!
//! Everything past validation is total: unassignable tasks, alerts and
//! critical household status are reported as data, never as errors.

/// Errors raised when input data or configuration cannot enter the model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A load weight was negative, NaN or infinite.
    #[error("invalid weight for {context}: {value}")]
    InvalidWeight {
        /// Where the weight came from (e.g. "history entry t-12 of member alex").
        context: String,
        /// Offending value.
        value: f64,
    },

    /// A member's numeric profile field was out of range.
    #[error("member {member_id}: invalid {field} {value}")]
    InvalidMemberField {
        member_id: String,
        field: &'static str,
        value: f64,
    },

    /// A category appears in both the preferred and blocked sets.
    #[error("member {member_id}: category {category} is both preferred and blocked")]
    OverlappingCategories { member_id: String, category: String },

    /// An exclusion period ends before it starts.
    #[error("member {member_id}: exclusion period ends before it starts")]
    InvertedExclusion { member_id: String },

    /// A required identifier was blank.
    #[error("{0} must be non-empty")]
    EmptyIdentifier(&'static str),

    /// Two roster entries share an id.
    #[error("duplicate member id: {0}")]
    DuplicateMember(String),

    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Reject negative and non-finite weights.
pub(crate) fn check_weight(value: f64, context: impl FnOnce() -> String) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidWeight {
            context: context(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_weight_display_names_context() {
        let err = check_weight(-2.0, || "history entry t1".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "invalid weight for history entry t1: -2");
    }

    #[test]
    fn nan_weight_is_rejected() {
        assert!(check_weight(f64::NAN, || "x".to_string()).is_err());
        assert!(check_weight(f64::INFINITY, || "x".to_string()).is_err());
        assert!(check_weight(0.0, || "x".to_string()).is_ok());
    }

    #[test]
    fn overlapping_categories_display() {
        let err = EngineError::OverlappingCategories {
            member_id: "sam".to_string(),
            category: "daily".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "member sam: category daily is both preferred and blocked"
        );
    }
}
