//! Error types for ikbake

use thiserror::Error;

/// Main error type for ikbake operations
#[derive(Error, Debug)]
pub enum Error {
    /// An IK bone's target index does not resolve to a bone in the model
    #[error("IK target of '{bone}' is not a valid bone index; check the model structure")]
    IkTarget {
        /// Name of the IK bone carrying the broken reference
        bone: String,
    },

    /// An IK link references a bone index missing from the model
    #[error("IK links of '{bone}' contain an invalid bone index; check the model structure")]
    IkLink {
        /// Name of the IK bone carrying the broken reference
        bone: String,
    },

    /// A bone name lookup failed
    #[error("Unknown bone: {0}")]
    UnknownBone(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the ikbake Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_ik_bone() {
        let err = Error::IkTarget {
            bone: "左足ＩＫ".to_string(),
        };
        assert!(err.to_string().contains("左足ＩＫ"));

        let err = Error::IkLink {
            bone: "右足ＩＫ".to_string(),
        };
        assert!(err.to_string().contains("右足ＩＫ"));
    }
}
