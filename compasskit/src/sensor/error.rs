//! Sensor failure taxonomy.

/// A failure reported by the platform sensor source.
///
/// Classification drives routing: permission failures surface the
/// "permission needed" prompt, everything else lands the calibration
/// machine in Failed. Heading-quality and unclassified failures are
/// deliberately not given separate downstream paths; the conservative
/// fallback maps both to Failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorFailure {
    /// The platform rejected sensor access.
    #[error("location permission denied by the platform")]
    PermissionDenied,

    /// The heading sensor reported unreliable data.
    #[error("heading unreliable: {0}")]
    HeadingQuality(String),

    /// Anything the platform did not classify.
    #[error("sensor failure: {0}")]
    Other(String),
}

impl SensorFailure {
    /// True if this failure should surface the permission prompt
    /// instead of touching calibration.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(SensorFailure::PermissionDenied.is_permission());
        assert!(!SensorFailure::HeadingQuality("interference".into()).is_permission());
        assert!(!SensorFailure::Other("unknown".into()).is_permission());
    }

    #[test]
    fn test_display() {
        let failure = SensorFailure::HeadingQuality("magnetic interference".into());
        assert_eq!(
            failure.to_string(),
            "heading unreliable: magnetic interference"
        );
    }
}
