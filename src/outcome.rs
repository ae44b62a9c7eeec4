//! Results of stages that degrade instead of failing.

/// Value produced by a best-effort stage.
///
/// `Fallback` carries the designated substitute value along with the reason
/// the primary path was abandoned, so callers never see an error from these
/// stages.
#[derive(Debug, Clone, PartialEq)]
pub enum BestEffort<T> {
    Primary(T),
    Fallback { value: T, reason: String },
}

impl<T> BestEffort<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Primary(value) | Self::Fallback { value, .. } => value,
        }
    }
}
