use crate::error::InitError;
use std::fmt;

/// Notifications for the hosting page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeroEvent {
    Initialized,
    InitializationFailed(InitError),
    TransitionComplete,
    TransitionReset,
    ContextLost,
    ContextRestored,
}

impl HeroEvent {
    /// DOM event type dispatched on the container.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::InitializationFailed(_) => "initializationFailed",
            Self::TransitionComplete => "transitionComplete",
            Self::TransitionReset => "transitionReset",
            Self::ContextLost => "contextLost",
            Self::ContextRestored => "contextRestored",
        }
    }

    /// Human-readable detail, if the event carries one.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InitializationFailed(reason) => Some(reason.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for HeroEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({})", self.name(), detail),
            None => f.write_str(self.name()),
        }
    }
}
