//! Lifecycle events logged as the application changes state.

/// Application state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started,
    Active,
    Terminating,
    Terminated,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Started => "started",
            LifecycleEvent::Active => "active",
            LifecycleEvent::Terminating => "terminating",
            LifecycleEvent::Terminated => "terminated",
        }
    }

    /// Emit the event at info level.
    pub fn log(self) {
        tracing::info!(event = self.as_str(), "Application lifecycle");
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        assert_eq!(LifecycleEvent::Started.to_string(), "started");
        assert_eq!(LifecycleEvent::Terminated.as_str(), "terminated");
    }
}
