//! Browser-surface model: presentation stack, load lifecycle, retry policy.

use sky_core::ShellError;
use sky_core::ShellResult;

pub mod retry;
pub mod stack;

pub use retry::ReloadDirective;
pub use retry::ReloadMode;
pub use retry::RetryPolicy;
pub use retry::RetryState;
pub use retry::RetryTicket;
pub use stack::Surface;
pub use stack::SurfaceKind;
pub use stack::topmost;

/// Load lifecycle of a single surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }

    /// Transition into `Loading`. Valid from every phase except `Loading` itself.
    pub fn begin_load(self) -> ShellResult<Self> {
        match self {
            Self::Loading => Err(ShellError::new(
                "surface.load_already_in_flight",
                "surface is already loading",
            )),
            Self::Idle | Self::Loaded | Self::Failed => Ok(Self::Loading),
        }
    }

    pub fn finish_load(self) -> ShellResult<Self> {
        match self {
            Self::Loading => Ok(Self::Loaded),
            other => Err(ShellError::new(
                "surface.load_not_in_flight",
                format!("cannot finish a load from phase `{}`", other.as_str()),
            )),
        }
    }

    pub fn fail_load(self) -> ShellResult<Self> {
        match self {
            Self::Loading => Ok(Self::Failed),
            other => Err(ShellError::new(
                "surface.load_not_in_flight",
                format!("cannot fail a load from phase `{}`", other.as_str()),
            )),
        }
    }
}

/// Outcome of the navigation policy for a requested navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
}

/// Every requested navigation is allowed; there is no interception logic.
pub fn decide_navigation(_request_url: &str) -> NavigationDecision {
    NavigationDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::LoadPhase;
    use super::NavigationDecision;
    use super::decide_navigation;

    #[test]
    fn load_phase_walks_loading_to_loaded() {
        let phase = LoadPhase::Idle;
        let phase = phase.begin_load();
        assert_eq!(phase, Ok(LoadPhase::Loading));
        let phase = phase.and_then(LoadPhase::finish_load);
        assert_eq!(phase, Ok(LoadPhase::Loaded));
    }

    #[test]
    fn failed_phase_can_begin_a_retry_load() {
        let phase = LoadPhase::Loading.fail_load();
        assert_eq!(phase, Ok(LoadPhase::Failed));
        assert_eq!(LoadPhase::Failed.begin_load(), Ok(LoadPhase::Loading));
    }

    #[test]
    fn duplicate_begin_load_is_rejected() {
        let result = LoadPhase::Loading.begin_load();
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "surface.load_already_in_flight");
        }
    }

    #[test]
    fn finish_outside_loading_is_rejected() {
        let result = LoadPhase::Idle.finish_load();
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "surface.load_not_in_flight");
        }
    }

    #[test]
    fn navigation_policy_always_allows() {
        assert_eq!(
            decide_navigation("https://example.com/"),
            NavigationDecision::Allow
        );
        assert_eq!(
            decide_navigation("http://127.0.0.1:8080/"),
            NavigationDecision::Allow
        );
    }
}
