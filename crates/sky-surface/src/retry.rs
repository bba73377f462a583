//! Bounded load-retry policy with epoch-based cancellation.
//!
//! Each load failure schedules at most one retry ticket. Delays grow
//! exponentially from a 2s base and stop at the attempt cap. Tickets carry the
//! epoch current when they were issued; bumping the epoch on surface teardown
//! or a superseding navigation invalidates every outstanding ticket.

use sky_core::LoadFailure;
use sky_core::LoadFailureKind;
use sky_core::ShellError;
use sky_core::ShellResult;
use std::time::Duration;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Request header attached to the secure-connection recovery reload.
pub const RECOVERY_HEADER_NAME: &str = "X-Skylight-Recovery";
pub const RECOVERY_HEADER_VALUE: &str = "tls-retry";

/// How a retried load should be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    Plain,
    BypassCache,
}

/// Reload instructions attached to a retry ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadDirective {
    pub mode: ReloadMode,
    pub identifying_header: Option<(String, String)>,
}

impl ReloadDirective {
    pub fn plain() -> Self {
        Self {
            mode: ReloadMode::Plain,
            identifying_header: None,
        }
    }

    pub fn bypass_cache() -> Self {
        Self {
            mode: ReloadMode::BypassCache,
            identifying_header: Some((
                RECOVERY_HEADER_NAME.to_owned(),
                RECOVERY_HEADER_VALUE.to_owned(),
            )),
        }
    }

    pub fn for_failure(kind: LoadFailureKind) -> Self {
        match kind {
            LoadFailureKind::SecureConnection => Self::bypass_cache(),
            LoadFailureKind::Other => Self::plain(),
        }
    }
}

/// Defines how load failures are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub backoff_multiplier: u32,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> ShellResult<()> {
        if self.base_delay.is_zero() {
            return Err(ShellError::new(
                "surface.retry_base_delay_invalid",
                "retry base delay must be greater than zero",
            ));
        }

        if self.backoff_multiplier == 0 {
            return Err(ShellError::new(
                "surface.retry_multiplier_invalid",
                "retry backoff multiplier must be greater than zero",
            ));
        }

        if self.max_delay < self.base_delay {
            return Err(ShellError::new(
                "surface.retry_max_delay_invalid",
                "retry max delay must be at least the base delay",
            ));
        }

        if self.max_attempts == 0 {
            return Err(ShellError::new(
                "surface.retry_max_attempts_invalid",
                "retry attempt cap must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Delay before the given attempt (1-based), clamped to the max delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self
            .backoff_multiplier
            .checked_pow(exponent)
            .unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

/// One scheduled reload, valid only while its epoch is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryTicket {
    pub epoch: u64,
    pub attempt: u32,
    pub delay: Duration,
    pub directive: ReloadDirective,
}

/// Per-surface retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
    epoch: u64,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            attempts: 0,
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Issues the next retry ticket for a failure, or `None` once exhausted.
    pub fn schedule(&mut self, policy: &RetryPolicy, failure: &LoadFailure) -> Option<RetryTicket> {
        if self.attempts >= policy.max_attempts {
            log::warn!(
                "retries exhausted after {} attempts, giving up on: {failure}",
                self.attempts
            );
            return None;
        }

        self.attempts = self.attempts.saturating_add(1);
        let ticket = RetryTicket {
            epoch: self.epoch,
            attempt: self.attempts,
            delay: policy.delay_for_attempt(self.attempts),
            directive: ReloadDirective::for_failure(failure.kind),
        };

        log::info!(
            "scheduling retry {}/{} in {:?} after {failure}",
            ticket.attempt,
            policy.max_attempts,
            ticket.delay
        );
        Some(ticket)
    }

    /// Whether a ticket is still honored (issued under the current epoch).
    pub fn accepts(&self, ticket: &RetryTicket) -> bool {
        ticket.epoch == self.epoch
    }

    /// A successful load clears the failure streak.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Invalidates every outstanding ticket; called on surface teardown or
    /// when a fresh navigation supersedes the failing one.
    pub fn invalidate(&mut self) {
        self.epoch = self.epoch.saturating_add(1);
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::ReloadDirective;
    use super::ReloadMode;
    use super::RetryPolicy;
    use super::RetryState;
    use sky_core::LoadFailure;
    use sky_core::LoadFailureKind;
    use std::time::Duration;

    fn secure_failure() -> LoadFailure {
        LoadFailure::new(LoadFailureKind::SecureConnection, "handshake rejected")
    }

    fn other_failure() -> LoadFailure {
        LoadFailure::new(LoadFailureKind::Other, "connection refused")
    }

    #[test]
    fn default_policy_validates() {
        assert!(RetryPolicy::default().validate().is_ok());
    }

    #[test]
    fn zero_base_delay_is_rejected() {
        let policy = RetryPolicy {
            base_delay: Duration::ZERO,
            ..RetryPolicy::default()
        };
        let result = policy.validate();
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "surface.retry_base_delay_invalid");
        }
    }

    #[test]
    fn first_retry_waits_the_two_second_base_delay() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();

        let ticket = state.schedule(&policy, &secure_failure());
        assert!(ticket.is_some());
        let ticket = ticket.unwrap_or_else(|| unreachable!());
        assert_eq!(ticket.attempt, 1);
        assert_eq!(ticket.delay, Duration::from_secs(2));
    }

    #[test]
    fn secure_connection_failure_gets_cache_bypass_and_recovery_header() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();

        let ticket = state.schedule(&policy, &secure_failure());
        let directive = ticket.map(|ticket| ticket.directive);
        assert_eq!(directive, Some(ReloadDirective::bypass_cache()));
        if let Some(directive) = directive {
            assert_eq!(directive.mode, ReloadMode::BypassCache);
            assert!(directive.identifying_header.is_some());
        }
    }

    #[test]
    fn other_failures_get_a_plain_reload() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();

        let ticket = state.schedule(&policy, &other_failure());
        assert_eq!(
            ticket.map(|ticket| ticket.directive),
            Some(ReloadDirective::plain())
        );
    }

    #[test]
    fn delays_double_and_clamp_at_the_max() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(30));
    }

    #[test]
    fn retries_stop_at_the_attempt_cap() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let mut state = RetryState::new();

        assert!(state.schedule(&policy, &other_failure()).is_some());
        assert!(state.schedule(&policy, &other_failure()).is_some());
        assert!(state.schedule(&policy, &other_failure()).is_none());
    }

    #[test]
    fn successful_load_resets_the_attempt_counter() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        let mut state = RetryState::new();

        assert!(state.schedule(&policy, &other_failure()).is_some());
        assert!(state.schedule(&policy, &other_failure()).is_none());

        state.reset();
        assert!(state.schedule(&policy, &other_failure()).is_some());
    }

    #[test]
    fn invalidation_rejects_outstanding_tickets() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();

        let ticket = state.schedule(&policy, &other_failure());
        assert!(ticket.is_some());
        let ticket = ticket.unwrap_or_else(|| unreachable!());
        assert!(state.accepts(&ticket));

        state.invalidate();
        assert!(!state.accepts(&ticket));
        assert_eq!(state.attempts(), 0);
    }
}
