use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Signup,
    Signin,
    Rating,
    EmailVerification,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Signup,
        ActionKind::Signin,
        ActionKind::Rating,
        ActionKind::EmailVerification,
    ];

    /// Stored in `rate_limit_windows.action`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Signup => "signup",
            ActionKind::Signin => "signin",
            ActionKind::Rating => "rating",
            ActionKind::EmailVerification => "emailVerification",
        }
    }

    pub fn env_suffix(&self) -> &'static str {
        match self {
            ActionKind::Signup => "SIGNUP",
            ActionKind::Signin => "SIGNIN",
            ActionKind::Rating => "RATING",
            ActionKind::EmailVerification => "EMAIL_VERIFICATION",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rate-limit action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "signup" => Ok(ActionKind::Signup),
            "signin" => Ok(ActionKind::Signin),
            "rating" => Ok(ActionKind::Rating),
            "emailVerification" | "email_verification" | "email-verification" => {
                Ok(ActionKind::EmailVerification)
            }
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// What the limiter does when the counter store cannot answer in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit the request and log.
    Open,
    /// Reject the request and log.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPolicy {
    pub max_requests: i64,
    pub window_ms: i64,
    pub on_store_failure: FailurePolicy,
}

impl ActionPolicy {
    pub fn new(max_requests: i64, window_ms: i64, on_store_failure: FailurePolicy) -> Self {
        Self {
            max_requests,
            window_ms,
            on_store_failure,
        }
    }

    /// The window as a duration, or `None` when the policy cannot be enforced
    /// (non-positive window, negative quota).
    pub fn window(&self) -> Option<TimeDelta> {
        if self.window_ms <= 0 || self.max_requests < 0 {
            return None;
        }
        TimeDelta::try_milliseconds(self.window_ms)
    }

    pub fn reference(action: ActionKind) -> Self {
        match action {
            ActionKind::Signup => Self::new(10, 15 * 60 * 1000, FailurePolicy::Closed),
            ActionKind::Signin => Self::new(20, 5 * 60 * 1000, FailurePolicy::Closed),
            ActionKind::Rating => Self::new(10, 60 * 1000, FailurePolicy::Open),
            ActionKind::EmailVerification => Self::new(5, 5 * 60 * 1000, FailurePolicy::Closed),
        }
    }
}

/// Per-action policies. An action without a policy is a configuration error
/// unless a fallback policy was registered explicitly.
#[derive(Debug, Clone, Default)]
pub struct RateLimitPolicies {
    policies: HashMap<ActionKind, ActionPolicy>,
    fallback: Option<ActionPolicy>,
}

impl RateLimitPolicies {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn reference() -> Self {
        let mut out = Self::empty();
        for action in ActionKind::ALL {
            out.policies.insert(action, ActionPolicy::reference(action));
        }
        out
    }

    pub fn with(mut self, action: ActionKind, policy: ActionPolicy) -> Self {
        self.policies.insert(action, policy);
        self
    }

    pub fn with_overrides(mut self, overrides: &HashMap<ActionKind, ActionPolicy>) -> Self {
        self.policies
            .extend(overrides.iter().map(|(action, policy)| (*action, *policy)));
        self
    }

    pub fn with_fallback(mut self, policy: ActionPolicy) -> Self {
        self.fallback = Some(policy);
        self
    }

    pub fn get(&self, action: ActionKind) -> Option<&ActionPolicy> {
        self.policies.get(&action).or(self.fallback.as_ref())
    }
}
