pub mod limiter;
pub mod pg_store;
pub mod policy;
pub mod store;

pub use limiter::{window_start, RateLimitDecision, RateLimitError, RateLimiter};
pub use pg_store::PgCounterStore;
pub use policy::{ActionKind, ActionPolicy, FailurePolicy, RateLimitPolicies, UnknownAction};
pub use store::{AdmitOutcome, AdmitRequest, CounterStore, MemoryCounterStore};
