use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Request-scoped context threaded through every BMC call. Carries the
/// correlation id used by the structured logging events (§7 Observability)
/// and the deadline the store propagates into its DB reads (§5 Cancellation
/// & timeouts).
#[derive(Debug, Clone)]
pub struct Ctx {
    correlation_id: Uuid,
    deadline: Option<DateTime<Utc>>,
}

impl Ctx {
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| now > d)
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}
