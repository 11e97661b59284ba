//! Shared GraphQL point budget.
//!
//! GitHub meters GraphQL queries against a single hourly point budget per
//! credential. [`RateBudget`] is the one place that budget is tracked: every
//! response refreshes it, and every query is admitted through it. Clones share
//! state, so parallel workers using one token cannot overdraw the ceiling.
//!
//! Waits hold the budget lock for their whole duration. Any other worker
//! trying to admit a query queues behind the sleeper and resumes once the
//! window has reset.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::github::error::FetchError;
use crate::github::query::{QueryShape, QueryTarget};
use crate::github::rate_limit::RateLimitInfo;
use crate::telemetry::{CrawlEvent, NoopTelemetrySink, TelemetrySink, WaitReason, duration_ms};

/// Source of wall-clock time, in Unix seconds.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current Unix time in seconds.
    fn now_unix(&self) -> u64;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}

/// Tunables for [`RateBudget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSettings {
    /// Points that must remain after a query is admitted.
    pub safety_margin: u32,
    /// Extra wait past the reported reset, absorbing clock skew.
    pub reset_skew: Duration,
    /// Pause for a throttling response that names no delay or reset.
    pub default_pause: Duration,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            reset_skew: Duration::from_secs(1),
            default_pause: Duration::from_secs(60),
        }
    }
}

/// Default points held back from the budget.
pub const DEFAULT_SAFETY_MARGIN: u32 = 50;

#[derive(Debug, Default)]
struct BudgetState {
    limit: Option<u32>,
    remaining: Option<u32>,
    reset_at: Option<u64>,
    measured_costs: HashMap<QueryShape, u32>,
}

impl BudgetState {
    fn refresh(&mut self, info: &RateLimitInfo) {
        self.limit = Some(info.limit());
        // Responses can arrive out of order across workers; within one window
        // the lowest remaining value is the freshest.
        let same_window = info.reset_at().is_some() && info.reset_at() == self.reset_at;
        self.remaining = match self.remaining {
            Some(current) if same_window => Some(current.min(info.remaining())),
            _ => Some(info.remaining()),
        };
        if info.reset_at().is_some() {
            self.reset_at = info.reset_at();
        }
    }

    fn restore_after_reset(&mut self, cost: u32) {
        self.remaining = self.limit.map(|limit| limit.saturating_sub(cost));
        self.reset_at = None;
    }
}

/// Cloneable handle to the process-wide point budget.
#[derive(Clone)]
pub struct RateBudget {
    state: Arc<Mutex<BudgetState>>,
    settings: BudgetSettings,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl fmt::Debug for RateBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateBudget")
            .field("settings", &self.settings)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl RateBudget {
    /// Creates an empty budget; the first response populates it.
    #[must_use]
    pub fn new(settings: BudgetSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates a budget reading wall time from `clock`.
    #[must_use]
    pub fn with_clock(settings: BudgetSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BudgetState::default())),
            settings,
            clock,
            telemetry: Arc::new(NoopTelemetrySink),
        }
    }

    /// Routes wait events to `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Updates the budget from the metadata of a response to `shape`.
    pub async fn observe(&self, shape: QueryShape, info: &RateLimitInfo) {
        let mut state = self.state.lock().await;
        state.refresh(info);
        if let Some(cost) = info.cost() {
            state.measured_costs.insert(shape, cost);
        }
    }

    /// Returns the latest known budget snapshot.
    pub async fn snapshot(&self) -> Option<RateLimitInfo> {
        let state = self.state.lock().await;
        let remaining = state.remaining?;
        Some(RateLimitInfo::new(
            state.limit.unwrap_or(remaining),
            remaining,
            state.reset_at,
        ))
    }

    /// Points a query of `shape` is expected to cost.
    ///
    /// Uses the last measured cost for the shape, falling back to GitHub's
    /// published formula: one request per connection requested, one point
    /// per hundred requests, at least one point.
    pub async fn estimate_cost(&self, shape: QueryShape) -> u32 {
        let state = self.state.lock().await;
        cost_for(&state, shape)
    }

    /// Waits until a query of `shape` fits within the budget, then reserves
    /// its cost.
    ///
    /// Returns the time spent waiting, which is zero when the budget already
    /// had room.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RateLimitUnavailable`] when the query does not
    /// fit and no reset time is known.
    pub async fn admit(&self, shape: QueryShape) -> Result<Duration, FetchError> {
        let mut state = self.state.lock().await;
        let cost = cost_for(&state, shape);
        let Some(remaining) = state.remaining else {
            // Nothing observed yet; the first response fills the budget in.
            return Ok(Duration::ZERO);
        };

        if remaining >= cost.saturating_add(self.settings.safety_margin) {
            state.remaining = Some(remaining.saturating_sub(cost));
            return Ok(Duration::ZERO);
        }

        let reset_at = state.reset_at.ok_or(FetchError::RateLimitUnavailable)?;
        let delay = self.until(reset_at);
        tracing::info!(
            remaining,
            cost,
            reset_at,
            delay_secs = delay.as_secs(),
            "rate budget low; waiting for the window to reset"
        );
        self.pause(WaitReason::BudgetLow, delay).await;
        state.restore_after_reset(cost);
        Ok(delay)
    }

    /// Waits out an explicit throttling response.
    ///
    /// Sleeps for `Retry-After` when GitHub sent one, else until the known
    /// reset, else for the default pause. Errors other than
    /// [`FetchError::RateLimited`] return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RateLimitUnavailable`] when the primary budget is
    /// exhausted and no reset time is known.
    pub async fn wait_out(&self, error: &FetchError) -> Result<Duration, FetchError> {
        let FetchError::RateLimited {
            retry_after,
            budget_exhausted,
            rate_limit,
            ..
        } = error
        else {
            return Ok(Duration::ZERO);
        };

        let mut state = self.state.lock().await;
        if let Some(info) = rate_limit {
            state.refresh(info);
        }

        let delay = match (retry_after, state.reset_at) {
            (Some(delay), _) => *delay,
            (None, Some(reset_at)) => self.until(reset_at),
            (None, None) if *budget_exhausted => return Err(FetchError::RateLimitUnavailable),
            (None, None) => self.settings.default_pause,
        };
        tracing::warn!(
            delay_secs = delay.as_secs(),
            budget_exhausted = *budget_exhausted,
            "GitHub throttled the crawler; pausing: {error}"
        );
        self.pause(WaitReason::Throttled, delay).await;
        if *budget_exhausted {
            state.restore_after_reset(0);
        }
        Ok(delay)
    }

    fn until(&self, reset_at: u64) -> Duration {
        let seconds = reset_at.saturating_sub(self.clock.now_unix());
        Duration::from_secs(seconds).saturating_add(self.settings.reset_skew)
    }

    async fn pause(&self, reason: WaitReason, delay: Duration) {
        self.telemetry.record(CrawlEvent::RateLimitWait {
            reason,
            delay_ms: duration_ms(delay),
        });
        tokio::time::sleep(delay).await;
    }
}

fn cost_for(state: &BudgetState, shape: QueryShape) -> u32 {
    if let Some(cost) = state.measured_costs.get(&shape) {
        return *cost;
    }
    let requests = match shape.target {
        QueryTarget::Entities if shape.nested_page_size > 0 => shape.page_size.saturating_add(1),
        QueryTarget::Entities | QueryTarget::Comments => 1,
    };
    requests
        .saturating_add(50)
        .checked_div(100)
        .unwrap_or_default()
        .max(1)
}
