//! Daily and monthly spend tracking with lazy calendar rollover.
//!
//! Every operation first compares the clock's date to the stored day and
//! month markers and zeroes whatever period has ended. There is no timer.
//!
//! Admission uses a reserve-then-settle protocol: [`BudgetTracker::try_reserve`]
//! checks and reserves the estimated cost under one lock, and the returned
//! [`BudgetReservation`] is later settled with the actual cost or dropped to
//! release it.

use crate::{BudgetSettings, Clock, MonthKey, SystemClock};
use chrono::NaiveDate;
use gatehouse_error::{ConfigError, GatehouseResult, GatewayError, GatewayErrorKind, GatewayResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct BudgetState {
    daily_limit: f64,
    monthly_limit: f64,
    daily_spent: f64,
    monthly_spent: f64,
    reserved: f64,
    open_reservations: u64,
    current_day: NaiveDate,
    current_month: MonthKey,
    call_count: u64,
}

impl BudgetState {
    fn new(daily_limit: f64, monthly_limit: f64, today: NaiveDate) -> Self {
        Self {
            daily_limit,
            monthly_limit,
            daily_spent: 0.0,
            monthly_spent: 0.0,
            reserved: 0.0,
            open_reservations: 0,
            current_day: today,
            current_month: MonthKey::of(today),
            call_count: 0,
        }
    }

    /// Both checks always run; a month change does not skip the day check.
    fn roll_over(&mut self, today: NaiveDate) {
        if today != self.current_day {
            debug!(from = %self.current_day, to = %today, "Daily budget rollover");
            self.daily_spent = 0.0;
            self.current_day = today;
        }

        let month = MonthKey::of(today);
        if month != self.current_month {
            debug!(from = %self.current_month, to = %month, "Monthly budget rollover");
            self.monthly_spent = 0.0;
            self.call_count = 0;
            self.current_month = month;
        }
    }

    fn fits(&self, amount: f64) -> bool {
        self.daily_spent + self.reserved + amount <= self.daily_limit
            && self.monthly_spent + self.reserved + amount <= self.monthly_limit
    }

    fn reserve(&mut self, amount: f64) {
        self.reserved += amount;
        self.open_reservations += 1;
    }

    fn release(&mut self, amount: f64) {
        self.open_reservations = self.open_reservations.saturating_sub(1);
        self.reserved = if self.open_reservations == 0 {
            0.0
        } else {
            (self.reserved - amount).max(0.0)
        };
    }

    fn commit(&mut self, actual: f64) {
        self.daily_spent += actual;
        self.monthly_spent += actual;
        self.call_count += 1;
    }

    fn ratios(&self) -> (f64, f64) {
        (
            self.daily_spent / self.daily_limit,
            self.monthly_spent / self.monthly_limit,
        )
    }

    fn snapshot(&self) -> BudgetSnapshot {
        let (daily_ratio, monthly_ratio) = self.ratios();
        BudgetSnapshot {
            daily_limit: self.daily_limit,
            monthly_limit: self.monthly_limit,
            daily_spent: self.daily_spent,
            monthly_spent: self.monthly_spent,
            reserved: self.reserved,
            daily_ratio,
            monthly_ratio,
            call_count: self.call_count,
            current_day: self.current_day,
            current_month: self.current_month.to_string(),
        }
    }
}

/// Point-in-time view of the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Daily quota
    pub daily_limit: f64,
    /// Monthly quota
    pub monthly_limit: f64,
    /// Settled spend today
    pub daily_spent: f64,
    /// Settled spend this month
    pub monthly_spent: f64,
    /// Estimated cost held by unsettled reservations
    pub reserved: f64,
    /// daily_spent / daily_limit
    pub daily_ratio: f64,
    /// monthly_spent / monthly_limit
    pub monthly_ratio: f64,
    /// Calls recorded this month
    pub call_count: u64,
    /// Day marker
    pub current_day: NaiveDate,
    /// Month marker (YYYY-MM)
    pub current_month: String,
}

#[derive(Debug)]
struct BudgetInner {
    state: Mutex<BudgetState>,
    clock: Arc<dyn Clock>,
    warn_ratio: f64,
}

/// Shared spend tracker. Clones share state.
///
/// # Example
///
/// ```
/// use gatehouse_rate_limit::BudgetTracker;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let budget = BudgetTracker::new(10.0, 100.0)?;
/// assert!(budget.can_afford(10.0));
/// budget.record_cost(4.0);
/// assert!(!budget.can_afford(6.5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    inner: Arc<BudgetInner>,
}

impl BudgetTracker {
    /// Create a tracker using the local calendar.
    pub fn new(daily_limit: f64, monthly_limit: f64) -> GatehouseResult<Self> {
        Self::with_clock(
            &BudgetSettings {
                daily_budget: daily_limit,
                monthly_budget: monthly_limit,
                ..BudgetSettings::default()
            },
            Arc::new(SystemClock),
        )
    }

    /// Create a tracker from configuration using the local calendar.
    pub fn from_settings(settings: &BudgetSettings) -> GatehouseResult<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a tracker driven by an explicit clock.
    pub fn with_clock(settings: &BudgetSettings, clock: Arc<dyn Clock>) -> GatehouseResult<Self> {
        let (daily, monthly) = (settings.daily_budget, settings.monthly_budget);
        if !(daily.is_finite() && daily > 0.0 && monthly.is_finite() && monthly > 0.0) {
            return Err(ConfigError::new("budget limits must be positive").into());
        }
        if daily > monthly {
            return Err(ConfigError::new("daily budget must not exceed monthly budget").into());
        }

        let today = clock.today();
        Ok(Self {
            inner: Arc::new(BudgetInner {
                state: Mutex::new(BudgetState::new(daily, monthly, today)),
                clock,
                warn_ratio: settings.warn_ratio,
            }),
        })
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut BudgetState) -> R) -> R {
        let today = self.inner.clock.today();
        let mut state = self.inner.state.lock();
        state.roll_over(today);
        f(&mut state)
    }

    /// True iff spending `estimated_cost` keeps both periods within quota.
    ///
    /// Outstanding reservations count as spent. Boundary equality is affordable.
    pub fn can_afford(&self, estimated_cost: f64) -> bool {
        let amount = estimated_cost.max(0.0);
        self.with_state(|state| state.fits(amount))
    }

    /// Record an actual cost directly, without a reservation.
    pub fn record_cost(&self, actual_cost: f64) {
        let actual = actual_cost.max(0.0);
        let ratios = self.with_state(|state| {
            state.commit(actual);
            state.ratios()
        });
        self.warn_if_near_limit(actual, ratios);
    }

    /// Atomically check affordability and hold `estimated_cost` against both quotas.
    ///
    /// # Errors
    ///
    /// Returns a terminal `BudgetExceeded` error when the estimate does not fit.
    #[track_caller]
    pub fn try_reserve(&self, estimated_cost: f64) -> GatewayResult<BudgetReservation> {
        let amount = estimated_cost.max(0.0);
        let outcome = self.with_state(|state| {
            if state.fits(amount) {
                state.reserve(amount);
                Ok(())
            } else {
                Err(format!(
                    "estimated ${:.4} does not fit (daily {:.4}+{:.4}/{:.4}, monthly {:.4}+{:.4}/{:.4})",
                    amount,
                    state.daily_spent,
                    state.reserved,
                    state.daily_limit,
                    state.monthly_spent,
                    state.reserved,
                    state.monthly_limit
                ))
            }
        });

        match outcome {
            Ok(()) => Ok(BudgetReservation {
                tracker: self.clone(),
                amount,
                settled: false,
            }),
            Err(reason) => {
                warn!(estimated_cost = amount, "Budget reservation rejected");
                Err(GatewayError::new(GatewayErrorKind::BudgetExceeded(reason)))
            }
        }
    }

    fn settle_reservation(&self, reserved: f64, actual: f64) {
        let actual = actual.max(0.0);
        let ratios = self.with_state(|state| {
            state.release(reserved);
            state.commit(actual);
            state.ratios()
        });
        self.warn_if_near_limit(actual, ratios);
    }

    fn release_reservation(&self, reserved: f64) {
        self.with_state(|state| state.release(reserved));
    }

    fn warn_if_near_limit(&self, cost: f64, (daily_ratio, monthly_ratio): (f64, f64)) {
        let threshold = self.inner.warn_ratio;
        if daily_ratio >= threshold || monthly_ratio >= threshold {
            warn!(
                cost,
                daily_ratio,
                monthly_ratio,
                threshold,
                "Budget usage above warning threshold"
            );
        }
    }

    /// Current state after rollover.
    pub fn snapshot(&self) -> BudgetSnapshot {
        self.with_state(|state| state.snapshot())
    }

    /// Settled spend today.
    pub fn daily_spent(&self) -> f64 {
        self.with_state(|state| state.daily_spent)
    }

    /// Settled spend this month.
    pub fn monthly_spent(&self) -> f64 {
        self.with_state(|state| state.monthly_spent)
    }

    /// Calls recorded this month.
    pub fn call_count(&self) -> u64 {
        self.with_state(|state| state.call_count)
    }

    /// Operator reset: zero spend and call count. Open reservations stay held.
    pub fn reset(&self) {
        self.with_state(|state| {
            state.daily_spent = 0.0;
            state.monthly_spent = 0.0;
            state.call_count = 0;
        });
        info!("Budget reset by operator");
    }
}

/// Estimated cost held against the budget until settled.
///
/// Dropping an unsettled reservation releases it without recording a call.
#[must_use = "dropping a reservation releases it immediately"]
#[derive(Debug)]
pub struct BudgetReservation {
    tracker: BudgetTracker,
    amount: f64,
    settled: bool,
}

impl BudgetReservation {
    /// Reserved amount.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Replace the reservation with the actual cost and count the call.
    pub fn settle(mut self, actual_cost: f64) {
        self.settled = true;
        self.tracker.settle_reservation(self.amount, actual_cost);
    }
}

impl Drop for BudgetReservation {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.release_reservation(self.amount);
        }
    }
}
