//! Tests for budget tracking and calendar rollover.

use chrono::NaiveDate;
use gatehouse_error::GatewayErrorKind;
use gatehouse_rate_limit::{BudgetSettings, BudgetTracker, ManualClock};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn tracker(daily: f64, monthly: f64, clock: &ManualClock) -> BudgetTracker {
    BudgetTracker::with_clock(
        &BudgetSettings {
            daily_budget: daily,
            monthly_budget: monthly,
            warn_ratio: 0.8,
        },
        Arc::new(clock.clone()),
    )
    .expect("valid limits")
}

#[test]
fn daily_spent_is_sum_of_recorded_costs() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);

    for cost in [0.5, 1.25, 2.0, 0.25] {
        budget.record_cost(cost);
    }

    assert_eq!(budget.daily_spent(), 4.0);
    assert_eq!(budget.monthly_spent(), 4.0);
    assert_eq!(budget.call_count(), 4);
}

#[test]
fn day_change_resets_daily_spend_to_exactly_zero() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);
    budget.record_cost(0.1);
    budget.record_cost(0.2);

    clock.advance_days(1);

    assert_eq!(budget.daily_spent(), 0.0);
    assert!((budget.monthly_spent() - 0.3).abs() < 1e-12);
    assert_eq!(budget.call_count(), 2, "call count survives a day change");
    assert_eq!(budget.snapshot().current_day, date(2024, 3, 11));
}

#[test]
fn month_change_resets_month_and_day() {
    let clock = ManualClock::new(date(2024, 1, 31));
    let budget = tracker(10.0, 100.0, &clock);
    budget.record_cost(3.0);
    budget.record_cost(3.0);

    clock.advance_days(1);

    let snapshot = budget.snapshot();
    assert_eq!(snapshot.daily_spent, 0.0);
    assert_eq!(snapshot.monthly_spent, 0.0);
    assert_eq!(snapshot.call_count, 0);
    assert_eq!(snapshot.current_month, "2024-02");
}

#[test]
fn same_day_number_in_next_month_still_rolls_over() {
    let clock = ManualClock::new(date(2024, 1, 15));
    let budget = tracker(10.0, 100.0, &clock);
    budget.record_cost(5.0);

    clock.set(date(2024, 2, 15));

    assert_eq!(budget.daily_spent(), 0.0);
    assert_eq!(budget.monthly_spent(), 0.0);
}

#[test]
fn can_afford_boundary_equality_is_true() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);
    budget.record_cost(7.5);

    assert!(budget.can_afford(2.5));
    assert!(!budget.can_afford(2.75));
}

#[test]
fn can_afford_respects_monthly_limit() {
    let clock = ManualClock::new(date(2024, 3, 1));
    let budget = tracker(10.0, 12.0, &clock);
    budget.record_cost(8.0);
    clock.advance_days(1);

    assert_eq!(budget.daily_spent(), 0.0);
    assert!(budget.can_afford(4.0));
    assert!(!budget.can_afford(4.5), "monthly 8 + 4.5 > 12");
}

#[test]
fn reservations_count_against_affordability() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);

    let held = budget.try_reserve(6.0).expect("fits");
    assert!(!budget.can_afford(5.0));
    assert_eq!(budget.snapshot().reserved, 6.0);

    drop(held);
    assert!(budget.can_afford(10.0));
    assert_eq!(budget.snapshot().reserved, 0.0);
    assert_eq!(budget.call_count(), 0, "released reservations are not calls");
}

#[test]
fn settle_replaces_estimate_with_actual() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);

    let reservation = budget.try_reserve(4.0).expect("fits");
    assert_eq!(reservation.amount(), 4.0);
    reservation.settle(1.5);

    let snapshot = budget.snapshot();
    assert_eq!(snapshot.daily_spent, 1.5);
    assert_eq!(snapshot.reserved, 0.0);
    assert_eq!(snapshot.call_count, 1);
}

#[test]
fn fourth_call_of_three_dollars_is_rejected() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);

    for _ in 0..3 {
        budget.try_reserve(3.0).expect("fits").settle(3.0);
    }
    assert_eq!(budget.daily_spent(), 9.0);

    let err = budget.try_reserve(3.0).expect_err("9 + 3 > 10");
    assert!(matches!(err.kind(), GatewayErrorKind::BudgetExceeded(_)));
    assert!(err.is_terminal());
    assert_eq!(budget.daily_spent(), 9.0);
    assert_eq!(budget.call_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_lose_no_updates() -> anyhow::Result<()> {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(100.0, 1000.0, &clock);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let budget = budget.clone();
            tokio::spawn(async move {
                let reservation = budget.try_reserve(0.25)?;
                tokio::task::yield_now().await;
                reservation.settle(0.125);
                Ok::<_, gatehouse_error::GatewayError>(())
            })
        })
        .collect();

    for task in tasks {
        task.await??;
    }

    let snapshot = budget.snapshot();
    assert_eq!(snapshot.daily_spent, 50.0 * 0.125);
    assert_eq!(snapshot.call_count, 50);
    assert_eq!(snapshot.reserved, 0.0);
    Ok(())
}

#[test]
fn reset_zeroes_spend() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);
    budget.record_cost(5.0);

    budget.reset();

    let snapshot = budget.snapshot();
    assert_eq!(snapshot.daily_spent, 0.0);
    assert_eq!(snapshot.monthly_spent, 0.0);
    assert_eq!(snapshot.call_count, 0);
}

#[test]
fn negative_costs_are_ignored() {
    let clock = ManualClock::new(date(2024, 3, 10));
    let budget = tracker(10.0, 100.0, &clock);
    budget.record_cost(-2.0);
    assert_eq!(budget.daily_spent(), 0.0);
    assert_eq!(budget.call_count(), 1);
}

#[test]
fn invalid_limits_are_rejected() {
    assert!(BudgetTracker::new(0.0, 100.0).is_err());
    assert!(BudgetTracker::new(10.0, -1.0).is_err());
    assert!(BudgetTracker::new(200.0, 100.0).is_err());
    assert!(BudgetTracker::new(100.0, 100.0).is_ok());
}
