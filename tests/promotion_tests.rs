// tests/promotion_tests.rs

mod common;

use common::*;
use futures_util::future::join_all;
use promo_counters::promotion::{keys, pacing, MonthlyCount, SpinGate};
use promo_counters::storage::{CounterStore, InMemoryStore};
use rstest::rstest;
use std::sync::Arc;

const DAY: &str = "2024-1-15";

async fn lose(service: &promo_counters::promotion::PromotionService, day: &str, times: usize) -> i64 {
    let mut last = 0;
    for _ in 0..times {
        last = service.record_loss(day).await.unwrap();
    }
    last
}

#[tokio::test]
async fn daily_status_starts_at_zero() {
    let (service, _) = memory_service();
    let status = service.daily_status("2030-12-31").await.unwrap();
    assert_eq!(status.losses, 0);
    assert_eq!(status.wins, 0);
}

#[tokio::test]
async fn tenth_loss_arms_the_forced_win_token() {
    let (service, store) = memory_service();
    let token_key = keys::force_win_key(DAY);

    assert_eq!(lose(&service, DAY, 9).await, 9);
    assert_eq!(store.get(&token_key).await.unwrap(), None);

    assert_eq!(service.record_loss(DAY).await.unwrap(), 10);
    assert!(store.get(&token_key).await.unwrap().is_some());
}

#[tokio::test]
async fn losses_past_the_threshold_do_not_rearm_the_token() {
    let (service, store) = memory_service();
    lose(&service, DAY, 10).await;

    // Consume the token, then keep losing without a win in between.
    assert!(service.pre_spin(DAY).await.must_win);
    assert_eq!(service.record_loss(DAY).await.unwrap(), 11);
    assert_eq!(service.record_loss(DAY).await.unwrap(), 12);

    assert_eq!(store.get(&keys::force_win_key(DAY)).await.unwrap(), None);
    assert!(!service.pre_spin(DAY).await.must_win);
}

#[tokio::test]
async fn forced_win_is_consumed_exactly_once() {
    let (service, _) = memory_service();
    lose(&service, DAY, 10).await;

    assert!(service.pre_spin(DAY).await.must_win);
    assert!(!service.pre_spin(DAY).await.must_win);
}

#[tokio::test]
async fn concurrent_pre_spins_observe_the_token_once() {
    let (service, _) = memory_service();
    lose(&service, DAY, 10).await;

    let gates = join_all((0..16).map(|_| service.pre_spin(DAY))).await;
    let forced = gates.iter().filter(|g| g.must_win).count();
    assert_eq!(forced, 1);
}

#[tokio::test]
async fn tokens_are_per_day() {
    let (service, _) = memory_service();
    lose(&service, DAY, 10).await;

    assert!(!service.pre_spin("2024-1-16").await.must_win);
    assert!(service.pre_spin(DAY).await.must_win);
}

#[tokio::test]
async fn win_resets_losses_and_counts() {
    let (service, _) = memory_service();
    lose(&service, DAY, 7).await;
    service.record_win(DAY).await.unwrap();

    let status = service.daily_status(DAY).await.unwrap();
    assert_eq!(status.losses, 0);
    assert_eq!(status.wins, 1);

    service.record_win(DAY).await.unwrap();
    assert_eq!(service.daily_status(DAY).await.unwrap().wins, 2);
}

#[tokio::test]
async fn win_after_streak_lets_the_next_streak_arm_again() {
    let (service, store) = memory_service();
    lose(&service, DAY, 10).await;
    assert!(service.pre_spin(DAY).await.must_win);
    service.record_win(DAY).await.unwrap();

    lose(&service, DAY, 10).await;
    assert!(store.get(&keys::force_win_key(DAY)).await.unwrap().is_some());
}

#[tokio::test]
async fn prize_win_counts_daily_and_monthly() {
    let (service, _) = memory_service();

    let award = service.record_prize_win(DAY, "OFF10").await.unwrap();
    assert_eq!(award.id, "OFF10");
    assert_eq!(award.count, 1);
    let award = service.record_prize_win(DAY, "FREE_DRINK").await.unwrap();
    assert_eq!(award.count, 1);

    let daily = service
        .prize_counts(DAY, &["OFF10".into(), "FREE_DRINK".into(), "BARISTA_CHOICE".into()])
        .await
        .unwrap();
    assert_eq!(daily["OFF10"], 1);
    assert_eq!(daily["FREE_DRINK"], 1);
    assert_eq!(daily["BARISTA_CHOICE"], 0);

    let monthly = service
        .monthly_counts(&["OFF10".into(), "FREE_DRINK".into()])
        .await
        .unwrap();
    assert_eq!(
        monthly["OFF10"],
        MonthlyCount {
            consumed: 1,
            remaining: 8,
            limit: 9
        }
    );
    // No configured limit: no monthly bookkeeping.
    assert_eq!(
        monthly["FREE_DRINK"],
        MonthlyCount {
            consumed: 0,
            remaining: 0,
            limit: 0
        }
    );
}

#[tokio::test]
async fn monthly_counter_stops_at_the_limit() {
    let (service, store) = memory_service();
    let monthly_key = keys::monthly_prize_key("OFF10", &service.current_month());
    store.set(&monthly_key, "9").await.unwrap();

    let award = service.record_prize_win(DAY, "OFF10").await.unwrap();
    assert_eq!(award.count, 1);
    assert_eq!(store.get(&monthly_key).await.unwrap().as_deref(), Some("9"));

    let monthly = service.monthly_counts(&["OFF10".into()]).await.unwrap();
    assert_eq!(monthly["OFF10"].remaining, 0);
}

#[tokio::test]
async fn monthly_limit_can_overshoot_under_a_race() {
    // Two awards that both read consumed = 8 before either increments.
    let inner = Arc::new(InMemoryStore::new());
    let service = service_with_store(Arc::new(StaleReadStore {
        inner: inner.clone(),
        stale_marker: "wheel_month_prize_".to_string(),
        stale_value: "8".to_string(),
    }));
    let monthly_key = keys::monthly_prize_key("OFF10", &service.current_month());
    inner.set(&monthly_key, "8").await.unwrap();

    service.record_prize_win(DAY, "OFF10").await.unwrap();
    service.record_prize_win(DAY, "OFF10").await.unwrap();

    assert_eq!(inner.get(&monthly_key).await.unwrap().as_deref(), Some("10"));
}

#[tokio::test]
async fn empty_prize_id_is_rejected_without_writes() {
    let (service, store) = memory_service();
    let err = service.record_prize_win(DAY, "").await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn duplicate_ids_collapse() {
    let (service, _) = memory_service();
    service.record_prize_win(DAY, "OFF10").await.unwrap();

    let ids: Vec<String> = vec!["OFF10".into(), "OFF10".into(), " OFF10 ".into()];
    let daily = service.prize_counts(DAY, &ids).await.unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily["OFF10"], 1);

    let monthly = service.monthly_counts(&ids).await.unwrap();
    assert_eq!(monthly.len(), 1);
}

#[rstest]
#[case::monday(MONDAY)]
#[case::tuesday("2024-1-16")]
#[case::saturday("2024-1-20")]
#[case::sunday("2024-1-21")]
#[tokio::test]
async fn paced_prize_is_closed_outside_wed_to_fri(#[case] day: &str) {
    let (service, _) = memory_service();
    let gate = service.pre_spin(day).await;
    assert!(!gate.allow_paced_prize);
}

#[tokio::test]
async fn monday_stays_closed_even_when_the_ratio_is_full() {
    let (service, _) = memory_service();
    // 9 left with 3 days to go puts the ratio at 1, and the draw for this
    // day (0.058) would pass it.
    assert_eq!(pacing::pacing_ratio(9, date(2024, 1, 29)), 1.0);
    assert!(pacing::seeded_random(&pacing::pacing_seed("2024-1", "2024-1-29")) < 1.0);

    assert!(!service.pre_spin("2024-1-29").await.allow_paced_prize);
    // Same ratio on the following Wednesday opens it.
    assert!(service.pre_spin("2024-1-31").await.allow_paced_prize);
}

#[tokio::test]
async fn paced_prize_follows_the_seeded_draw() {
    let (service, _) = memory_service();
    assert!(service.pre_spin(WEDNESDAY).await.allow_paced_prize);
    assert!(!service.pre_spin(THURSDAY).await.allow_paced_prize);
}

#[tokio::test]
async fn pre_spin_is_deterministic_for_the_same_state() {
    let (service, _) = memory_service();
    for day in [WEDNESDAY, THURSDAY, "2024-1-19", "2024-1-26"] {
        let first = service.pre_spin(day).await;
        let second = service.pre_spin(day).await;
        assert_eq!(first, second, "draw for {day} changed between calls");
    }
}

#[tokio::test]
async fn paced_prize_closes_when_month_is_exhausted() {
    let (service, store) = memory_service();
    let monthly_key = keys::monthly_prize_key("OFF10", &service.current_month());
    store.set(&monthly_key, "9").await.unwrap();

    assert!(!service.pre_spin(WEDNESDAY).await.allow_paced_prize);
}

#[tokio::test]
async fn unparseable_day_never_opens_the_paced_prize() {
    let (service, _) = memory_service();
    assert!(!service.pre_spin("launch-day").await.allow_paced_prize);
}

#[tokio::test]
async fn pre_spin_fails_open_when_backend_is_down() {
    let store = Arc::new(UnavailableStore::default());
    let service = service_with_store(store.clone());

    assert_eq!(service.pre_spin(WEDNESDAY).await, SpinGate::FAIL_OPEN);
    assert!(store.calls.load(std::sync::atomic::Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn writes_surface_backend_errors() {
    let service = service_with_store(Arc::new(UnavailableStore::default()));

    assert!(service.record_loss(DAY).await.unwrap_err().is_backend_unavailable());
    assert!(service.record_win(DAY).await.unwrap_err().is_backend_unavailable());
    assert!(service
        .record_prize_win(DAY, "OFF10")
        .await
        .unwrap_err()
        .is_backend_unavailable());
    assert!(service.daily_status(DAY).await.is_err());
}

#[tokio::test]
async fn failed_retention_refresh_is_reported_after_the_write() {
    let inner = Arc::new(InMemoryStore::new());
    let service = service_with_store(Arc::new(ExpireFailsStore {
        inner: inner.clone(),
    }));

    assert!(service.record_loss(DAY).await.is_err());
    // The increment itself went through; nothing undoes it.
    assert_eq!(
        inner.get(&keys::losses_key(DAY)).await.unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn resolve_day_defaults_to_clock_today() {
    let (service, _) = memory_service();
    assert_eq!(service.resolve_day(None), "2024-1-15");
    assert_eq!(service.resolve_day(Some("  ")), "2024-1-15");
    assert_eq!(service.resolve_day(Some(" 2024-2-1 ")), "2024-2-1");
    assert_eq!(service.current_month(), "2024-1");
}
