// Property tests for the countdown decomposition.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use weddingclock::prelude::*;

fn target() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 20, 16, 0, 0).unwrap()
}

proptest! {
    /// Property: as `now` moves forward the remaining total never grows.
    #[test]
    fn prop_monotonic(start in -1_000_000_000i64..1_000_000_000, steps in prop::collection::vec(0i64..100_000_000, 1..50)) {
        let mut now = target() - Duration::milliseconds(start);
        let mut previous = CountdownState::between(target(), now).total_millis();
        for step in steps {
            now += Duration::milliseconds(step);
            let current = CountdownState::between(target(), now).total_millis();
            prop_assert!(current <= previous);
            previous = current;
        }
    }

    /// Property: at or after the target every field is zero.
    #[test]
    fn prop_floor_at_zero(past in 0i64..10_000_000_000) {
        let state = CountdownState::between(target(), target() + Duration::milliseconds(past));
        prop_assert_eq!(state, CountdownState::default());
    }

    /// Property: the fields stay in range and add back up to the whole
    /// seconds remaining.
    #[test]
    fn prop_decomposition(remaining in 1i64..10_000_000_000) {
        let state = CountdownState::between(target(), target() - Duration::milliseconds(remaining));
        prop_assert!(state.hours < 24);
        prop_assert!(state.minutes < 60);
        prop_assert!(state.seconds < 60);
        prop_assert_eq!(state.total_millis() as i64, remaining / 1_000 * 1_000);
    }
}

#[test]
fn one_day_one_hour_one_minute_one_second() {
    let now = target() - Duration::milliseconds(90_061_000);
    assert_eq!(
        CountdownState::between(target(), now),
        CountdownState { days: 1, hours: 1, minutes: 1, seconds: 1 }
    );
}
