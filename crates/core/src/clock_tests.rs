use super::*;
use chrono::Duration;

#[test]
fn fake_clock_only_advances_when_told_to() {
    let start = Utc::now();
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);
    clock.advance(Duration::seconds(30));
    assert_eq!(clock.now(), start + Duration::seconds(30));
}

#[test]
fn fake_clock_set_jumps_directly() {
    let clock = FakeClock::default();
    let target = Utc::now() + Duration::days(1);
    clock.set(target);
    assert_eq!(clock.now(), target);
}
