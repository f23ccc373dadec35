use super::*;
use std::collections::BTreeMap;

#[tokio::test]
async fn records_emitted_events() {
    let sink = FakeEventSink::new();
    sink.emit(&HookEvent::new("session.start", BTreeMap::new()))
        .await
        .unwrap();
    sink.emit(&HookEvent::new("session.stop", BTreeMap::new()))
        .await
        .unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name, "session.start");
    assert_eq!(events[1].name, "session.stop");
}
