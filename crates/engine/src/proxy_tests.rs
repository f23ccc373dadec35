use super::*;

#[test]
fn ring_buffer_drops_oldest_beyond_capacity() {
    let mut buf = RingBuffer::new(2);
    buf.push(Bytes::from_static(b"a\n"));
    buf.push(Bytes::from_static(b"b\n"));
    buf.push(Bytes::from_static(b"c\n"));
    let snapshot = buf.snapshot();
    assert_eq!(snapshot, vec![Bytes::from_static(b"b\n"), Bytes::from_static(b"c\n")]);
}

#[test]
fn line_accumulator_splits_on_newline_and_holds_partial() {
    let mut acc = LineAccumulator::new();
    let lines = acc.feed(b"hello\nworld");
    assert_eq!(lines, vec![Bytes::from_static(b"hello\n")]);
    assert_eq!(acc.flush(), Some(Bytes::from_static(b"world")));
    assert_eq!(acc.flush(), None);
}

#[test]
fn line_accumulator_handles_multiple_lines_in_one_chunk() {
    let mut acc = LineAccumulator::new();
    let lines = acc.feed(b"a\nb\nc");
    assert_eq!(
        lines,
        vec![Bytes::from_static(b"a\n"), Bytes::from_static(b"b\n")]
    );
    assert_eq!(acc.flush(), Some(Bytes::from_static(b"c")));
}

#[tokio::test]
async fn registry_broadcast_delivers_to_all_clients() {
    let mut registry = ClientRegistry::new();
    let (_id1, mut rx1) = registry.register(8);
    let (_id2, mut rx2) = registry.register(8);

    let dead = registry.broadcast(Bytes::from_static(b"hi\n")).await;
    assert!(dead.is_empty());
    assert_eq!(rx1.recv().await, Some(Bytes::from_static(b"hi\n")));
    assert_eq!(rx2.recv().await, Some(Bytes::from_static(b"hi\n")));
}

#[tokio::test]
async fn registry_drops_client_whose_receiver_was_closed() {
    let mut registry = ClientRegistry::new();
    let (id, rx) = registry.register(8);
    drop(rx);

    let dead = registry.broadcast(Bytes::from_static(b"hi\n")).await;
    assert_eq!(dead, vec![id]);
    registry.remove(id);
    assert!(registry.is_empty());
}

/// Spec §8 end-to-end scenario 5: a slow client that never drains its
/// queue is dropped by the broadcast deadline without affecting a
/// well-behaved client registered alongside it.
#[tokio::test]
async fn registry_drops_stalled_client_but_delivers_to_the_rest() {
    let mut registry = ClientRegistry::new();
    let (slow_id, slow_rx) = registry.register(1);
    let (_fast_id, mut fast_rx) = registry.register(8);

    // Fill the slow client's one-slot queue without ever receiving from it,
    // so the next broadcast has no room and must block past the deadline.
    let dead = registry.broadcast(Bytes::from_static(b"first\n")).await;
    assert!(dead.is_empty());

    let started = std::time::Instant::now();
    let dead = registry.broadcast(Bytes::from_static(b"second\n")).await;
    assert_eq!(dead, vec![slow_id]);
    assert!(started.elapsed() >= BROADCAST_DEADLINE);

    registry.remove(slow_id);
    assert_eq!(registry.len(), 1);

    assert_eq!(fast_rx.recv().await, Some(Bytes::from_static(b"first\n")));
    assert_eq!(fast_rx.recv().await, Some(Bytes::from_static(b"second\n")));
    drop(slow_rx);
}
