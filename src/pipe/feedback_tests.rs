use super::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn tab_completion_round_trip() {
    let chan = Arc::new(FeedbackChannel::new());
    let fulfiller = Arc::clone(&chan);
    tokio::spawn(async move {
        // Give ask_for_feedback a chance to register its request first.
        tokio::time::sleep(Duration::from_millis(5)).await;
        fulfiller.try_fulfill(b"completion.txt").await;
    });

    let feedback = chan.ask_for_feedback(vec![9], Duration::from_millis(100)).await;
    assert_eq!(feedback, b"completion.txt");
}

#[tokio::test]
async fn up_arrow_recall_round_trip() {
    let chan = Arc::new(FeedbackChannel::new());
    let fulfiller = Arc::clone(&chan);
    let input = b"ls\x1b[A".to_vec();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        fulfiller.try_fulfill(b"ls -la").await;
    });

    let feedback = chan.ask_for_feedback(input, Duration::from_millis(100)).await;
    assert_eq!(feedback, b"ls -la");
}

#[tokio::test]
async fn times_out_when_nobody_fulfills() {
    let chan = FeedbackChannel::new();
    let feedback = chan.ask_for_feedback(vec![9], Duration::from_millis(20)).await;
    assert!(feedback.is_empty());
}

#[tokio::test]
async fn try_fulfill_is_a_noop_without_a_pending_request() {
    let chan = FeedbackChannel::new();
    // Should not panic or block.
    chan.try_fulfill(b"unsolicited").await;
}
