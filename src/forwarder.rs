use crate::{envelope::EventEnvelope, hec::Transport};
use tokio::sync::mpsc::UnboundedReceiver;

/// `ForwardReport` summarizes the batches sent for one object
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForwardReport {
    /// Batches handed to the transport
    pub batches: usize,
    /// Batches the transport failed to deliver
    pub failed: usize,
    /// Events acknowledged by the collector
    pub delivered: usize,
}

/// Drain the queue into batches of at most `batch_size` events.
///
/// Returns once the queue is closed and the last partial batch, if any,
/// has been sent. A failed batch is logged and dropped.
#[tracing::instrument(skip(rx, transport))]
pub async fn forward<T>(
    mut rx: UnboundedReceiver<EventEnvelope>,
    transport: &T,
    batch_size: usize,
) -> ForwardReport
where
    T: Transport + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut report = ForwardReport::default();
    let mut batch = Vec::with_capacity(batch_size);

    while let Some(envelope) = rx.recv().await {
        batch.push(envelope);
        if batch.len() == batch_size {
            send_batch(transport, &mut batch, &mut report).await;
        }
    }

    if !batch.is_empty() {
        send_batch(transport, &mut batch, &mut report).await;
    }

    report
}

async fn send_batch<T>(transport: &T, batch: &mut Vec<EventEnvelope>, report: &mut ForwardReport)
where
    T: Transport + ?Sized,
{
    report.batches += 1;
    let size = batch.len();

    match transport.send(batch.as_slice()).await {
        Ok(ack) => {
            report.delivered += size;
            tracing::info!(batch = report.batches, size, response = %ack, "batch forwarded");
        }
        Err(err) => {
            report.failed += 1;
            tracing::error!(
                batch = report.batches,
                size,
                status = err.status_code(),
                error = ?err,
                "failed to forward batch"
            );
        }
    }

    batch.clear();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{envelope::EnvelopeBuilder, test_util::*};
    use serde_json::json;
    use tokio::sync::mpsc;

    async fn run(events: usize, batch_size: usize, transport: &RecordingTransport) -> ForwardReport {
        let (tx, rx) = mpsc::unbounded_channel();
        let builder = EnvelopeBuilder::default();
        for i in 0..events {
            tx.send(builder.build(json!({ "n": i }))).unwrap();
        }
        drop(tx);

        forward(rx, transport, batch_size).await
    }

    #[tokio::test]
    async fn test_forward_in_order_batches() {
        let transport = RecordingTransport::default();

        let report = run(250, 100, &transport).await;

        assert_eq!(vec![100, 100, 50], transport.batch_sizes());
        assert_eq!(
            ForwardReport { batches: 3, failed: 0, delivered: 250 },
            report
        );
        let numbers: Vec<_> = transport.events().iter().map(|e| e["n"].clone()).collect();
        assert_eq!((0..250).map(|i| json!(i)).collect::<Vec<_>>(), numbers);
    }

    #[tokio::test]
    async fn test_forward_exact_multiple_has_no_trailing_batch() {
        let transport = RecordingTransport::default();

        run(200, 100, &transport).await;

        assert_eq!(vec![100, 100], transport.batch_sizes());
    }

    #[tokio::test]
    async fn test_forward_batch_cap() {
        for (events, cap) in [(1, 1), (7, 3), (99, 100), (101, 100), (10, 4)] {
            let transport = RecordingTransport::default();

            run(events, cap, &transport).await;

            let sizes = transport.batch_sizes();
            assert!(sizes.iter().all(|s| *s <= cap), "{events}/{cap}: {sizes:?}");
            assert_eq!(events, sizes.iter().sum::<usize>());
            let expected_last = if events % cap == 0 { cap } else { events % cap };
            assert_eq!(Some(&expected_last), sizes.last());
        }
    }

    #[tokio::test]
    async fn test_forward_empty_queue() {
        let transport = RecordingTransport::default();

        let report = run(0, 100, &transport).await;

        assert_eq!(ForwardReport::default(), report);
        assert!(transport.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_forward_failure_is_isolated() {
        let transport = RecordingTransport::failing_on(&[1]);

        let report = run(250, 100, &transport).await;

        assert_eq!(vec![100, 100, 50], transport.batch_sizes());
        assert_eq!(
            ForwardReport { batches: 3, failed: 1, delivered: 150 },
            report
        );
    }

    #[tokio::test]
    async fn test_forward_while_producer_is_running() {
        let transport = RecordingTransport::default();
        let (tx, rx) = mpsc::unbounded_channel();

        let producer = async move {
            let builder = EnvelopeBuilder::default();
            for i in 0..5 {
                tx.send(builder.build(json!(i))).unwrap();
                tokio::task::yield_now().await;
            }
        };
        let (_, report) = tokio::join!(producer, forward(rx, &transport, 2));

        assert_eq!(vec![2, 2, 1], transport.batch_sizes());
        assert_eq!(3, report.batches);
    }
}
