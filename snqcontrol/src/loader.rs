//! Queue-loading orchestration: optional clear, then sequential enqueues.

use tracing::warn;
use url::Url;

use crate::avtransport::AvTransportClient;
use crate::errors::ControlError;

/// The two queue operations the loader needs; a trait so the ordering
/// and abort behavior is testable without a device on the network.
pub trait QueueControl {
    fn clear(&self) -> Result<(), ControlError>;
    fn enqueue(&self, uri: &str) -> Result<(), ControlError>;
}

impl QueueControl for AvTransportClient {
    fn clear(&self) -> Result<(), ControlError> {
        self.remove_all_tracks_from_queue()
    }

    fn enqueue(&self, uri: &str) -> Result<(), ControlError> {
        self.add_uri_to_queue(uri)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub enqueued: usize,
    pub skipped: usize,
}

/// Clear the queue (unless appending), then enqueue each item in order.
///
/// Items that do not parse as URLs are skipped with a warning. The
/// first failing command aborts the remaining items and propagates.
pub fn load_queue<Q: QueueControl>(
    queue: &Q,
    items: &[String],
    append: bool,
) -> Result<LoadReport, ControlError> {
    if !append {
        queue.clear()?;
    }

    let mut report = LoadReport::default();

    for item in items {
        if Url::parse(item).is_err() {
            warn!("Skipping non-url: {}", item);
            report.skipped += 1;
            continue;
        }

        queue.enqueue(item)?;
        report.enqueued += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the operation sequence; optionally fails the nth enqueue.
    #[derive(Default)]
    struct RecordingQueue {
        ops: RefCell<Vec<String>>,
        fail_enqueue_at: Option<usize>,
    }

    impl RecordingQueue {
        fn failing_at(n: usize) -> Self {
            Self {
                fail_enqueue_at: Some(n),
                ..Default::default()
            }
        }

        fn ops(&self) -> Vec<String> {
            self.ops.borrow().clone()
        }

        fn enqueue_count(&self) -> usize {
            self.ops
                .borrow()
                .iter()
                .filter(|op| op.starts_with("enqueue"))
                .count()
        }
    }

    impl QueueControl for RecordingQueue {
        fn clear(&self) -> Result<(), ControlError> {
            self.ops.borrow_mut().push("clear".to_string());
            Ok(())
        }

        fn enqueue(&self, uri: &str) -> Result<(), ControlError> {
            let n = self.enqueue_count();
            self.ops.borrow_mut().push(format!("enqueue {uri}"));
            if self.fail_enqueue_at == Some(n) {
                return Err(ControlError::CommandFailed {
                    path: "/MediaRenderer/AVTransport/Control".to_string(),
                    status: 500,
                });
            }
            Ok(())
        }
    }

    fn items(uris: &[&str]) -> Vec<String> {
        uris.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clears_before_enqueuing_by_default() {
        let queue = RecordingQueue::default();
        let report = load_queue(
            &queue,
            &items(&["http://example.com/a.mp3", "http://example.com/b.mp3"]),
            false,
        )
        .unwrap();

        assert_eq!(queue.ops(), [
            "clear",
            "enqueue http://example.com/a.mp3",
            "enqueue http://example.com/b.mp3",
        ]);
        assert_eq!(report, LoadReport {
            enqueued: 2,
            skipped: 0
        });
    }

    #[test]
    fn append_mode_never_clears() {
        let queue = RecordingQueue::default();
        load_queue(&queue, &items(&["http://example.com/a.mp3"]), true).unwrap();

        assert_eq!(queue.ops(), ["enqueue http://example.com/a.mp3"]);
    }

    #[test]
    fn non_url_items_are_skipped_not_fatal() {
        let queue = RecordingQueue::default();
        let report = load_queue(
            &queue,
            &items(&["definitely not a url", "http://example.com/a.mp3"]),
            true,
        )
        .unwrap();

        assert_eq!(queue.ops(), ["enqueue http://example.com/a.mp3"]);
        assert_eq!(report, LoadReport {
            enqueued: 1,
            skipped: 1
        });
    }

    #[test]
    fn first_enqueue_failure_aborts_the_rest() {
        // Second enqueue returns HTTP 500: the third must never be sent.
        let queue = RecordingQueue::failing_at(1);
        let err = load_queue(
            &queue,
            &items(&[
                "http://example.com/a.mp3",
                "http://example.com/b.mp3",
                "http://example.com/c.mp3",
            ]),
            false,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ControlError::CommandFailed { status: 500, .. }
        ));
        assert_eq!(queue.ops(), [
            "clear",
            "enqueue http://example.com/a.mp3",
            "enqueue http://example.com/b.mp3",
        ]);
    }

    #[test]
    fn clear_failure_aborts_before_any_enqueue() {
        struct FailingClear;
        impl QueueControl for FailingClear {
            fn clear(&self) -> Result<(), ControlError> {
                Err(ControlError::CommandFailed {
                    path: "/MediaRenderer/AVTransport/Control".to_string(),
                    status: 500,
                })
            }
            fn enqueue(&self, _uri: &str) -> Result<(), ControlError> {
                panic!("enqueue must not be reached when clear fails");
            }
        }

        assert!(load_queue(&FailingClear, &items(&["http://example.com/a.mp3"]), false).is_err());
    }
}
