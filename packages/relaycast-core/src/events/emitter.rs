//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete broadcast
//! channels, enabling testing and alternative transport implementations.

use super::{CallEvent, PlaybackEvent};

/// Trait for emitting domain events without knowledge of transport.
pub trait EventEmitter: Send + Sync {
    /// Emits a queue / now-playing event.
    fn emit_playback(&self, event: PlaybackEvent);

    /// Emits a call session event.
    fn emit_call(&self, event: CallEvent);
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level. Without a tracing subscriber the records
/// go to the `log` facade, so `env_logger` prints them.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_playback(&self, event: PlaybackEvent) {
        tracing::debug!(?event, "playback_event");
    }

    fn emit_call(&self, event: CallEvent) {
        tracing::debug!(?event, "call_event");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Test emitter that records every event.
    #[derive(Default)]
    pub struct RecordingEventEmitter {
        pub playback: Mutex<Vec<PlaybackEvent>>,
        pub call: Mutex<Vec<CallEvent>>,
    }

    impl EventEmitter for RecordingEventEmitter {
        fn emit_playback(&self, event: PlaybackEvent) {
            self.playback.lock().push(event);
        }

        fn emit_call(&self, event: CallEvent) {
            self.call.lock().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingEventEmitter;
    use super::*;
    use crate::platform::GroupId;
    use std::sync::Mutex;

    /// `log` backend that keeps every formatted message.
    struct CapturingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl log::Log for CapturingLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            self.lines.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    static LOGGER: CapturingLogger = CapturingLogger {
        lines: Mutex::new(Vec::new()),
    };

    #[test]
    fn logging_emitter_reaches_log_backend() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        LoggingEventEmitter.emit_call(CallEvent::Left {
            group_id: GroupId(-42),
            timestamp: 0,
        });

        let lines = LOGGER.lines.lock().unwrap();
        assert!(
            lines.iter().any(|l| l.contains("call_event")),
            "captured: {lines:?}"
        );
    }

    #[test]
    fn recording_emitter_tracks_events() {
        let emitter = RecordingEventEmitter::default();

        emitter.emit_playback(PlaybackEvent::QueueFinished {
            group_id: GroupId(1),
            timestamp: 0,
        });
        emitter.emit_call(CallEvent::Left {
            group_id: GroupId(1),
            timestamp: 0,
        });
        emitter.emit_call(CallEvent::Left {
            group_id: GroupId(2),
            timestamp: 0,
        });

        assert_eq!(emitter.playback.lock().len(), 1);
        assert_eq!(emitter.call.lock().len(), 2);
    }
}
