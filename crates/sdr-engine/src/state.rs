//! Control-plane to audio-thread parameter delivery (§5 Concurrency
//! Model): a single-writer/single-reader channel of discrete parameter
//! writes, drained by the audio thread at frame boundaries and applied
//! to the wired [`sdr_dsp::EffectNode`] chain via `set_param`.
//!
//! Continuous numeric knobs are carried directly by `sdr_core::AtomicParam`
//! cells and need no queue; this module is for the remaining writes that
//! don't fit a single atomic cell — enable/disable toggles, notch
//! add/remove, and anything else better modelled as a discrete event than
//! a continuously-sampled value.

use rtrb::{Consumer, Producer, RingBuffer};
use sdr_core::EffectKind;
use sdr_dsp::ParamValue;

/// One discrete parameter write destined for a specific effect node.
#[derive(Debug, Clone)]
pub struct ParamChange {
    pub target: EffectKind,
    pub name: &'static str,
    pub value: ParamValue,
}

/// Producer half, held by the control plane (connector/session). Never
/// blocks: a full queue drops the oldest pending change rather than
/// stalling the caller, since a later write supersedes it anyway.
pub struct ParamQueueProducer {
    inner: Producer<ParamChange>,
}

impl ParamQueueProducer {
    /// Enqueues a change. Returns `false` if the queue is full and the
    /// write was dropped.
    pub fn push(&mut self, change: ParamChange) -> bool {
        self.inner.push(change).is_ok()
    }
}

/// Consumer half, held by the audio thread. Drained once per frame,
/// before the graph for that frame is assembled, so every applied change
/// is visible before the next block of effect processing.
pub struct ParamQueueConsumer {
    inner: Consumer<ParamChange>,
}

impl ParamQueueConsumer {
    /// Drains all pending changes, applying each via `apply`. Returns the
    /// number applied.
    pub fn drain_into(&mut self, mut apply: impl FnMut(ParamChange)) -> usize {
        let mut count = 0;
        while let Ok(change) = self.inner.pop() {
            apply(change);
            count += 1;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Builds a bounded producer/consumer pair. 256 entries comfortably
/// absorbs a burst of UI-driven parameter writes between audio frames.
pub fn param_queue(capacity: usize) -> (ParamQueueProducer, ParamQueueConsumer) {
    let (producer, consumer) = RingBuffer::new(capacity);
    (
        ParamQueueProducer { inner: producer },
        ParamQueueConsumer { inner: consumer },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_apply_in_fifo_order() {
        let (mut producer, mut consumer) = param_queue(8);
        producer.push(ParamChange {
            target: EffectKind::Gain,
            name: "volume",
            value: ParamValue::Float(0.5),
        });
        producer.push(ParamChange {
            target: EffectKind::Gain,
            name: "muted",
            value: ParamValue::Bool(true),
        });

        let mut applied = Vec::new();
        let count = consumer.drain_into(|change| applied.push(change.name));
        assert_eq!(count, 2);
        assert_eq!(applied, vec!["volume", "muted"]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn full_queue_drops_rather_than_blocks() {
        let (mut producer, _consumer) = param_queue(1);
        assert!(producer.push(ParamChange {
            target: EffectKind::Squelch,
            name: "attack_ms",
            value: ParamValue::Float(5.0),
        }));
        assert!(!producer.push(ParamChange {
            target: EffectKind::Squelch,
            name: "release_ms",
            value: ParamValue::Float(5.0),
        }));
    }
}
