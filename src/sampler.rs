//! Periodic position sampling.
//!
//! A `PositionSampler` is a small ticker thread that feeds epoch-tagged tick
//! messages into the engine queue while a track is loaded. The engine does
//! the actual position read on its own thread; the sampler only provides the
//! heartbeat. The ticker keeps running through pauses and buffering; the
//! engine discards samples that arrive while it is not playing or before the
//! duration is known, rather than the sampler stopping and restarting around
//! every rate change. One sampler exists per load cycle and is replaced
//! together with the backend player, so a sampler from a previous track can
//! never tick into the state of the next one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::engine::EngineEvent;

pub struct PositionSampler {
    stop: Arc<AtomicBool>,
}

impl PositionSampler {
    /// Spawn a ticker sending `SamplerTick { epoch }` every `interval`.
    pub(crate) fn start(tx: Sender<EngineEvent>, epoch: u64, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();

        thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                if tx.send(EngineEvent::SamplerTick { epoch }).is_err() {
                    // Engine gone; nothing left to tick for.
                    break;
                }
            }
        });

        Self { stop }
    }
}

impl Drop for PositionSampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn emits_epoch_tagged_ticks_until_dropped() {
        let (tx, rx) = mpsc::channel();
        let sampler = PositionSampler::start(tx, 7, Duration::from_millis(5));

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(first, EngineEvent::SamplerTick { epoch: 7 }));

        drop(sampler);
        // One in-flight tick may still land; after that the thread has seen
        // the stop flag.
        thread::sleep(Duration::from_millis(50));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(100));
        assert!(rx.try_recv().is_err());
    }
}
