//! Producer / consumer plumbing
//!
//!  A producer pulls frames from a [`FrameSource`], decodes them and
//!  pushes messages into a bounded channel. The consumer drains the
//!  channel in small batches on each tick, owns the registry, and mirrors
//!  the visible aircraft into a [`Published`] view other tasks can read.
//!  Only aircraft touched during a tick are copied into the view.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::aircraft::AircraftState;
use crate::database::AircraftDatabase;
use crate::decoder::{self, Message};
use crate::demodulator::FrameSource;
use crate::error::Result;
use crate::frame::IcaoAddress;
use crate::registry::{AircraftRegistry, RegistryEvent};
use crate::replay::Pacer;

/// Minimum wall-clock time between two purges.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Valid frames read from the source.
    pub frames: u64,
    /// Messages decoded and queued.
    pub messages: u64,
}

/// Pull every frame out of `source` and queue the decoded messages.
///
/// Stops at end of stream or when the receiving side is gone. With a
/// `pacer`, each frame is held back until its timestamp is due.
pub fn run_producer<S: FrameSource + ?Sized>(
    source: &mut S,
    sender: &Sender<Message>,
    pacer: Option<&Pacer>,
) -> Result<ProducerStats> {
    let mut stats = ProducerStats::default();

    while let Some(frame) = source.next_frame()? {
        stats.frames += 1;
        if let Some(pacer) = pacer {
            pacer.wait_for(frame.timestamp_ns());
        }

        let Some(message) = decoder::decode(&frame) else {
            continue;
        };
        if sender.send(message).is_err() {
            debug!("message queue closed, stopping producer");
            return Ok(stats);
        }
        stats.messages += 1;
    }

    info!(frames = stats.frames, messages = stats.messages, "end of stream");
    Ok(stats)
}

/// Read-only view of the registry, shared across tasks.
#[derive(Debug, Default)]
pub struct Published {
    aircraft: RwLock<BTreeMap<IcaoAddress, Arc<AircraftState>>>,
    messages_received: AtomicU64,
    visible_count: AtomicUsize,
}

impl Published {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible aircraft, ordered by ICAO address.
    pub fn aircraft(&self) -> Vec<Arc<AircraftState>> {
        self.aircraft.read().values().cloned().collect()
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count.load(Ordering::Relaxed)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let aircraft = self.aircraft.read();
        let states: Vec<&AircraftState> = aircraft.values().map(Arc::as_ref).collect();
        serde_json::to_string_pretty(&states)
    }

    /// Refresh the entries for `touched` and drop the `purged` ones.
    fn mirror<D: AircraftDatabase>(
        &self,
        registry: &AircraftRegistry<D>,
        touched: &[IcaoAddress],
        purged: &[IcaoAddress],
    ) {
        let mut aircraft = self.aircraft.write();
        for icao in purged {
            aircraft.remove(icao);
        }
        for icao in touched {
            match registry.get(icao) {
                Some(state) => {
                    aircraft.insert(icao.clone(), Arc::new(state.clone()));
                }
                None => {
                    aircraft.remove(icao);
                }
            }
        }
        self.visible_count.store(aircraft.len(), Ordering::Relaxed);
        self.messages_received
            .store(registry.messages_received(), Ordering::Relaxed);
    }
}

/// Single owner of the registry.
pub struct Consumer<D> {
    receiver: Receiver<Message>,
    registry: AircraftRegistry<D>,
    published: Arc<Published>,
    batch: usize,
    last_purge: Option<Instant>,
    disconnected: bool,
}

impl<D: AircraftDatabase> Consumer<D> {
    pub fn new(receiver: Receiver<Message>, registry: AircraftRegistry<D>, batch: usize) -> Self {
        Self {
            receiver,
            registry,
            published: Arc::new(Published::new()),
            batch,
            last_purge: None,
            disconnected: false,
        }
    }

    pub fn published(&self) -> Arc<Published> {
        Arc::clone(&self.published)
    }

    pub fn registry(&self) -> &AircraftRegistry<D> {
        &self.registry
    }

    /// True once every producer is gone and the queue is drained.
    pub fn is_finished(&self) -> bool {
        self.disconnected
    }

    /// Process up to one batch of queued messages.
    ///
    /// Returns how many messages were taken off the queue.
    pub fn tick(&mut self) -> Result<usize> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Result<usize> {
        let mut processed = 0;
        let mut touched: Vec<IcaoAddress> = Vec::new();

        while processed < self.batch {
            let message = match self.receiver.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            };
            processed += 1;

            match self.registry.update_with_message(&message)? {
                Some(RegistryEvent::Appeared(icao)) => {
                    debug!(icao = %icao, "aircraft appeared");
                    touched.push(icao);
                }
                Some(RegistryEvent::Updated(icao)) => touched.push(icao),
                None => {}
            }
        }
        touched.sort();
        touched.dedup();

        let mut purged = Vec::new();
        let purge_due = self
            .last_purge
            .is_none_or(|last| now.saturating_duration_since(last) >= PURGE_INTERVAL);
        if purge_due {
            self.last_purge = Some(now);
            purged = self.registry.purge();
        }

        if processed > 0 || !purged.is_empty() {
            self.published.mirror(&self.registry, &touched, &purged);
        }
        Ok(processed)
    }
}
