//! Registry of tracked aircraft
//!
//!  Maps ICAO addresses to accumulators, keeps the set of aircraft with a
//!  known position and ages out silent aircraft.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::aircraft::{AircraftState, AircraftStateAccumulator};
use crate::database::AircraftDatabase;
use crate::decoder::Message;
use crate::error::Result;
use crate::frame::IcaoAddress;

/// Silence after which an aircraft is dropped.
pub const PURGE_AGE_NS: u64 = 60_000_000_000;

/// Visible-set change caused by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegistryEvent {
    /// The aircraft got its first position and is now visible.
    Appeared(IcaoAddress),
    /// A visible aircraft was updated.
    Updated(IcaoAddress),
}

pub struct AircraftRegistry<D> {
    database: D,
    accumulators: HashMap<IcaoAddress, AircraftStateAccumulator<AircraftState>>,
    visible: BTreeSet<IcaoAddress>,
    /// Timestamp of the latest message seen.
    now_ns: u64,
    messages_received: u64,
}

impl<D: AircraftDatabase> AircraftRegistry<D> {
    pub fn new(database: D) -> Self {
        Self {
            database,
            accumulators: HashMap::new(),
            visible: BTreeSet::new(),
            now_ns: 0,
            messages_received: 0,
        }
    }

    /// Apply one message.
    ///
    /// Messages from aircraft unknown to the database are dropped and
    /// yield `Ok(None)`, as do messages for aircraft not yet visible.
    pub fn update_with_message(&mut self, message: &Message) -> Result<Option<RegistryEvent>> {
        self.messages_received += 1;
        self.now_ns = message.timestamp_ns();

        let icao = message.icao();
        if !self.accumulators.contains_key(icao) {
            let Some(data) = self.database.get(icao)? else {
                return Ok(None);
            };
            debug!(icao = %icao, registration = %data.registration, "new aircraft");
            let state = AircraftState::new(icao.clone(), data);
            self.accumulators
                .insert(icao.clone(), AircraftStateAccumulator::new(state));
        }
        let Some(accumulator) = self.accumulators.get_mut(icao) else {
            return Ok(None);
        };

        accumulator.update(message);
        if !accumulator.state().has_position() {
            return Ok(None);
        }

        if self.visible.insert(icao.clone()) {
            debug!(icao = %icao, "aircraft visible");
            Ok(Some(RegistryEvent::Appeared(icao.clone())))
        } else {
            Ok(Some(RegistryEvent::Updated(icao.clone())))
        }
    }

    /// Remove every aircraft silent for [`PURGE_AGE_NS`] or more, returning
    /// the removed addresses.
    pub fn purge(&mut self) -> Vec<IcaoAddress> {
        let now = self.now_ns;
        let mut removed = Vec::new();
        self.accumulators.retain(|icao, acc| {
            let keep = now.saturating_sub(acc.state().last_message_ns) < PURGE_AGE_NS;
            if !keep {
                removed.push(icao.clone());
            }
            keep
        });

        for icao in &removed {
            self.visible.remove(icao);
            debug!(icao = %icao, "aircraft purged");
        }
        removed.sort();
        removed
    }

    pub fn get(&self, icao: &IcaoAddress) -> Option<&AircraftState> {
        self.accumulators.get(icao).map(|acc| acc.state())
    }

    /// Aircraft with a known position, ordered by address.
    pub fn visible(&self) -> impl Iterator<Item = &AircraftState> {
        self.visible
            .iter()
            .filter_map(|icao| self.accumulators.get(icao))
            .map(|acc| acc.state())
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Number of aircraft tracked, visible or not.
    pub fn tracked_count(&self) -> usize {
        self.accumulators.len()
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }
}
