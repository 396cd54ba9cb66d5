//! Aircraft state tracking
//!
//!  Folds decoded messages into a per-aircraft state, pairing even and
//!  odd position reports into global positions.

use serde::Serialize;

use crate::cpr::{self, GeoPos};
use crate::database::AircraftData;
use crate::decoder::{CallSign, Message, Parity, PositionMessage};
use crate::frame::IcaoAddress;

/// Maximum age difference between an even and an odd position report
/// for them to be combined.
pub const MAX_PAIRING_GAP_NS: u64 = 10_000_000_000;

/// Receiver of state updates from an [`AircraftStateAccumulator`].
pub trait StateSetter {
    fn set_last_message_timestamp_ns(&mut self, timestamp_ns: u64);
    fn set_category(&mut self, category: u8);
    fn set_call_sign(&mut self, call_sign: CallSign);
    fn set_position(&mut self, position: GeoPos);
    fn set_altitude(&mut self, altitude_m: f64);
    fn set_velocity(&mut self, velocity_mps: f64);
    fn set_track_or_heading(&mut self, degrees: f64);
}

/// One point of an aircraft's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub position: GeoPos,
    pub altitude_m: f64,
}

/// Current known state of one aircraft.
#[derive(Debug, Clone, Serialize)]
pub struct AircraftState {
    pub icao: IcaoAddress,
    pub data: AircraftData,
    pub last_message_ns: u64,
    pub category: Option<u8>,
    pub call_sign: Option<CallSign>,
    pub position: Option<GeoPos>,
    pub altitude_m: Option<f64>,
    pub velocity_mps: Option<f64>,
    pub track_or_heading_deg: Option<f64>,
    pub trajectory: Vec<TrajectoryPoint>,
    /// Message timestamp of the last trajectory append.
    #[serde(skip)]
    trajectory_timestamp_ns: u64,
}

impl AircraftState {
    pub fn new(icao: IcaoAddress, data: AircraftData) -> Self {
        Self {
            icao,
            data,
            last_message_ns: 0,
            category: None,
            call_sign: None,
            position: None,
            altitude_m: None,
            velocity_mps: None,
            track_or_heading_deg: None,
            trajectory: Vec::new(),
            trajectory_timestamp_ns: 0,
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Append a trajectory point when the position moved, or refresh the
    /// altitude of the last one when it came from the same message.
    fn update_trajectory(&mut self) {
        let (Some(position), Some(altitude_m)) = (self.position, self.altitude_m) else {
            return;
        };
        let point = TrajectoryPoint { position, altitude_m };

        match self.trajectory.last_mut() {
            Some(last) if last.position == position => {
                if self.trajectory_timestamp_ns == self.last_message_ns {
                    last.altitude_m = altitude_m;
                }
            }
            _ => {
                self.trajectory.push(point);
                self.trajectory_timestamp_ns = self.last_message_ns;
            }
        }
    }
}

impl StateSetter for AircraftState {
    fn set_last_message_timestamp_ns(&mut self, timestamp_ns: u64) {
        self.last_message_ns = timestamp_ns;
    }

    fn set_category(&mut self, category: u8) {
        self.category = Some(category);
    }

    fn set_call_sign(&mut self, call_sign: CallSign) {
        self.call_sign = Some(call_sign);
    }

    fn set_position(&mut self, position: GeoPos) {
        self.position = Some(position);
        self.update_trajectory();
    }

    fn set_altitude(&mut self, altitude_m: f64) {
        self.altitude_m = Some(altitude_m);
        self.update_trajectory();
    }

    fn set_velocity(&mut self, velocity_mps: f64) {
        self.velocity_mps = Some(velocity_mps);
    }

    fn set_track_or_heading(&mut self, degrees: f64) {
        self.track_or_heading_deg = Some(degrees);
    }
}

/// Most recent position report of each parity.
#[derive(Debug, Clone, Default)]
pub struct ParityMemory {
    slots: [Option<PositionMessage>; 2],
}

impl ParityMemory {
    pub fn get(&self, parity: Parity) -> Option<&PositionMessage> {
        self.slots[parity.index()].as_ref()
    }

    pub fn store(&mut self, message: PositionMessage) {
        let slot = message.parity.index();
        self.slots[slot] = Some(message);
    }
}

/// Applies messages of one aircraft, in arrival order, to a state.
pub struct AircraftStateAccumulator<S> {
    state: S,
    memory: ParityMemory,
}

impl<S: StateSetter> AircraftStateAccumulator<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            memory: ParityMemory::default(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn update(&mut self, message: &Message) {
        self.state.set_last_message_timestamp_ns(message.timestamp_ns());

        match message {
            Message::Identification(m) => {
                self.state.set_category(m.category);
                self.state.set_call_sign(m.call_sign.clone());
            }
            Message::Position(m) => {
                self.state.set_altitude(m.altitude_m);
                if let Some(position) = self.pair(m) {
                    self.state.set_position(position);
                }
                self.memory.store(m.clone());
            }
            Message::Velocity(m) => {
                self.state.set_velocity(m.speed_mps);
                self.state.set_track_or_heading(m.track_or_heading_deg);
            }
        }
    }

    /// Resolve `latest` against the stored report of opposite parity.
    fn pair(&self, latest: &PositionMessage) -> Option<GeoPos> {
        let other = self.memory.get(latest.parity.opposite())?;
        if latest.timestamp_ns.abs_diff(other.timestamp_ns) > MAX_PAIRING_GAP_NS {
            return None;
        }

        let (even, odd) = match latest.parity {
            Parity::Even => (latest, other),
            Parity::Odd => (other, latest),
        };
        cpr::decode_position(even.x, even.y, odd.x, odd.y, latest.parity)
    }
}
