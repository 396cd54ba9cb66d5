//!   adsb-track:   ADS-B 1090ES decoder and aircraft tracker
//!
//!  Raw 12-bit I/Q samples go through power computation, preamble
//!  detection and CRC checking; the surviving frames are decoded into
//!  identification, position and velocity messages and folded into a
//!  registry of aircraft states.

pub mod aircraft;
pub mod bits;
pub mod byte_seq;
pub mod config;
pub mod cpr;
pub mod crc;
pub mod database;
pub mod decoder;
pub mod demodulator;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod power;
pub mod registry;
pub mod replay;
pub mod samples;
pub mod units;
pub mod window;

pub use aircraft::{AircraftState, AircraftStateAccumulator, StateSetter};
pub use cpr::GeoPos;
pub use database::{AircraftData, AircraftDatabase, AnyAircraft, MemoryDatabase};
pub use decoder::{CallSign, Message, Parity};
pub use demodulator::{Demodulator, FrameSource};
pub use error::{Error, Result};
pub use frame::{IcaoAddress, RawFrame};
pub use registry::{AircraftRegistry, RegistryEvent};
pub use replay::FrameReplay;
