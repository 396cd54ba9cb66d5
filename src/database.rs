//! Static aircraft data lookup.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::frame::IcaoAddress;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum WakeTurbulenceCategory {
    Light,
    Medium,
    Heavy,
    #[default]
    Unknown,
}

impl WakeTurbulenceCategory {
    pub fn of(code: &str) -> Self {
        match code {
            "L" => Self::Light,
            "M" => Self::Medium,
            "H" => Self::Heavy,
            _ => Self::Unknown,
        }
    }
}

/// Registration and type information of one aircraft.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AircraftData {
    pub registration: String,
    pub type_designator: String,
    pub model: String,
    pub description: String,
    pub wake_turbulence_category: WakeTurbulenceCategory,
}

pub trait AircraftDatabase {
    /// Look up `icao`. `Ok(None)` means the aircraft is unknown.
    fn get(&self, icao: &IcaoAddress) -> Result<Option<AircraftData>>;
}

/// Database that knows every aircraft and nothing about any of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyAircraft;

impl AircraftDatabase for AnyAircraft {
    fn get(&self, _icao: &IcaoAddress) -> Result<Option<AircraftData>> {
        Ok(Some(AircraftData::default()))
    }
}

/// In-memory database, typically loaded from CSV.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    entries: HashMap<IcaoAddress, AircraftData>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, icao: IcaoAddress, data: AircraftData) {
        self.entries.insert(icao, data);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Self::from_reader(File::open(path)?)?;
        info!(path = %path.display(), entries = db.len(), "aircraft database loaded");
        Ok(db)
    }

    /// Parse CSV records of `ICAO,registration,type,model,description,wtc`.
    ///
    /// There is no header row. Blank lines and lines starting with `#`
    /// are skipped, and fields may be quoted.
    pub fn from_reader(reader: impl io::Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut db = Self::new();
        let mut record = csv::StringRecord::new();
        while csv_reader.read_record(&mut record).map_err(csv_error)? {
            let line = record.position().map_or(0, |p| p.line());
            if record.len() != RECORD_FIELDS {
                return Err(Error::Database(format!(
                    "line {}: expected {} fields, got {}",
                    line,
                    RECORD_FIELDS,
                    record.len()
                )));
            }

            let row: AircraftRecord = record.deserialize(None).map_err(csv_error)?;
            let icao = IcaoAddress::new(&row.icao.to_ascii_uppercase())
                .map_err(|e| Error::Database(format!("line {}: {}", line, e)))?;
            db.insert(icao, row.into());
        }
        Ok(db)
    }
}

const RECORD_FIELDS: usize = 6;

/// One row of the aircraft CSV, by position.
#[derive(Debug, Deserialize)]
struct AircraftRecord {
    icao: String,
    registration: String,
    type_designator: String,
    model: String,
    description: String,
    wtc: String,
}

impl From<AircraftRecord> for AircraftData {
    fn from(row: AircraftRecord) -> Self {
        Self {
            wake_turbulence_category: WakeTurbulenceCategory::of(&row.wtc),
            registration: row.registration,
            type_designator: row.type_designator,
            model: row.model,
            description: row.description,
        }
    }
}

fn csv_error(e: csv::Error) -> Error {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::Database(message),
    }
}

impl AircraftDatabase for MemoryDatabase {
    fn get(&self, icao: &IcaoAddress) -> Result<Option<AircraftData>> {
        Ok(self.entries.get(icao).cloned())
    }
}

impl<D: AircraftDatabase + ?Sized> AircraftDatabase for Box<D> {
    fn get(&self, icao: &IcaoAddress) -> Result<Option<AircraftData>> {
        (**self).get(icao)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CSV: &str = "\
# icao,registration,type,model,description,wtc
4B1814,HB-JDC,A20N,AIRBUS A-320neo,L2J,M

a05f21,N123AB,B738,BOEING 737-800,L2J,X
";

    #[test]
    fn test_load_csv() {
        let db = MemoryDatabase::from_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(db.len(), 2);

        let data = db.get(&IcaoAddress::new("4B1814").unwrap()).unwrap().unwrap();
        assert_eq!(data.registration, "HB-JDC");
        assert_eq!(data.type_designator, "A20N");
        assert_eq!(data.wake_turbulence_category, WakeTurbulenceCategory::Medium);

        let data = db.get(&IcaoAddress::new("A05F21").unwrap()).unwrap().unwrap();
        assert_eq!(data.wake_turbulence_category, WakeTurbulenceCategory::Unknown);

        assert!(db.get(&IcaoAddress::new("000001").unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_bad_lines() {
        let err = MemoryDatabase::from_reader(Cursor::new("4B1814,HB-JDC\n")).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        let err = MemoryDatabase::from_reader(Cursor::new("XYZ,a,b,c,d,L\n")).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let text = "4B1814,HB-JDC,A20N,\"AIRBUS A-320neo, sharklets\",L2J,M\n";
        let db = MemoryDatabase::from_reader(Cursor::new(text)).unwrap();
        let data = db.get(&IcaoAddress::new("4B1814").unwrap()).unwrap().unwrap();
        assert_eq!(data.model, "AIRBUS A-320neo, sharklets");
        assert_eq!(data.description, "L2J");
        assert_eq!(data.wake_turbulence_category, WakeTurbulenceCategory::Medium);
    }

    #[test]
    fn test_field_count_error_names_line() {
        let text = "4B1814,HB-JDC,A20N,A320,L2J,M\nA05F21,N1,B738,B737,L2J,M,extra\n";
        let Err(Error::Database(msg)) = MemoryDatabase::from_reader(Cursor::new(text)) else {
            panic!("expected a database error");
        };
        assert!(msg.starts_with("line 2:"), "{}", msg);
    }

    #[test]
    fn test_any_aircraft() {
        let data = AnyAircraft.get(&IcaoAddress::new("ABCDEF").unwrap()).unwrap();
        assert_eq!(data, Some(AircraftData::default()));
    }
}
