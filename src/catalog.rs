//! The read-only list of rooms we know about. The catalog is a [ron] file
//! holding a list of [Destination]s:
//!
//! ```text
//! [
//!     (
//!         id: "sci-101",
//!         name: "Physics Lab",
//!         category: "laboratory",
//!         floor: 1,
//!         building: "Science",
//!         capacity: Some(30),
//!         coordinate: (latitude: -12.0460, longitude: -77.0428),
//!     ),
//! ]
//! ```
//!
//! Nothing here mutates the rooms once they're loaded.

use crate::destination::Destination;
use crate::geo::{distance_km, Coordinate, GeoError};

use log::{debug, info};
use std::{
    borrow::Cow,
    cmp::Ordering,
    collections::HashSet,
    fmt,
    fs::File,
    io::Read,
    path::Path,
    str::FromStr,
};

/// Every room in the catalog, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomCatalog {
    rooms: Vec<Destination>,
}

/// Errors while loading a [RoomCatalog].
#[derive(Debug)]
pub enum CatalogError {
    /// Returned when io fails when reading the file.
    IoError(std::io::Error),

    /// Returned when deserialization of the room list fails.
    RonSpannedError(ron::de::SpannedError),

    /// Two rooms share an id.
    DuplicateId(String),

    /// A room sits somewhere that isn't on the globe.
    InvalidCoordinate {
        /// Id of the offending room
        id: String,
        /// What was wrong with it
        error: GeoError,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CatalogError as CE;
        let msg = match self {
            CE::IoError(error) => Cow::from(format!("io error: {}", error)),
            CE::RonSpannedError(error) => Cow::from(format!("ron spanning error: {}", error)),
            CE::DuplicateId(id) => Cow::from(format!("room id {:?} appears twice", id)),
            CE::InvalidCoordinate { id, error } => Cow::from(format!("room {:?}: {}", id, error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for CatalogError {}

impl FromStr for RoomCatalog {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rooms =
            ron::de::from_str::<Vec<Destination>>(s).map_err(CatalogError::RonSpannedError)?;
        Self::new(rooms)
    }
}

impl RoomCatalog {
    /// Builds a catalog from rooms already in memory, checking ids and
    /// coordinates the same way a file load does.
    pub fn new(rooms: Vec<Destination>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for room in &rooms {
            if !seen.insert(room.id.as_str()) {
                return Err(CatalogError::DuplicateId(room.id.clone()));
            }
            room.coordinate
                .validate()
                .map_err(|error| CatalogError::InvalidCoordinate {
                    id: room.id.clone(),
                    error,
                })?;
        }
        Ok(RoomCatalog { rooms })
    }

    /// Read a [RoomCatalog] from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let mut handle = File::open(path).map_err(CatalogError::IoError)?;
        let catalog = Self::from_reader(&mut handle)?;
        info!("Loaded {} rooms from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Read a [RoomCatalog] from the [Read]able object provided.
    pub fn from_reader(reader: &mut impl Read) -> Result<Self, CatalogError> {
        let mut raw_text = Vec::new();
        reader
            .read_to_end(&mut raw_text)
            .map_err(CatalogError::IoError)?;

        let rooms = ron::de::from_bytes::<Vec<Destination>>(&raw_text)
            .map_err(CatalogError::RonSpannedError)?;
        Self::new(rooms)
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// True if there are no rooms at all.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// All rooms, in file order.
    pub fn rooms(&self) -> &[Destination] {
        &self.rooms
    }

    /// Looks a room up by id.
    pub fn get(&self, id: &str) -> Option<&Destination> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Case-insensitive substring search over the name, building, and
    /// description. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Destination> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rooms.iter().collect();
        }

        self.rooms
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.building.to_lowercase().contains(&needle)
                    || r
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Rooms whose category matches, ignoring case.
    pub fn by_category(&self, category: &str) -> Vec<&Destination> {
        self.rooms
            .iter()
            .filter(|r| r.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Rooms on the given floor.
    pub fn by_floor(&self, floor: i32) -> Vec<&Destination> {
        self.rooms.iter().filter(|r| r.floor == floor).collect()
    }

    /// The list view's filter: a text search, then narrowed to one category
    /// if one is given.
    pub fn filter(&self, query: &str, category: Option<&str>) -> Vec<&Destination> {
        let found = self.search(query);
        match category {
            Some(category) if !category.trim().is_empty() => found
                .into_iter()
                .filter(|r| r.category.eq_ignore_ascii_case(category.trim()))
                .collect(),
            _ => found,
        }
    }

    /// Rooms within `radius_km` of `origin`, closest first, paired with their
    /// distance in kilometers.
    pub fn nearby(
        &self,
        origin: &Coordinate,
        radius_km: f64,
    ) -> Result<Vec<(&Destination, f64)>, GeoError> {
        origin.validate()?;

        let mut found = self
            .rooms
            .iter()
            .map(|r| distance_km(origin, &r.coordinate).map(|d| (r, d)))
            .collect::<Result<Vec<_>, GeoError>>()?;
        found.retain(|(_, d)| *d <= radius_km);
        found.sort_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        debug!(
            "{} of {} rooms within {} km of {}",
            found.len(),
            self.rooms.len(),
            radius_km,
            origin
        );
        Ok(found)
    }
}
