//! A room someone might want to walk to.

use crate::geo::Coordinate;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category that gets a door hint on arrival.
pub const RESTROOM: &str = "restroom";

/// Category that gets a dining hall welcome on arrival.
pub const DINING: &str = "dining";

/// A room in the campus catalog, along with where it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Catalog-unique identifier
    pub id: String,
    /// Display name, e.g. "Physics Lab"
    pub name: String,
    /// Lowercase kind of room, e.g. "classroom", "restroom", "dining"
    pub category: String,
    /// Floor number, negative for basements
    pub floor: i32,
    /// Name of the building the room is in
    pub building: String,
    /// Seats, if anyone counted
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Free text shown under the name
    #[serde(default)]
    pub description: Option<String>,
    /// Phone or email for whoever runs the room
    #[serde(default)]
    pub contact: Option<String>,
    /// Where the room's entrance is
    pub coordinate: Coordinate,
}

impl Destination {
    /// The sentence read after "You have arrived at ...". Restrooms and
    /// dining halls get their own line, everything else is welcomed by
    /// category.
    pub fn arrival_note(&self) -> String {
        match self.category.to_lowercase().as_str() {
            RESTROOM => "The door is on your right.".to_owned(),
            DINING => "Welcome to the dining hall.".to_owned(),
            _ => format!("Welcome to the {}.", self.category),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} • {} • floor {})",
            self.name,
            self.category.to_uppercase(),
            self.building,
            self.floor
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn room(id: &str, category: &str, latitude: f64, longitude: f64) -> Destination {
        Destination {
            id: id.to_owned(),
            name: format!("Room {}", id),
            category: category.to_owned(),
            floor: 1,
            building: "Main".to_owned(),
            capacity: None,
            description: None,
            contact: None,
            coordinate: Coordinate::new(latitude, longitude).unwrap(),
        }
    }

    #[test]
    fn arrival_notes() {
        assert_eq!(
            room("a", "restroom", 0.0, 0.0).arrival_note(),
            "The door is on your right."
        );
        assert_eq!(
            room("b", "Dining", 0.0, 0.0).arrival_note(),
            "Welcome to the dining hall."
        );
        assert_eq!(
            room("c", "laboratory", 0.0, 0.0).arrival_note(),
            "Welcome to the laboratory."
        );
    }

    #[test]
    fn display() {
        assert_eq!(
            room("101", "classroom", 0.0, 0.0).to_string(),
            "Room 101 (CLASSROOM • Main • floor 1)"
        );
    }
}
