use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::{RanchError, RanchResult};

/// Date format used for birth dates, both on input and on disk
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents a single horse owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Horse {
    /// Unique identifier, used for barn occupant references
    pub id: Uuid,

    /// Display name (matched case-insensitively, not enforced unique)
    pub name: String,

    pub birth_date: NaiveDate,

    pub breed: String,

    pub breakfast_hay: String,
    pub lunch_hay: String,
    pub dinner_hay: String,

    /// Lowercase allergy names
    #[serde(default)]
    pub allergies: BTreeSet<String>,

    /// Name of the barn this horse lives in, set only by the stall allocator
    #[serde(default)]
    pub barn: Option<String>,

    /// Stall number within `barn`, set only by the stall allocator
    #[serde(default)]
    pub stall: Option<u32>,

    /// Username of the owning user
    pub owner: String,
}

impl Horse {
    /// Creates an unassigned horse with empty feeding plan and no allergies
    pub fn new(name: String, birth_date: NaiveDate, breed: String, owner: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            birth_date,
            breed,
            breakfast_hay: String::new(),
            lunch_hay: String::new(),
            dinner_hay: String::new(),
            allergies: BTreeSet::new(),
            barn: None,
            stall: None,
            owner,
        }
    }

    /// Sets the three daily hay types
    pub fn with_hay(mut self, breakfast: &str, lunch: &str, dinner: &str) -> Self {
        self.breakfast_hay = breakfast.to_string();
        self.lunch_hay = lunch.to_string();
        self.dinner_hay = dinner.to_string();
        self
    }

    pub fn with_allergies(mut self, allergies: BTreeSet<String>) -> Self {
        self.allergies = allergies;
        self
    }

    /// Returns true if the horse currently holds a stall
    pub fn is_assigned(&self) -> bool {
        self.barn.is_some() && self.stall.is_some()
    }

    /// Case-insensitive exact name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Human-readable placement, e.g. "North (Stall 2)" or "Unassigned"
    pub fn placement(&self) -> String {
        match (&self.barn, self.stall) {
            (Some(barn), Some(stall)) => format!("{} (Stall {})", barn, stall),
            _ => String::from("Unassigned"),
        }
    }

    /// Allergies joined for display, "None" when empty
    pub fn allergies_display(&self) -> String {
        if self.allergies.is_empty() {
            String::from("None")
        } else {
            self.allergies.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

impl fmt::Display for Horse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.placement())
    }
}

/// A horse holding a stall in a barn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occupant {
    pub horse_id: Uuid,
    pub stall: u32,
}

/// Represents a barn with a fixed number of stalls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Barn {
    pub id: Uuid,

    /// Barn name (unique case-insensitively per user)
    pub name: String,

    /// Total stall count, fixed at creation
    pub stalls: u32,

    /// Current occupants, in the order they were assigned
    #[serde(default)]
    pub horses: Vec<Occupant>,

    /// Free-text note or description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Username of the owning user
    pub owner: String,
}

impl Barn {
    /// Creates an empty barn
    pub fn new(name: String, stalls: u32, owner: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            stalls,
            horses: Vec::new(),
            note: None,
            owner,
        }
    }

    /// Number of occupied stalls
    pub fn occupied(&self) -> u32 {
        self.horses.len() as u32
    }

    /// Number of free stalls
    pub fn free_stalls(&self) -> u32 {
        self.stalls.saturating_sub(self.occupied())
    }

    pub fn has_space(&self) -> bool {
        self.free_stalls() > 0
    }

    /// Stall numbers currently held
    pub fn occupant_stalls(&self) -> BTreeSet<u32> {
        self.horses.iter().map(|o| o.stall).collect()
    }

    /// Returns true if the horse is in the occupant list
    pub fn contains(&self, horse_id: &Uuid) -> bool {
        self.horses.iter().any(|o| o.horse_id == *horse_id)
    }

    /// Case-insensitive exact name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Barn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Stalls: {})", self.name, self.stalls)
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    /// Hex-encoded SHA-256 of the password
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// Field edits for an existing horse; `None` keeps the current value.
///
/// Placement is absent: barn/stall only change through the
/// stall allocator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HorseUpdate {
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    pub breakfast_hay: Option<String>,
    pub lunch_hay: Option<String>,
    pub dinner_hay: Option<String>,
    pub allergies: Option<BTreeSet<String>>,
}

impl HorseUpdate {
    /// Applies the edits to `horse`, returning the names of changed fields
    pub fn apply(self, horse: &mut Horse) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(name) = non_blank(self.name) {
            if name != horse.name {
                horse.name = name;
                changed.push("name");
            }
        }
        if let Some(date) = self.birth_date {
            if date != horse.birth_date {
                horse.birth_date = date;
                changed.push("birth_date");
            }
        }
        if let Some(breed) = non_blank(self.breed) {
            if breed != horse.breed {
                horse.breed = breed;
                changed.push("breed");
            }
        }
        if let Some(hay) = non_blank(self.breakfast_hay) {
            if hay != horse.breakfast_hay {
                horse.breakfast_hay = hay;
                changed.push("breakfast_hay");
            }
        }
        if let Some(hay) = non_blank(self.lunch_hay) {
            if hay != horse.lunch_hay {
                horse.lunch_hay = hay;
                changed.push("lunch_hay");
            }
        }
        if let Some(hay) = non_blank(self.dinner_hay) {
            if hay != horse.dinner_hay {
                horse.dinner_hay = hay;
                changed.push("dinner_hay");
            }
        }
        if let Some(allergies) = self.allergies {
            if allergies != horse.allergies {
                horse.allergies = allergies;
                changed.push("allergies");
            }
        }

        changed
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a birth date in `YYYY-MM-DD` form
pub fn parse_birth_date(input: &str) -> RanchResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| RanchError::InvalidDate(input.trim().to_string()))
}

/// Parses a comma separated allergy list into trimmed lowercase names
pub fn parse_allergies(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_birth_date() {
        assert_eq!(parse_birth_date("2015-04-23").unwrap(), date(2015, 4, 23));
        assert_eq!(parse_birth_date(" 2015-04-23 ").unwrap(), date(2015, 4, 23));
        assert_eq!(
            parse_birth_date("23/04/2015"),
            Err(RanchError::InvalidDate("23/04/2015".into()))
        );
        assert!(parse_birth_date("2015-02-30").is_err());
    }

    #[test]
    fn test_parse_allergies() {
        let allergies = parse_allergies(" Dust, MOLD ,, clover ,");
        let expected: Vec<&str> = vec!["clover", "dust", "mold"];
        assert_eq!(allergies.iter().map(|s| s.as_str()).collect::<Vec<_>>(), expected);
        assert!(parse_allergies("  ,  ").is_empty());
    }

    #[test]
    fn test_barn_capacity() {
        let mut barn = Barn::new("North".into(), 3, "alice".into());
        assert_eq!(barn.free_stalls(), 3);
        assert!(barn.has_space());

        barn.horses.push(Occupant {
            horse_id: Uuid::new_v4(),
            stall: 1,
        });
        barn.horses.push(Occupant {
            horse_id: Uuid::new_v4(),
            stall: 3,
        });
        assert_eq!(barn.occupied(), 2);
        assert_eq!(barn.free_stalls(), 1);
        assert_eq!(barn.occupant_stalls().into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let barn = Barn::new("North Barn".into(), 1, "alice".into());
        assert!(barn.is_named("north barn"));
        assert!(barn.is_named("  NORTH BARN "));
        assert!(!barn.is_named("north"));

        let horse = Horse::new("Bolt".into(), date(2019, 1, 1), "Arabian".into(), "alice".into());
        assert!(horse.is_named("bolt"));
        assert!(!horse.is_named("bol"));
    }

    #[test]
    fn test_horse_placement_display() {
        let mut horse = Horse::new("Star".into(), date(2018, 6, 1), "Morgan".into(), "bob".into());
        assert_eq!(horse.placement(), "Unassigned");
        assert_eq!(horse.allergies_display(), "None");

        horse.barn = Some("North".into());
        horse.stall = Some(2);
        assert_eq!(horse.to_string(), "Star - North (Stall 2)");
    }

    #[test]
    fn test_horse_update_keeps_blank_fields() {
        let mut horse = Horse::new("Comet".into(), date(2017, 3, 9), "Mustang".into(), "bob".into())
            .with_hay("timothy", "alfalfa", "orchard");

        let changed = HorseUpdate {
            name: Some("  ".into()),
            breed: Some("Quarter Horse".into()),
            lunch_hay: Some(String::new()),
            allergies: Some(parse_allergies("Dust")),
            ..Default::default()
        }
        .apply(&mut horse);

        assert_eq!(changed, vec!["breed", "allergies"]);
        assert_eq!(horse.name, "Comet");
        assert_eq!(horse.breed, "Quarter Horse");
        assert_eq!(horse.lunch_hay, "alfalfa");
        assert!(horse.allergies.contains("dust"));
    }

    #[test]
    fn test_horse_yaml_shape() {
        let horse = Horse::new("Bolt".into(), date(2019, 5, 2), "Arabian".into(), "alice".into());
        let yaml = serde_yaml::to_string(&horse).unwrap();
        assert!(yaml.contains("2019-05-02"));
        assert!(yaml.contains("barn: null"));
        assert!(yaml.contains("owner: alice"));

        let back: Horse = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, horse);
    }
}
