//! In-memory record collections for a single user's horses and barns

use uuid::Uuid;

use crate::error::{RanchError, RanchResult};
use crate::models::{Barn, Horse};

/// Collection of one user's horses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HorseStore {
    horses: Vec<Horse>,
}

impl HorseStore {
    pub fn new(horses: Vec<Horse>) -> Self {
        Self { horses }
    }

    /// All horses in insertion order
    pub fn all(&self) -> &[Horse] {
        &self.horses
    }

    pub(crate) fn all_mut(&mut self) -> &mut [Horse] {
        &mut self.horses
    }

    /// Read-only iteration, used by export
    pub fn iter(&self) -> std::slice::Iter<'_, Horse> {
        self.horses.iter()
    }

    pub fn len(&self) -> usize {
        self.horses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horses.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Horse> {
        self.horses.iter().find(|h| h.id == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &Uuid) -> Option<&mut Horse> {
        self.horses.iter_mut().find(|h| h.id == *id)
    }

    /// First horse whose name matches exactly, ignoring case
    pub fn find(&self, name: &str) -> Option<&Horse> {
        self.horses.iter().find(|h| h.is_named(name))
    }

    /// Horses whose name contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&Horse> {
        let query = query.trim().to_lowercase();
        self.horses
            .iter()
            .filter(|h| h.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Horses recorded at the given barn (case-insensitive) and stall
    pub fn at_stall(&self, barn: &str, stall: u32) -> Vec<&Horse> {
        let barn = barn.trim().to_lowercase();
        self.horses
            .iter()
            .filter(|h| {
                h.barn.as_ref().is_some_and(|b| b.to_lowercase() == barn) && h.stall == Some(stall)
            })
            .collect()
    }

    /// Adds a horse. Placement is left to the stall allocator.
    pub(crate) fn add(&mut self, horse: Horse) -> Uuid {
        let id = horse.id;
        self.horses.push(horse);
        id
    }

    /// Removes a horse by id, returning it
    pub(crate) fn remove(&mut self, id: &Uuid) -> RanchResult<Horse> {
        let pos = self
            .horses
            .iter()
            .position(|h| h.id == *id)
            .ok_or_else(|| RanchError::HorseNotFound(id.to_string()))?;
        Ok(self.horses.remove(pos))
    }
}

/// Collection of one user's barns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarnStore {
    barns: Vec<Barn>,
}

impl BarnStore {
    pub fn new(barns: Vec<Barn>) -> Self {
        Self { barns }
    }

    pub fn all(&self) -> &[Barn] {
        &self.barns
    }

    pub(crate) fn all_mut(&mut self) -> &mut [Barn] {
        &mut self.barns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Barn> {
        self.barns.iter()
    }

    pub fn len(&self) -> usize {
        self.barns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barns.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Barn> {
        self.barns.iter().find(|b| b.id == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &Uuid) -> Option<&mut Barn> {
        self.barns.iter_mut().find(|b| b.id == *id)
    }

    /// Barn with the given name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Barn> {
        self.barns.iter().find(|b| b.is_named(name))
    }

    /// Barns whose name contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&Barn> {
        let query = query.trim().to_lowercase();
        self.barns
            .iter()
            .filter(|b| b.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Resolves a 1-based position in the barn listing, or a barn name
    pub fn resolve(&self, choice: &str) -> RanchResult<&Barn> {
        let choice = choice.trim();
        let found = if !choice.is_empty() && choice.chars().all(|c| c.is_ascii_digit()) {
            choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.barns.get(i))
        } else {
            self.find(choice)
        };
        found.ok_or_else(|| RanchError::BarnNotFound(choice.to_string()))
    }

    /// Adds a new empty barn after validating name and stall count
    pub(crate) fn add(&mut self, barn: Barn) -> RanchResult<Uuid> {
        if barn.stalls == 0 {
            return Err(RanchError::InvalidStallCount);
        }
        if self.find(&barn.name).is_some() {
            return Err(RanchError::DuplicateBarn(barn.name));
        }
        let id = barn.id;
        self.barns.push(barn);
        Ok(id)
    }

    pub(crate) fn position(&self, id: &Uuid) -> Option<usize> {
        self.barns.iter().position(|b| b.id == *id)
    }

    pub(crate) fn get_mut_at(&mut self, index: usize) -> Option<&mut Barn> {
        self.barns.get_mut(index)
    }

    /// Removes a barn by id, returning it
    pub(crate) fn remove(&mut self, id: &Uuid) -> RanchResult<Barn> {
        let pos = self
            .position(id)
            .ok_or_else(|| RanchError::BarnNotFound(id.to_string()))?;
        Ok(self.barns.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn horse(name: &str) -> Horse {
        Horse::new(
            name.into(),
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            "Appaloosa".into(),
            "alice".into(),
        )
    }

    #[test]
    fn test_horse_find_and_search() {
        let store = HorseStore::new(vec![horse("Thunder"), horse("Thunderbolt"), horse("Daisy")]);

        assert_eq!(store.find("THUNDER").unwrap().name, "Thunder");
        assert!(store.find("thund").is_none());

        let names: Vec<_> = store.search("thund").iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Thunder", "Thunderbolt"]);
        assert!(store.search("zebra").is_empty());
    }

    #[test]
    fn test_horse_at_stall() {
        let mut placed = horse("Placed");
        placed.barn = Some("North".into());
        placed.stall = Some(2);
        let store = HorseStore::new(vec![placed, horse("Loose")]);

        assert_eq!(store.at_stall("north", 2).len(), 1);
        assert!(store.at_stall("north", 1).is_empty());
        assert!(store.at_stall("south", 2).is_empty());
    }

    #[test]
    fn test_horse_remove() {
        let mut store = HorseStore::default();
        let id = store.add(horse("Gone"));
        assert_eq!(store.remove(&id).unwrap().name, "Gone");
        assert!(store.is_empty());
        assert!(matches!(store.remove(&id), Err(RanchError::HorseNotFound(_))));
    }

    #[test]
    fn test_barn_add_rejects_duplicates_and_zero_stalls() {
        let mut store = BarnStore::default();
        store.add(Barn::new("North".into(), 2, "alice".into())).unwrap();

        assert_eq!(
            store.add(Barn::new("north".into(), 5, "alice".into())),
            Err(RanchError::DuplicateBarn("north".into()))
        );
        assert_eq!(
            store.add(Barn::new("South".into(), 0, "alice".into())),
            Err(RanchError::InvalidStallCount)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_barn_resolve() {
        let store = BarnStore::new(vec![
            Barn::new("North".into(), 2, "alice".into()),
            Barn::new("South".into(), 4, "alice".into()),
        ]);

        assert_eq!(store.resolve("2").unwrap().name, "South");
        assert_eq!(store.resolve("NORTH").unwrap().name, "North");
        assert_eq!(store.resolve("3"), Err(RanchError::BarnNotFound("3".into())));
        assert_eq!(store.resolve("East"), Err(RanchError::BarnNotFound("East".into())));
        assert_eq!(store.search("th").len(), 2);

        let south = store.resolve("south").unwrap().id;
        assert_eq!(store.get(&south).unwrap().stalls, 4);
    }
}
