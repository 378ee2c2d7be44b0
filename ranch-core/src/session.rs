//! Session context for the logged-in user
//!
//! A [`Session`] owns the user's horses and barns for the lifetime of one
//! login. Every operation that touches the horse/barn link is routed through
//! the [`allocator`](crate::allocator), so CRUD code never edits one side of
//! the link on its own.

use uuid::Uuid;

use crate::allocator::{self, AvailableBarn, Placement};
use crate::error::{RanchError, RanchResult};
use crate::models::{Barn, Horse, HorseUpdate};
use crate::store::{BarnStore, HorseStore};

/// Capacity figures for one barn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarnSummary {
    pub name: String,
    pub total: u32,
    pub occupied: u32,
    pub available: u32,
    pub note: Option<String>,
    /// Occupant names ordered by stall
    pub occupants: Vec<(u32, String)>,
}

/// The logged-in user's working set of horses and barns
#[derive(Debug, Clone)]
pub struct Session {
    owner: String,
    pub(crate) horses: HorseStore,
    pub(crate) barns: BarnStore,
}

impl Session {
    /// Creates a session from already owner-filtered records
    pub fn new(owner: impl Into<String>, horses: Vec<Horse>, barns: Vec<Barn>) -> Self {
        let session = Self {
            owner: owner.into(),
            horses: HorseStore::new(horses),
            barns: BarnStore::new(barns),
        };
        for problem in session.check_consistency() {
            log::warn!("inconsistent stall data for '{}': {}", session.owner, problem);
        }
        session
    }

    /// Username this session belongs to
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn horses(&self) -> &HorseStore {
        &self.horses
    }

    pub fn barns(&self) -> &BarnStore {
        &self.barns
    }

    // =========================================================================
    // Horses
    // =========================================================================

    /// Adds a new horse, unassigned. At least one barn must exist, matching
    /// the new-horse flow which always offers a stall right away.
    pub fn add_horse(&mut self, mut horse: Horse) -> RanchResult<Uuid> {
        if self.barns.is_empty() {
            return Err(RanchError::NoBarns);
        }
        horse.owner = self.owner.clone();
        horse.barn = None;
        horse.stall = None;
        log::info!("adding horse '{}' for '{}'", horse.name, self.owner);
        Ok(self.horses.add(horse))
    }

    /// Applies field edits to a horse. Placement is unaffected.
    pub fn update_horse(&mut self, id: &Uuid, update: HorseUpdate) -> RanchResult<Vec<&'static str>> {
        let horse = self
            .horses
            .get_mut(id)
            .ok_or_else(|| RanchError::HorseNotFound(id.to_string()))?;
        Ok(update.apply(horse))
    }

    /// Detaches the horse from any barn, then removes it
    pub fn remove_horse(&mut self, id: &Uuid) -> RanchResult<Horse> {
        let horse = self
            .horses
            .get_mut(id)
            .ok_or_else(|| RanchError::HorseNotFound(id.to_string()))?;
        allocator::detach(horse, self.barns.all_mut());
        let removed = self.horses.remove(id)?;
        log::info!("removed horse '{}'", removed.name);
        Ok(removed)
    }

    // =========================================================================
    // Barns
    // =========================================================================

    /// Adds an empty barn
    pub fn add_barn(&mut self, name: &str, stalls: u32) -> RanchResult<Uuid> {
        let barn = Barn::new(name.trim().to_string(), stalls, self.owner.clone());
        let id = self.barns.add(barn)?;
        log::info!("added barn '{}' with {} stalls", name.trim(), stalls);
        Ok(id)
    }

    /// Sets the free-text note of the barn picked by position or name.
    /// A blank note leaves the barn unchanged and returns false.
    pub fn set_barn_note(&mut self, choice: &str, note: &str) -> RanchResult<bool> {
        let id = self.barns.resolve(choice)?.id;
        let note = note.trim();
        if note.is_empty() {
            return Ok(false);
        }
        let barn = self
            .barns
            .get_mut(&id)
            .ok_or_else(|| RanchError::BarnNotFound(choice.to_string()))?;
        barn.note = Some(note.to_string());
        log::debug!("updated note for barn '{}'", barn.name);
        Ok(true)
    }

    /// Releases every occupant of the named barn, then removes the barn.
    /// The horses stay in the horse collection, unassigned.
    pub fn remove_barn(&mut self, name: &str) -> RanchResult<Barn> {
        let id = self
            .barns
            .find(name)
            .map(|b| b.id)
            .ok_or_else(|| RanchError::BarnNotFound(name.trim().to_string()))?;

        let horses = self.horses.all_mut();
        if let Some(barn) = self.barns.get_mut(&id) {
            let released = allocator::detach_all(barn, horses);
            log::info!("releasing {} horses from barn '{}'", released, barn.name);
        }
        let removed = self.barns.remove(&id)?;

        // Horses whose record still names the removed barn but no barn lists
        allocator::release_unlisted(self.horses.all_mut(), self.barns.all());
        Ok(removed)
    }

    /// Capacity and occupants of the barn picked by position or name
    pub fn barn_summary(&self, choice: &str) -> RanchResult<BarnSummary> {
        let barn = self.barns.resolve(choice)?;
        Ok(self.summarize(barn))
    }

    /// Summaries of every barn that still has empty stalls
    pub fn vacancies(&self) -> Vec<BarnSummary> {
        self.barns
            .iter()
            .filter(|b| b.has_space())
            .map(|b| self.summarize(b))
            .collect()
    }

    fn summarize(&self, barn: &Barn) -> BarnSummary {
        let mut occupants: Vec<(u32, String)> = barn
            .horses
            .iter()
            .map(|o| {
                let name = self
                    .horses
                    .get(&o.horse_id)
                    .map(|h| h.name.clone())
                    .unwrap_or_else(|| o.horse_id.to_string());
                (o.stall, name)
            })
            .collect();
        occupants.sort();

        BarnSummary {
            name: barn.name.clone(),
            total: barn.stalls,
            occupied: barn.occupied(),
            available: barn.free_stalls(),
            note: barn.note.clone(),
            occupants,
        }
    }

    // =========================================================================
    // Stall assignment
    // =========================================================================

    /// Barns with free stalls
    pub fn available_barns(&self) -> Vec<AvailableBarn> {
        allocator::available_barns(self.barns.all())
    }

    /// Barns the given horse could move into, counting its own stall as free
    pub fn available_barns_for(&self, horse_id: &Uuid) -> Vec<AvailableBarn> {
        allocator::available_barns_for(self.barns.all(), horse_id)
    }

    /// Assigns (or reassigns) a horse to the lowest free stall of the barn
    /// picked from [`Session::available_barns_for`] by position or name.
    ///
    /// Every precondition is checked before the horse is detached from its
    /// current stall, so a rejected call changes nothing.
    pub fn assign_horse(&mut self, horse_id: &Uuid, choice: &str) -> RanchResult<Placement> {
        if self.horses.get(horse_id).is_none() {
            return Err(RanchError::HorseNotFound(horse_id.to_string()));
        }
        if self.barns.is_empty() {
            return Err(RanchError::NoBarns);
        }
        let available = self.available_barns_for(horse_id);
        if available.is_empty() {
            return Err(RanchError::AllBarnsFull);
        }
        let target = match allocator::select_barn(&available, choice) {
            Ok(barn) => barn.index,
            // A named barn that exists but has no room is a capacity error
            Err(RanchError::BarnNotFound(missing)) => {
                return Err(match self.barns.find(choice) {
                    Some(barn) => RanchError::BarnFull {
                        barn: barn.name.clone(),
                    },
                    None => RanchError::BarnNotFound(missing),
                });
            }
            Err(e) => return Err(e),
        };

        let horse = self
            .horses
            .get_mut(horse_id)
            .ok_or_else(|| RanchError::HorseNotFound(horse_id.to_string()))?;
        allocator::detach(horse, self.barns.all_mut());
        let barn = self
            .barns
            .get_mut_at(target)
            .ok_or_else(|| RanchError::BarnNotFound(choice.to_string()))?;
        let placement = allocator::assign(horse, barn)?;

        log::info!(
            "'{}' assigned to barn '{}' stall {}",
            horse.name,
            placement.barn,
            placement.stall
        );
        Ok(placement)
    }

    /// Takes a horse out of its stall without removing it
    pub fn unassign_horse(&mut self, horse_id: &Uuid) -> RanchResult<bool> {
        let horse = self
            .horses
            .get_mut(horse_id)
            .ok_or_else(|| RanchError::HorseNotFound(horse_id.to_string()))?;
        Ok(allocator::detach(horse, self.barns.all_mut()))
    }

    /// Describes every violation of the horse/barn link invariant
    pub fn check_consistency(&self) -> Vec<String> {
        allocator::check_consistency(self.horses.all(), self.barns.all())
    }
}
