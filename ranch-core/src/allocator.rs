//! Stall allocator
//!
//! Computes free capacity per barn and places horses into the lowest free
//! stall. A horse's `barn`/`stall` fields and the barn's occupant list are a
//! denormalized pair; every change to either side goes through this module
//! so the two never diverge.

use uuid::Uuid;

use crate::error::{RanchError, RanchResult};
use crate::models::{Barn, Horse, Occupant};

/// A barn with at least one free stall, as presented for selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableBarn {
    /// Position of the barn in the full barn collection
    pub index: usize,
    pub name: String,
    pub free: u32,
}

/// Where a horse ended up after assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub barn: String,
    pub stall: u32,
}

/// Barns that still have room, in collection order
pub fn available_barns(barns: &[Barn]) -> Vec<AvailableBarn> {
    collect_available(barns, None)
}

/// Like [`available_barns`], but the stall currently held by `horse_id` is
/// counted as free. Used when reassigning, since the horse is detached before
/// it is placed again.
pub fn available_barns_for(barns: &[Barn], horse_id: &Uuid) -> Vec<AvailableBarn> {
    collect_available(barns, Some(horse_id))
}

fn collect_available(barns: &[Barn], moving: Option<&Uuid>) -> Vec<AvailableBarn> {
    barns
        .iter()
        .enumerate()
        .filter_map(|(index, barn)| {
            let held = barn
                .horses
                .iter()
                .filter(|o| Some(&o.horse_id) != moving)
                .count() as u32;
            let free = barn.stalls.saturating_sub(held);
            (free > 0).then(|| AvailableBarn {
                index,
                name: barn.name.clone(),
                free,
            })
        })
        .collect()
}

/// Resolves a user's choice against the displayed list of available barns.
///
/// `choice` is either the 1-based position shown to the user or a barn name
/// (case-insensitive exact match).
pub fn select_barn<'a>(available: &'a [AvailableBarn], choice: &str) -> RanchResult<&'a AvailableBarn> {
    let choice = choice.trim();

    if !choice.is_empty() && choice.chars().all(|c| c.is_ascii_digit()) {
        return choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| available.get(i))
            .ok_or_else(|| RanchError::BarnNotFound(choice.to_string()));
    }

    let lowered = choice.to_lowercase();
    available
        .iter()
        .find(|b| b.name.to_lowercase() == lowered)
        .ok_or_else(|| RanchError::BarnNotFound(choice.to_string()))
}

/// Lowest stall number in `1..=stalls` not held by any occupant
pub fn first_free_stall(barn: &Barn) -> Option<u32> {
    let held = barn.occupant_stalls();
    (1..=barn.stalls).find(|stall| !held.contains(stall))
}

/// Places `horse` into the lowest free stall of `barn`.
///
/// The horse must already be detached from any barn. A full barn is rejected
/// before anything is touched.
pub fn assign(horse: &mut Horse, barn: &mut Barn) -> RanchResult<Placement> {
    let full = || RanchError::BarnFull {
        barn: barn.name.clone(),
    };
    if !barn.has_space() {
        return Err(full());
    }
    let stall = first_free_stall(barn).ok_or_else(full)?;

    horse.barn = Some(barn.name.clone());
    horse.stall = Some(stall);
    barn.horses.push(Occupant {
        horse_id: horse.id,
        stall,
    });

    log::debug!("assigned '{}' to barn '{}' stall {}", horse.name, barn.name, stall);

    Ok(Placement {
        barn: barn.name.clone(),
        stall,
    })
}

/// Removes the horse from every barn that lists it and clears its placement.
///
/// All barns are scanned rather than trusting `horse.barn`, so stale records
/// are cleaned up too. Returns true if any occupant list changed.
pub fn detach(horse: &mut Horse, barns: &mut [Barn]) -> bool {
    let mut removed = false;
    for barn in barns.iter_mut() {
        let before = barn.horses.len();
        barn.horses.retain(|o| o.horse_id != horse.id);
        if barn.horses.len() != before {
            log::debug!("detached '{}' from barn '{}'", horse.name, barn.name);
            removed = true;
        }
    }
    horse.barn = None;
    horse.stall = None;
    removed
}

/// Clears the placement of every occupant of `barn` and empties its list.
///
/// The horses stay in the horse collection. Returns the number of horses
/// released.
pub fn detach_all(barn: &mut Barn, horses: &mut [Horse]) -> usize {
    let released = barn.horses.len();
    for occupant in barn.horses.drain(..) {
        if let Some(horse) = horses.iter_mut().find(|h| h.id == occupant.horse_id) {
            horse.barn = None;
            horse.stall = None;
        }
    }
    released
}

/// Clears the placement of horses that claim a stall no barn lists them in.
///
/// Horses listed in some barn are left alone even when their own record names
/// a different barn. Returns the number of horses cleared.
pub fn release_unlisted(horses: &mut [Horse], barns: &[Barn]) -> usize {
    let mut cleared = 0;
    for horse in horses.iter_mut() {
        if horse.barn.is_none() && horse.stall.is_none() {
            continue;
        }
        if barns.iter().any(|b| b.contains(&horse.id)) {
            continue;
        }
        log::debug!("clearing stale placement {} of '{}'", horse.placement(), horse.name);
        horse.barn = None;
        horse.stall = None;
        cleared += 1;
    }
    cleared
}

/// Checks the horse/barn link invariant, returning a description of each
/// violation found
pub fn check_consistency(horses: &[Horse], barns: &[Barn]) -> Vec<String> {
    let mut problems = Vec::new();

    for barn in barns {
        if barn.occupied() > barn.stalls {
            problems.push(format!(
                "barn '{}' holds {} horses in {} stalls",
                barn.name,
                barn.occupied(),
                barn.stalls
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for occupant in &barn.horses {
            if occupant.stall == 0 || occupant.stall > barn.stalls {
                problems.push(format!(
                    "barn '{}' has stall {} out of range",
                    barn.name, occupant.stall
                ));
            }
            if !seen.insert(occupant.stall) {
                problems.push(format!(
                    "barn '{}' has stall {} assigned twice",
                    barn.name, occupant.stall
                ));
            }
            match horses.iter().find(|h| h.id == occupant.horse_id) {
                Some(horse) => {
                    if horse.barn.as_deref() != Some(barn.name.as_str())
                        || horse.stall != Some(occupant.stall)
                    {
                        problems.push(format!(
                            "horse '{}' is listed in barn '{}' stall {} but records {}",
                            horse.name,
                            barn.name,
                            occupant.stall,
                            horse.placement()
                        ));
                    }
                }
                None => problems.push(format!(
                    "barn '{}' lists unknown horse {}",
                    barn.name, occupant.horse_id
                )),
            }
        }
    }

    for horse in horses.iter().filter(|h| h.barn.is_some() || h.stall.is_some()) {
        let listed = barns.iter().any(|b| b.contains(&horse.id));
        if !listed {
            problems.push(format!(
                "horse '{}' records {} but no barn lists it",
                horse.name,
                horse.placement()
            ));
        }
    }

    problems
}
