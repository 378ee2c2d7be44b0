//! Interactive menu loops for a logged-in session

use anyhow::Result;
use colored::Colorize;
use inquire::{InquireError, Select, Text};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use ranch_core::{export, ExportFormat, RanchError, Session, Storage};

use crate::display::{
    print_available_barns, print_barn_list, print_barn_summary, print_horse_details,
};
use crate::prompts::{self, optional};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainAction {
    AddHorse,
    ViewHorses,
    EditHorse,
    RemoveHorse,
    ManageBarns,
    AssignHorse,
    Exit,
}

impl MainAction {
    const ALL: [MainAction; 7] = [
        MainAction::AddHorse,
        MainAction::ViewHorses,
        MainAction::EditHorse,
        MainAction::RemoveHorse,
        MainAction::ManageBarns,
        MainAction::AssignHorse,
        MainAction::Exit,
    ];
}

impl fmt::Display for MainAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainAction::AddHorse => write!(f, "Add new horse"),
            MainAction::ViewHorses => write!(f, "View horses"),
            MainAction::EditHorse => write!(f, "Edit a horse"),
            MainAction::RemoveHorse => write!(f, "Remove a horse"),
            MainAction::ManageBarns => write!(f, "Manage barns"),
            MainAction::AssignHorse => write!(f, "Assign a horse to a stall"),
            MainAction::Exit => write!(f, "Exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewAction {
    PrintAll,
    ByName,
    ByStall,
    Back,
}

impl fmt::Display for ViewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewAction::PrintAll => write!(f, "Print all horses"),
            ViewAction::ByName => write!(f, "Search by name (partial matches allowed)"),
            ViewAction::ByStall => write!(f, "Search by barn and stall"),
            ViewAction::Back => write!(f, "Go back"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BarnAction {
    Add,
    View,
    Edit,
    EmptyStalls,
    Remove,
    Back,
}

impl fmt::Display for BarnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarnAction::Add => write!(f, "Add a barn"),
            BarnAction::View => write!(f, "View a barn"),
            BarnAction::Edit => write!(f, "Edit a barn"),
            BarnAction::EmptyStalls => write!(f, "Search for empty stalls"),
            BarnAction::Remove => write!(f, "Remove a barn"),
            BarnAction::Back => write!(f, "Go back"),
        }
    }
}

/// Reports named conditions and cancelled prompts without ending the session.
/// Anything else (storage failures, a closed terminal) is passed on.
fn report(result: Result<()>) -> Result<()> {
    let Err(err) = result else {
        return Ok(());
    };

    if let Some(condition) = err.downcast_ref::<RanchError>() {
        println!("{}", condition.to_string().yellow());
        return Ok(());
    }
    if matches!(
        err.downcast_ref::<InquireError>(),
        Some(InquireError::OperationCanceled)
    ) {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }
    Err(err)
}

fn save(storage: &Storage, session: &Session) -> Result<()> {
    storage.save_session(session)?;
    println!("{}", "Data saved successfully.".green());
    Ok(())
}

/// Runs the main menu until the user exits. Data is saved after every
/// change and once more on exit.
pub fn run(storage: &Storage, session: &mut Session) -> Result<()> {
    loop {
        println!("\n{}", "=== Horse & Barn Management System ===".bold());
        let action = optional(Select::new("Choose an action:", MainAction::ALL.to_vec()).prompt())?
            .unwrap_or(MainAction::Exit);

        let result = match action {
            MainAction::AddHorse => add_horse(storage, session),
            MainAction::ViewHorses => view_horses(session),
            MainAction::EditHorse => edit_horse(storage, session),
            MainAction::RemoveHorse => remove_horse(storage, session),
            MainAction::ManageBarns => manage_barns(storage, session),
            MainAction::AssignHorse => assign_horse(storage, session),
            MainAction::Exit => {
                save(storage, session)?;
                println!("\nExiting program. Goodbye!");
                return Ok(());
            }
        };
        report(result)?;
    }
}

// =========================================================================
// Horses
// =========================================================================

fn add_horse(storage: &Storage, session: &mut Session) -> Result<()> {
    println!("\n{}", "=== Add a New Horse ===".bold());
    if session.barns().is_empty() {
        return Err(RanchError::NoBarns.into());
    }

    let horse = prompts::prompt_new_horse(session.owner())?;
    let name = horse.name.clone();
    let id = session.add_horse(horse)?;

    // The horse is kept even if no stall can be found for it
    report(place_horse(session, &id))?;

    save(storage, session)?;
    println!("{}", format!("Horse '{}' added successfully.", name).green());
    Ok(())
}

fn view_horses(session: &Session) -> Result<()> {
    let options = vec![
        ViewAction::PrintAll,
        ViewAction::ByName,
        ViewAction::ByStall,
        ViewAction::Back,
    ];

    loop {
        let Some(action) = optional(Select::new("View horses:", options.clone()).prompt())? else {
            return Ok(());
        };

        match action {
            ViewAction::PrintAll => print_all_horses(session)?,
            ViewAction::ByName => {
                let query = Text::new("Horse name:").prompt()?;
                let matches = session.horses().search(&query);
                if matches.is_empty() {
                    println!("{}", "No horses found with that name.".yellow());
                }
                for horse in matches {
                    print_horse_details(horse);
                }
            }
            ViewAction::ByStall => {
                let barn = Text::new("Barn name:").prompt()?;
                let stall = prompts::prompt_stall_number()?;
                let matches = session.horses().at_stall(&barn, stall);
                if matches.is_empty() {
                    println!("{}", "No horse found in that barn/stall.".yellow());
                }
                for horse in matches {
                    print_horse_details(horse);
                }
            }
            ViewAction::Back => return Ok(()),
        }
    }
}

fn print_all_horses(session: &Session) -> Result<()> {
    if session.horses().is_empty() {
        println!("{}", "No horses registered yet.".yellow());
        return Ok(());
    }
    for horse in session.horses().iter() {
        print_horse_details(horse);
    }

    if prompts::confirm("Export all horses to a document?")? {
        let format = ExportFormat::Markdown;
        let path = Path::new(format.default_file_name());
        let today = chrono::Local::now().date_naive();
        let count = export::export_horses(session.horses().iter(), format, path, today)?;
        println!(
            "{}",
            format!("Exported {} horses to '{}'.", count, path.display()).green()
        );
    } else {
        println!("Export skipped.");
    }
    Ok(())
}

fn edit_horse(storage: &Storage, session: &mut Session) -> Result<()> {
    if session.horses().is_empty() {
        println!("{}", "No horses available to edit.".yellow());
        return Ok(());
    }
    let Some(id) = prompts::prompt_select_horse(session, "Select a horse to edit:")? else {
        return Ok(());
    };
    let horse = session
        .horses()
        .get(&id)
        .ok_or_else(|| RanchError::HorseNotFound(id.to_string()))?;

    let update = prompts::prompt_horse_update(horse)?;
    let changed = session.update_horse(&id, update)?;
    log::debug!("edited fields: {:?}", changed);

    if prompts::confirm("Reassign this horse to a different barn?")? {
        report(place_horse(session, &id))?;
    }

    save(storage, session)?;
    if let Some(horse) = session.horses().get(&id) {
        println!("{}", format!("Horse '{}' updated successfully.", horse.name).green());
    }
    Ok(())
}

fn remove_horse(storage: &Storage, session: &mut Session) -> Result<()> {
    if session.horses().is_empty() {
        println!("{}", "No horses registered yet.".yellow());
        return Ok(());
    }

    let name = Text::new("Name of the horse to remove:").prompt()?;
    let (id, display_name) = session
        .horses()
        .find(&name)
        .map(|h| (h.id, h.name.clone()))
        .ok_or_else(|| RanchError::HorseNotFound(name.trim().to_string()))?;

    if !prompts::confirm(&format!("Are you sure you want to remove '{}'?", display_name))? {
        println!("{}", "Removal cancelled.".yellow());
        return Ok(());
    }

    session.remove_horse(&id)?;
    save(storage, session)?;
    println!(
        "{}",
        format!("Horse '{}' has been removed successfully.", display_name).green()
    );
    Ok(())
}

fn assign_horse(storage: &Storage, session: &mut Session) -> Result<()> {
    if session.horses().is_empty() {
        println!("{}", "No horses available to assign.".yellow());
        return Ok(());
    }
    let Some(id) = prompts::prompt_select_horse(session, "Select a horse to assign/reassign:")?
    else {
        return Ok(());
    };

    place_horse(session, &id)?;
    save(storage, session)
}

/// Shows barns with room and keeps asking until the horse is placed.
/// An unknown or full barn re-prompts; every other condition is returned.
fn place_horse(session: &mut Session, id: &Uuid) -> Result<()> {
    if session.barns().is_empty() {
        return Err(RanchError::NoBarns.into());
    }
    let available = session.available_barns_for(id);
    if available.is_empty() {
        return Err(RanchError::AllBarnsFull.into());
    }
    print_available_barns(&available);

    loop {
        let Some(choice) =
            prompts::prompt_barn_choice("Enter barn name or number to assign the horse:")?
        else {
            println!("{}", "Horse left unassigned.".yellow());
            return Ok(());
        };

        match session.assign_horse(id, &choice) {
            Ok(placement) => {
                let name = session
                    .horses()
                    .get(id)
                    .map(|h| h.name.clone())
                    .unwrap_or_default();
                println!(
                    "{}",
                    format!(
                        "Horse '{}' assigned to Barn '{}', Stall {}.",
                        name, placement.barn, placement.stall
                    )
                    .green()
                );
                return Ok(());
            }
            Err(RanchError::BarnNotFound(_)) => {
                println!("{}", "Invalid barn choice. Please try again.".yellow());
            }
            Err(full @ RanchError::BarnFull { .. }) => {
                println!("{}", format!("{}. Please pick another barn.", full).yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// =========================================================================
// Barns
// =========================================================================

fn manage_barns(storage: &Storage, session: &mut Session) -> Result<()> {
    let options = vec![
        BarnAction::Add,
        BarnAction::View,
        BarnAction::Edit,
        BarnAction::EmptyStalls,
        BarnAction::Remove,
        BarnAction::Back,
    ];

    loop {
        println!("\n{}", "=== Barn Management ===".bold());
        let Some(action) = optional(Select::new("Choose an action:", options.clone()).prompt())?
        else {
            return Ok(());
        };

        let result = match action {
            BarnAction::Add => add_barn(storage, session),
            BarnAction::View => view_barn(session),
            BarnAction::Edit => edit_barn(storage, session),
            BarnAction::EmptyStalls => {
                search_empty_stalls(session);
                Ok(())
            }
            BarnAction::Remove => remove_barn(storage, session),
            BarnAction::Back => return Ok(()),
        };
        report(result)?;
    }
}

fn add_barn(storage: &Storage, session: &mut Session) -> Result<()> {
    let (name, stalls) = prompts::prompt_new_barn(session)?;
    session.add_barn(&name, stalls)?;
    save(storage, session)?;
    println!(
        "{}",
        format!("Barn '{}' added successfully with {} stalls.", name, stalls).green()
    );
    Ok(())
}

fn view_barn(session: &Session) -> Result<()> {
    if session.barns().is_empty() {
        println!("{}", "No barns available.".yellow());
        return Ok(());
    }
    print_barn_list(session.barns().all());

    let Some(choice) = prompts::prompt_barn_choice("Enter barn name or number to view:")? else {
        return Ok(());
    };
    let summary = session.barn_summary(&choice)?;
    print_barn_summary(&summary, true);
    Ok(())
}

fn edit_barn(storage: &Storage, session: &mut Session) -> Result<()> {
    if session.barns().is_empty() {
        println!("{}", "No barns available to edit.".yellow());
        return Ok(());
    }
    print_barn_list(session.barns().all());

    let Some(choice) = prompts::prompt_barn_choice("Enter barn name or number to edit:")? else {
        return Ok(());
    };
    // Resolve first so an unknown barn is reported before asking for the note
    let name = session.barns().resolve(&choice)?.name.clone();

    let note = Text::new("Note or description for this barn (leave blank to skip):").prompt()?;
    if session.set_barn_note(&choice, &note)? {
        save(storage, session)?;
        println!("{}", format!("Note updated for barn '{}'.", name).green());
    } else {
        println!("No changes made.");
    }
    Ok(())
}

fn search_empty_stalls(session: &Session) {
    if session.barns().is_empty() {
        println!("{}", "No barns have been added yet.".yellow());
        return;
    }

    let vacancies = session.vacancies();
    if vacancies.is_empty() {
        println!("{}", "No empty stalls found in any barn.".yellow());
    }
    for summary in &vacancies {
        print_barn_summary(summary, false);
    }
}

fn remove_barn(storage: &Storage, session: &mut Session) -> Result<()> {
    if session.barns().is_empty() {
        println!("{}", "No barns available to remove.".yellow());
        return Ok(());
    }

    let name = Text::new("Barn name to remove:").prompt()?;
    let display_name = session
        .barns()
        .find(&name)
        .map(|b| b.name.clone())
        .ok_or_else(|| RanchError::BarnNotFound(name.trim().to_string()))?;

    if !prompts::confirm(&format!("Are you sure you want to remove '{}'?", display_name))? {
        println!("{}", "Removal cancelled.".yellow());
        return Ok(());
    }

    let removed = session.remove_barn(&display_name)?;
    save(storage, session)?;
    println!(
        "{}",
        format!("Barn '{}' removed successfully.", removed.name).green()
    );
    Ok(())
}
