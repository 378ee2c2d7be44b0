use colored::Colorize;

use ranch_core::{AvailableBarn, Barn, BarnSummary, Horse};

/// Prints all details of a horse
pub fn print_horse_details(horse: &Horse) {
    println!();
    println!("{}: {}", "Name".blue(), horse.name);
    println!("{}: {}", "Breed".blue(), horse.breed);
    match (&horse.barn, horse.stall) {
        (Some(barn), Some(stall)) => {
            println!("{}: {}, {}: {}", "Barn".blue(), barn, "Stall".blue(), stall)
        }
        _ => println!("{}: {}", "Barn".blue(), "Unassigned".yellow()),
    }
    println!("{}: {}", "Birthdate".blue(), horse.birth_date);
    println!("{}: {}", "Breakfast hay".blue(), horse.breakfast_hay);
    println!("{}: {}", "Lunch hay".blue(), horse.lunch_hay);
    println!("{}: {}", "Dinner hay".blue(), horse.dinner_hay);
    println!("{}: {}", "Allergies".blue(), horse.allergies_display());
    println!("{}", "-".repeat(40));
}

/// Prints a one-line-per-horse table
pub fn print_horse_table<'a>(horses: impl Iterator<Item = &'a Horse>) {
    println!(
        "{:<4} | {:<20} | {:<18} | {:<12} | {:<6} | {:<10}",
        "#", "Name", "Breed", "Barn", "Stall", "Birthdate"
    );
    println!("{}", "-".repeat(86));

    for (i, horse) in horses.enumerate() {
        let barn = match &horse.barn {
            Some(barn) => barn.normal(),
            None => "Unassigned".yellow(),
        };
        let stall = horse
            .stall
            .map(|s| s.to_string())
            .unwrap_or_else(|| String::from("-"));
        println!(
            "{:<4} | {:<20} | {:<18} | {:<12} | {:<6} | {:<10}",
            i + 1,
            horse.name,
            horse.breed,
            barn,
            stall,
            horse.birth_date
        );
    }
}

/// Prints the numbered barn listing used for selection by number
pub fn print_barn_list(barns: &[Barn]) {
    for (i, barn) in barns.iter().enumerate() {
        println!("{}. {}", i + 1, barn);
    }
}

/// Prints the numbered list of barns with empty stalls
pub fn print_available_barns(available: &[AvailableBarn]) {
    println!("{}", "Available barns with empty stalls:".green());
    for (i, barn) in available.iter().enumerate() {
        println!("{}. {} (Empty stalls: {})", i + 1, barn.name, barn.free);
    }
}

/// Prints capacity figures, and occupants when `with_occupants` is set
pub fn print_barn_summary(summary: &BarnSummary, with_occupants: bool) {
    println!();
    println!("{}: {}", "Barn".blue(), summary.name.bold());
    println!("{}: {}", "Total stalls".blue(), summary.total);
    println!("{}: {}", "Occupied stalls".blue(), summary.occupied);
    let available = if summary.available == 0 {
        summary.available.to_string().red()
    } else {
        summary.available.to_string().green()
    };
    println!("{}: {}", "Available stalls".blue(), available);
    if let Some(note) = &summary.note {
        println!("{}: {}", "Note".blue(), note);
    }

    if !with_occupants {
        println!("{}", "-".repeat(25));
        return;
    }

    if summary.occupants.is_empty() {
        println!("{}", "No horses currently assigned.".yellow());
    } else {
        println!("Horses in this barn:");
        for (stall, name) in &summary.occupants {
            println!("  Stall {:>3}: {}", stall, name);
        }
    }
}
