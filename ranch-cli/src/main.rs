mod cli;
mod display;
mod menu;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use ranch_core::{
    determine_data_dir, export, Credentials, ExportFormat, RanchError, Session, Storage,
};

use crate::cli::{Cli, Command};
use crate::display::{print_barn_list, print_barn_summary, print_horse_table};

const LOGIN_ATTEMPTS: usize = 3;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let (data_dir, format) = determine_data_dir(cli.data_dir.as_deref())?;
    let storage = Storage::new(&data_dir, format);
    log::debug!("records stored under {:?}", storage.path());

    let user = cli.user.as_deref();
    match cli.command.unwrap_or(Command::Menu) {
        Command::Register => register(&storage, user)?,
        Command::Menu => {
            let mut session = login(&storage, user)?;
            menu::run(&storage, &mut session)?;
        }
        Command::Horses { search, barn, stall } => {
            let session = login(&storage, user)?;
            list_horses(&session, search.as_deref(), barn.as_deref(), stall);
        }
        Command::Barns => {
            let session = login(&storage, user)?;
            list_barns(&session);
        }
        Command::Vacancies => {
            let session = login(&storage, user)?;
            list_vacancies(&session);
        }
        Command::Export { format, output } => {
            let session = login(&storage, user)?;
            export_horses(&session, &format, output.as_deref())?;
        }
    }

    Ok(())
}

fn register(storage: &Storage, user: Option<&str>) -> Result<()> {
    println!("\n{}", "=== Register New User ===".bold());
    let (username, password, confirm) = prompts::prompt_registration(user)?;

    match Credentials::new(storage.users()).register(&username, &password, &confirm) {
        Ok(user) => {
            println!(
                "{}",
                format!("User '{}' registered successfully.", user.username).green()
            );
            Ok(())
        }
        Err(e) => match e.downcast_ref::<RanchError>() {
            Some(rejection) => {
                println!("{}", rejection.to_string().red());
                Ok(())
            }
            None => Err(e),
        },
    }
}

/// Authenticates the user and loads their records
fn login(storage: &Storage, user: Option<&str>) -> Result<Session> {
    let credentials = Credentials::new(storage.users());

    for attempt in 1..=LOGIN_ATTEMPTS {
        let (username, password) = prompts::prompt_credentials(user)?;
        match credentials.login(&username, &password) {
            Ok(owner) => {
                println!("{}", format!("Welcome, {}!", owner).green());
                return storage
                    .open_session(&owner)
                    .with_context(|| format!("Failed to load data for '{}'", owner));
            }
            Err(e) if e.downcast_ref::<RanchError>().is_some() => {
                println!("{}", e.to_string().red());
                log::warn!("failed login attempt {} for '{}'", attempt, username);
            }
            Err(e) => return Err(e),
        }
    }

    anyhow::bail!("Too many failed login attempts")
}

fn list_horses(session: &Session, search: Option<&str>, barn: Option<&str>, stall: Option<u32>) {
    let horses = match (search, barn, stall) {
        (_, Some(barn), Some(stall)) => session.horses().at_stall(barn, stall),
        (Some(query), _, _) => session.horses().search(query),
        _ => session.horses().iter().collect(),
    };

    if horses.is_empty() {
        println!("{}", "No horses found.".yellow());
        return;
    }
    print_horse_table(horses.into_iter());
}

fn list_barns(session: &Session) {
    if session.barns().is_empty() {
        println!("{}", "No barns have been added yet.".yellow());
        return;
    }
    print_barn_list(session.barns().all());
}

fn list_vacancies(session: &Session) {
    let vacancies = session.vacancies();
    if vacancies.is_empty() {
        println!("{}", "No empty stalls found in any barn.".yellow());
        return;
    }
    for summary in &vacancies {
        print_barn_summary(summary, false);
    }
}

fn export_horses(session: &Session, format: &str, output: Option<&Path>) -> Result<()> {
    let format = ExportFormat::parse(format)?;
    let output = output.unwrap_or_else(|| Path::new(format.default_file_name()));
    let today = chrono::Local::now().date_naive();

    let count = export::export_horses(session.horses().iter(), format, output, today)?;
    println!(
        "{}",
        format!("Exported {} horses to '{}'.", count, output.display()).green()
    );
    Ok(())
}
