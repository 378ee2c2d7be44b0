use anyhow::Result;
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, InquireError, Password, Select, Text};
use uuid::Uuid;

use ranch_core::{parse_allergies, parse_birth_date, Horse, HorseUpdate, Session};

/// Maps an Esc press to `None` so callers can step back a menu level
pub fn optional<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Prompts for login details, using `user` when already given
pub fn prompt_credentials(user: Option<&str>) -> Result<(String, String)> {
    let username = match user {
        Some(u) => u.to_string(),
        None => Text::new("Username:").prompt()?,
    };
    let password = Password::new("Password:").without_confirmation().prompt()?;
    Ok((username.trim().to_string(), password))
}

/// Prompts for a new username, password and confirmation
pub fn prompt_registration(user: Option<&str>) -> Result<(String, String, String)> {
    let username = match user {
        Some(u) => u.to_string(),
        None => Text::new("New username:").prompt()?,
    };
    let password = Password::new("Password:").without_confirmation().prompt()?;
    let confirm = Password::new("Confirm password:")
        .without_confirmation()
        .prompt()?;
    Ok((username, password, confirm))
}

fn required_text(message: &str) -> Result<String> {
    let value = Text::new(message)
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("A value is required".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;
    Ok(value.trim().to_string())
}

/// Prompts the user for a new horse
pub fn prompt_new_horse(owner: &str) -> Result<Horse> {
    let name = required_text("Horse name:")?;

    let birth = Text::new("Birth date (YYYY-MM-DD):")
        .with_validator(|input: &str| match parse_birth_date(input) {
            Ok(_) => Ok(Validation::Valid),
            Err(e) => Ok(Validation::Invalid(e.to_string().into())),
        })
        .prompt()?;
    let birth_date = parse_birth_date(&birth)?;

    let breed = Text::new("Breed:").prompt()?;
    let breakfast = Text::new("Breakfast hay type:").prompt()?;
    let lunch = Text::new("Lunch hay type:").prompt()?;
    let dinner = Text::new("Dinner hay type:").prompt()?;
    let allergies = Text::new("Allergies (comma separated):").prompt()?;

    let horse = Horse::new(name, birth_date, breed.trim().to_string(), owner.to_string())
        .with_hay(breakfast.trim(), lunch.trim(), dinner.trim())
        .with_allergies(parse_allergies(&allergies));

    Ok(horse)
}

/// Prompts for edits to an existing horse. Blank answers keep the current value.
pub fn prompt_horse_update(horse: &Horse) -> Result<HorseUpdate> {
    println!("Editing '{}' (leave blank to keep current value)", horse.name);

    let keep_blank = |text: String| {
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    };

    let name = Text::new(&format!("New name [{}]:", horse.name)).prompt()?;

    let birth = Text::new(&format!("New birth date [{}] (YYYY-MM-DD):", horse.birth_date))
        .with_validator(|input: &str| {
            if input.trim().is_empty() || parse_birth_date(input).is_ok() {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Invalid date format. Use YYYY-MM-DD".into()))
            }
        })
        .prompt()?;
    let birth_date = match keep_blank(birth) {
        Some(text) => Some(parse_birth_date(&text)?),
        None => None,
    };

    let breed = Text::new(&format!("New breed [{}]:", horse.breed)).prompt()?;
    let breakfast = Text::new(&format!("New breakfast hay [{}]:", horse.breakfast_hay)).prompt()?;
    let lunch = Text::new(&format!("New lunch hay [{}]:", horse.lunch_hay)).prompt()?;
    let dinner = Text::new(&format!("New dinner hay [{}]:", horse.dinner_hay)).prompt()?;
    let allergies = Text::new(&format!(
        "New allergies (comma separated) [{}]:",
        horse.allergies_display()
    ))
    .prompt()?;

    Ok(HorseUpdate {
        name: keep_blank(name),
        birth_date,
        breed: keep_blank(breed),
        breakfast_hay: keep_blank(breakfast),
        lunch_hay: keep_blank(lunch),
        dinner_hay: keep_blank(dinner),
        allergies: keep_blank(allergies).map(|a| parse_allergies(&a)),
    })
}

/// Prompts the user to pick one of the session's horses
pub fn prompt_select_horse(session: &Session, message: &str) -> Result<Option<Uuid>> {
    let options: Vec<String> = session.horses().iter().map(|h| h.to_string()).collect();
    if options.is_empty() {
        return Ok(None);
    }

    let selection = optional(Select::new(message, options).raw_prompt())?;
    Ok(selection.and_then(|choice| session.horses().all().get(choice.index).map(|h| h.id)))
}

/// Prompts for a new barn's name and stall count
pub fn prompt_new_barn(session: &Session) -> Result<(String, u32)> {
    let existing: Vec<String> = session.barns().iter().map(|b| b.name.to_lowercase()).collect();

    let name = Text::new("Barn name:")
        .with_validator(move |input: &str| {
            let name = input.trim();
            if name.is_empty() {
                Ok(Validation::Invalid("A value is required".into()))
            } else if existing.contains(&name.to_lowercase()) {
                Ok(Validation::Invalid(
                    format!("A barn named '{}' already exists", name).into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    let stalls = CustomType::<u32>::new("Number of stalls:")
        .with_error_message("Invalid number format")
        .with_validator(|stalls: &u32| {
            if *stalls == 0 {
                Ok(Validation::Invalid(
                    "Number of stalls must be greater than zero".into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    Ok((name.trim().to_string(), stalls))
}

/// Prompts for a barn by listed number or name
pub fn prompt_barn_choice(message: &str) -> Result<Option<String>> {
    optional(Text::new(message).prompt())
}

/// Prompts for a stall number
pub fn prompt_stall_number() -> Result<u32> {
    Ok(CustomType::<u32>::new("Stall number:")
        .with_error_message("Invalid stall number")
        .prompt()?)
}

/// Asks a yes/no question, defaulting to no
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_maps_cancel_to_none() {
        assert_eq!(optional(Ok(7)).unwrap(), Some(7));
        assert_eq!(optional::<u32>(Err(InquireError::OperationCanceled)).unwrap(), None);
        assert!(optional::<u32>(Err(InquireError::OperationInterrupted)).is_err());
    }
}
