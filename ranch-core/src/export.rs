use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::Horse;

/// Supported horse list export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    /// Parses a format name as given on the command line
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => anyhow::bail!("Unknown export format '{}'. Use markdown or json", other),
        }
    }

    /// Default output file for the format
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "horse_list.md",
            ExportFormat::Json => "horse_list.json",
        }
    }
}

const COLUMNS: [&str; 8] = [
    "Name",
    "Breed",
    "Barn",
    "Stall",
    "Birthdate",
    "Breakfast",
    "Lunch",
    "Dinner",
];

/// One export row. Markdown renders a missing placement as "Unassigned" / "-".
#[derive(Debug, Serialize)]
struct HorseRow<'a> {
    name: &'a str,
    breed: &'a str,
    barn: Option<&'a str>,
    stall: Option<u32>,
    birth_date: NaiveDate,
    breakfast_hay: &'a str,
    lunch_hay: &'a str,
    dinner_hay: &'a str,
    allergies: Vec<&'a str>,
}

impl<'a> HorseRow<'a> {
    fn new(horse: &'a Horse) -> Self {
        Self {
            name: &horse.name,
            breed: &horse.breed,
            barn: horse.barn.as_deref(),
            stall: horse.stall,
            birth_date: horse.birth_date,
            breakfast_hay: &horse.breakfast_hay,
            lunch_hay: &horse.lunch_hay,
            dinner_hay: &horse.dinner_hay,
            allergies: horse.allergies.iter().map(|a| a.as_str()).collect(),
        }
    }

    fn cells(&self) -> [String; 8] {
        [
            self.name.to_string(),
            self.breed.to_string(),
            self.barn.unwrap_or("Unassigned").to_string(),
            self.stall
                .map(|s| s.to_string())
                .unwrap_or_else(|| String::from("-")),
            self.birth_date.to_string(),
            self.breakfast_hay.to_string(),
            self.lunch_hay.to_string(),
            self.dinner_hay.to_string(),
        ]
    }
}

/// Escapes characters that would break a Markdown table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Renders the horse list as a Markdown document with one table
pub fn render_markdown<'a>(horses: impl Iterator<Item = &'a Horse>, generated_on: NaiveDate) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "# Horse List - Generated on {}\n\n",
        generated_on.format("%Y-%m-%d")
    ));

    output.push_str(&format!("| {} |\n", COLUMNS.join(" | ")));
    output.push_str(&format!("|{}\n", "---|".repeat(COLUMNS.len())));

    for horse in horses {
        let cells: Vec<String> = HorseRow::new(horse).cells().iter().map(|c| cell(c)).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    output
}

/// Renders the horse list as pretty-printed JSON
pub fn render_json<'a>(horses: impl Iterator<Item = &'a Horse>) -> Result<String> {
    let rows: Vec<HorseRow<'a>> = horses.map(HorseRow::new).collect();
    serde_json::to_string_pretty(&rows).context("Failed to serialize horse list")
}

/// Writes the horse list to `output_path`, returning the number of horses
pub fn export_horses<'a>(
    horses: impl ExactSizeIterator<Item = &'a Horse>,
    format: ExportFormat,
    output_path: &Path,
    generated_on: NaiveDate,
) -> Result<usize> {
    let count = horses.len();
    let content = match format {
        ExportFormat::Markdown => render_markdown(horses, generated_on),
        ExportFormat::Json => render_json(horses)?,
    };

    fs::write(output_path, content)
        .with_context(|| format!("Failed to write export to {:?}", output_path))?;
    log::info!("exported {} horses to {:?}", count, output_path);

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Vec<Horse> {
        let birth = NaiveDate::from_ymd_opt(2016, 7, 4).unwrap();
        let mut placed = Horse::new("Bolt".into(), birth, "Arabian".into(), "alice".into())
            .with_hay("timothy", "alfalfa", "orchard");
        placed.barn = Some("North".into());
        placed.stall = Some(1);
        let loose = Horse::new("Pipe|Dream".into(), birth, "Pony".into(), "alice".into());
        vec![placed, loose]
    }

    #[test]
    fn test_render_markdown() {
        let horses = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let doc = render_markdown(horses.iter(), today);

        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines[0], "# Horse List - Generated on 2024-01-15");
        assert_eq!(
            lines[2],
            "| Name | Breed | Barn | Stall | Birthdate | Breakfast | Lunch | Dinner |"
        );
        assert_eq!(
            lines[4],
            "| Bolt | Arabian | North | 1 | 2016-07-04 | timothy | alfalfa | orchard |"
        );
        assert!(lines[5].starts_with("| Pipe\\|Dream | Pony | Unassigned | - | 2016-07-04 |"));
    }

    #[test]
    fn test_render_json() {
        let horses = sample();
        let json = render_json(horses.iter()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["barn"], "North");
        assert_eq!(value[0]["stall"], 1);
        assert!(value[1]["barn"].is_null());
        assert!(value[1]["stall"].is_null());
        assert_eq!(value[1]["birth_date"], "2016-07-04");
    }

    #[test]
    fn test_export_writes_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("horses.md");
        let horses = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let count = export_horses(horses.iter(), ExportFormat::Markdown, &path, today)?;
        assert_eq!(count, 2);
        assert!(fs::read_to_string(&path)?.contains("| Bolt |"));
        Ok(())
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse("MD").unwrap(), ExportFormat::Markdown);
        assert_eq!(ExportFormat::parse("json").unwrap(), ExportFormat::Json);
        assert!(ExportFormat::parse("docx").is_err());
    }
}
