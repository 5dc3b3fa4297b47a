use crate::prelude::{println, *};
use colored::Colorize;
use unifit_core::catalog::ExerciseRecord;
use unifit_core::controller::FETCH_FAILED_MESSAGE;
use unifit_core::filter::ALL_CATEGORIES;

use super::{create_catalog_client, fetch_catalog, CatalogConfig};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct CategoriesOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// One selectable category chip with the number of exercises behind it
#[derive(Debug, serde::Serialize, Clone, PartialEq)]
pub struct CategoryEntry {
    pub name: String,
    pub exercise_count: usize,
}

pub async fn run(
    options: CategoriesOptions,
    config: CatalogConfig,
    global: crate::Global,
) -> Result<()> {
    let spinner = new_spinner("Loading exercises...")?;
    let client = create_catalog_client()?;
    let result = fetch_catalog(&client, &config).await;
    spinner.finish_and_clear();

    let records = result.map_err(|err| {
        log::error!("{}", err);
        eyre!(err).wrap_err(FETCH_FAILED_MESSAGE)
    })?;

    let entries = category_entries(&records);

    if options.json {
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
        println!("{}", json);
    } else {
        print!("{}", format_categories_text(&entries));
    }

    Ok(())
}

/// "All" followed by each distinct category in first-seen order
fn category_entries(records: &[ExerciseRecord]) -> Vec<CategoryEntry> {
    let mut entries = vec![CategoryEntry {
        name: ALL_CATEGORIES.to_string(),
        exercise_count: records.len(),
    }];

    for name in unifit_core::catalog::distinct_categories(records) {
        let exercise_count = records.iter().filter(|r| r.category == name).count();
        entries.push(CategoryEntry {
            name,
            exercise_count,
        });
    }

    entries
}

fn format_categories_text(entries: &[CategoryEntry]) -> String {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Category".bold().cyan(),
        "Exercises".bold().cyan()
    ]);

    for entry in entries {
        table.add_row(prettytable::row![
            entry.name.bright_white(),
            entry.exercise_count.to_string().bright_yellow()
        ]);
    }

    format!(
        "\n{}\n\n{}\n{}: {}\n",
        "EXERCISE CATEGORIES".bright_cyan().bold(),
        table,
        "To filter".bright_white().bold(),
        "unifit exercises list --category <name>".cyan()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use unifit_core::catalog::ExerciseId;

    fn create_test_record(id: u64, category: &str) -> ExerciseRecord {
        ExerciseRecord {
            id: ExerciseId::Number(id),
            name: format!("Exercise {id}"),
            description: String::new(),
            image_url: None,
            category: category.to_string(),
            expanded: false,
        }
    }

    #[test]
    fn test_category_entries_all_first() {
        let records = vec![
            create_test_record(1, "Legs"),
            create_test_record(2, "Arms"),
            create_test_record(3, "Legs"),
        ];

        let entries = category_entries(&records);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "All");
        assert_eq!(entries[0].exercise_count, 3);
        assert_eq!(entries[1].name, "Legs");
        assert_eq!(entries[1].exercise_count, 2);
        assert_eq!(entries[2].name, "Arms");
    }

    #[test]
    fn test_category_entries_empty_catalog() {
        let entries = category_entries(&[]);

        assert_eq!(
            entries,
            vec![CategoryEntry {
                name: "All".to_string(),
                exercise_count: 0
            }]
        );
    }

    #[test]
    fn test_format_categories_text() {
        let records = vec![create_test_record(1, "Uncategorized")];

        let formatted = format_categories_text(&category_entries(&records));

        assert!(formatted.contains("EXERCISE CATEGORIES"));
        assert!(formatted.contains("All"));
        assert!(formatted.contains("Uncategorized"));
        assert!(formatted.contains("unifit exercises list --category <name>"));
    }

    #[test]
    fn test_categories_json_shape() {
        let records = vec![create_test_record(1, "Cardio")];

        let json = serde_json::to_value(category_entries(&records)).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                {"name": "All", "exercise_count": 1},
                {"name": "Cardio", "exercise_count": 1}
            ])
        );
    }
}
