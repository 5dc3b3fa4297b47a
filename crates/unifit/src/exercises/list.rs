use crate::prelude::{println, *};
use colored::Colorize;
use std::num::NonZeroUsize;
use unifit_core::catalog::ExerciseRecord;
use unifit_core::controller::{build_list_output, ExerciseListOutput, FETCH_FAILED_MESSAGE};
use unifit_core::filter::FilterState;
use unifit_core::pagination::{PageInfo, DEFAULT_PAGE_SIZE};

use super::{create_catalog_client, fetch_catalog, CatalogConfig};

const DESCRIPTION_PREVIEW_CHARS: usize = 120;

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ListOptions {
    /// Only show exercises of this category ("All" shows every category)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Case-insensitive text matched against name and description
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Number of exercises per page
    #[arg(long, env = "UNIFIT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: NonZeroUsize,

    /// Print full descriptions instead of a preview
    #[arg(short, long)]
    pub expand: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListOptions {
    fn filter_state(&self) -> FilterState {
        let mut filter = FilterState::default();
        filter.select_category(self.category.as_deref());
        filter.set_search(self.search.trim());
        filter.current_page = self.page.max(1);
        filter
    }
}

pub async fn run(options: ListOptions, config: CatalogConfig, global: crate::Global) -> Result<()> {
    let spinner = new_spinner("Loading exercises...")?;
    let client = create_catalog_client()?;
    let result = fetch_catalog(&client, &config).await;
    spinner.finish_and_clear();

    let mut records = match result {
        Ok(records) => records,
        Err(err) => {
            log::error!("{}", err);
            return Err(eyre!(err).wrap_err(FETCH_FAILED_MESSAGE));
        }
    };

    if options.expand {
        records.iter_mut().for_each(|record| record.expanded = true);
    }

    let output = build_list_output(&records, &options.filter_state(), options.page_size);

    if global.verbose {
        println!(
            "Fetched {} exercises, {} match the current filter",
            records.len(),
            output.pagination.total_items
        );
    }

    if options.json {
        println!("{}", format_list_json(&output)?);
    } else {
        print!("{}", format_list_text(&output));
    }

    Ok(())
}

fn format_list_json(output: &ExerciseListOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

/// Render one exercise; collapsed records show a description preview
pub(crate) fn format_exercise_entry(record: &ExerciseRecord, number: usize) -> String {
    let mut result = String::new();

    result.push_str(&format!(
        "\n{} {} {}\n",
        format!("[{number}]").yellow().bold(),
        record.name.white().bold(),
        format!("({})", record.category).bright_magenta()
    ));

    result.push_str(&format!(
        "    {}: {}\n",
        "ID".green(),
        record.id.to_string().bright_white()
    ));

    if let Some(url) = &record.image_url {
        result.push_str(&format!(
            "    {}: {}\n",
            "Image".green(),
            url.cyan().underline()
        ));
    }

    if !record.description.trim().is_empty() {
        let description = if record.expanded {
            record.description.trim().to_string()
        } else {
            truncate_text(record.description.trim(), DESCRIPTION_PREVIEW_CHARS)
        };
        result.push_str(&format!("    {}\n", description.bright_black()));
    }

    result
}

/// Render the rows of one page, numbered across the whole collection
pub(crate) fn format_exercise_rows(records: &[&ExerciseRecord], info: &PageInfo) -> String {
    let offset = info.current_page.saturating_sub(1) * info.page_size;

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| format_exercise_entry(record, offset + idx + 1))
        .collect()
}

/// Convert list output to formatted text with colors
fn format_list_text(output: &ExerciseListOutput) -> String {
    let mut result = String::new();
    let info = &output.pagination;
    let category = output
        .filter
        .selected_category
        .as_deref()
        .unwrap_or(unifit_core::filter::ALL_CATEGORIES);

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!(
        "{}\n",
        format!(
            "EXERCISES: {} (Page {} of {})",
            category.to_uppercase(),
            info.current_page,
            info.total_pages.max(1)
        )
        .bright_cyan()
        .bold()
    ));
    if !output.filter.search_query.is_empty() {
        result.push_str(&format!(
            "{}: {}\n",
            "Search".green(),
            output.filter.search_query.bright_white()
        ));
    }
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    if output.exercises.is_empty() {
        let message = if info.total_items == 0 {
            "No exercises match the current filter."
        } else {
            "No exercises on this page."
        };
        result.push_str(&format!("\n{}\n", message.yellow()));
    } else {
        let rows: Vec<&ExerciseRecord> = output.exercises.iter().collect();
        result.push_str(&format_exercise_rows(&rows, info));
    }

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_yellow()));
    result.push_str(&format!("{}\n", "NAVIGATION".bright_yellow().bold()));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_yellow()));

    result.push_str(&format!(
        "\n{} {} {} {} ({} {})\n",
        "Showing page".bright_white(),
        info.current_page.to_string().bright_cyan().bold(),
        "of".bright_white(),
        info.total_pages.max(1).to_string().bright_cyan().bold(),
        info.total_items.to_string().bright_cyan().bold(),
        "matching exercises".bright_white()
    ));

    if output.navigation.next_page_command.is_some()
        || output.navigation.prev_page_command.is_some()
    {
        result.push_str(&format!("\n{}:\n", "To navigate".bright_white().bold()));
    }
    if let Some(command) = &output.navigation.next_page_command {
        result.push_str(&format!("  {}: {}\n", "Next page".green(), command.cyan()));
    }
    if let Some(command) = &output.navigation.prev_page_command {
        result.push_str(&format!(
            "  {}: {}\n",
            "Previous page".green(),
            command.cyan()
        ));
    }

    if !output.categories.is_empty() {
        result.push_str(&format!(
            "\n{}:\n",
            "To filter by category".bright_white().bold()
        ));
        result.push_str(&format!(
            "  {}\n",
            "unifit exercises list --category <name>".cyan()
        ));
        result.push_str(&format!(
            "  {}: {}\n",
            "Categories".green(),
            output.categories.join(", ").bright_white()
        ));
    }

    result.push_str(&format!(
        "\n{}:\n",
        "To get JSON output".bright_white().bold()
    ));
    result.push_str(&format!("  {}\n", "unifit exercises list --json".cyan()));

    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use unifit_core::catalog::ExerciseId;
    use unifit_core::pagination::NavigationCommands;

    fn create_test_record(id: u64, name: &str, category: &str) -> ExerciseRecord {
        ExerciseRecord {
            id: ExerciseId::Number(id),
            name: name.to_string(),
            description: "Keep your core tight and breathe out on the way up.".to_string(),
            image_url: Some(format!("https://wger.de/media/{id}.png")),
            category: category.to_string(),
            expanded: false,
        }
    }

    fn create_test_records(count: u64) -> Vec<ExerciseRecord> {
        (1..=count)
            .map(|id| create_test_record(id, &format!("Exercise {id}"), "Arms"))
            .collect()
    }

    fn create_test_options() -> ListOptions {
        ListOptions {
            category: None,
            search: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            expand: false,
            json: false,
        }
    }

    #[test]
    fn test_filter_state_from_options() {
        let options = ListOptions {
            category: Some("All".to_string()),
            search: "  curl ".to_string(),
            page: 0,
            ..create_test_options()
        };

        let filter = options.filter_state();

        assert_eq!(filter.selected_category, None);
        assert_eq!(filter.search_query, "curl");
        assert_eq!(filter.current_page, 1);
    }

    #[test]
    fn test_filter_state_keeps_page() {
        let options = ListOptions {
            category: Some("Legs".to_string()),
            page: 3,
            ..create_test_options()
        };

        let filter = options.filter_state();

        assert_eq!(filter.selected_category, Some("Legs".to_string()));
        assert_eq!(filter.current_page, 3);
    }

    #[test]
    fn test_format_list_json_structure() {
        let records = create_test_records(3);
        let output = build_list_output(&records, &FilterState::default(), DEFAULT_PAGE_SIZE);

        let json = format_list_json(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["exercises"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["pagination"]["total_items"], 3);
        assert_eq!(parsed["exercises"][0]["id"], 1);
        assert!(parsed.get("navigation").is_some());
        assert_eq!(parsed["categories"], serde_json::json!(["Arms"]));
    }

    #[test]
    fn test_format_exercise_entry_collapsed_preview() {
        let mut record = create_test_record(7, "Plank", "Abs");
        record.description = "a".repeat(200);

        let formatted = format_exercise_entry(&record, 1);

        assert!(formatted.contains("[1]"));
        assert!(formatted.contains("Plank"));
        assert!(formatted.contains("(Abs)"));
        assert!(formatted.contains(&format!("{}...", "a".repeat(DESCRIPTION_PREVIEW_CHARS))));
        assert!(!formatted.contains(&"a".repeat(DESCRIPTION_PREVIEW_CHARS + 1)));
    }

    #[test]
    fn test_format_exercise_entry_expanded() {
        let mut record = create_test_record(7, "Plank", "Abs");
        record.description = "a".repeat(200);
        record.expanded = true;

        let formatted = format_exercise_entry(&record, 1);

        assert!(formatted.contains(&"a".repeat(200)));
    }

    #[test]
    fn test_format_exercise_entry_without_image() {
        let mut record = create_test_record(7, "Plank", "Abs");
        record.image_url = None;
        record.description = String::new();

        let formatted = format_exercise_entry(&record, 4);

        assert!(!formatted.contains("Image"));
        assert!(formatted.contains("[4]"));
    }

    #[test]
    fn test_format_exercise_rows_numbering_continues_across_pages() {
        let records = create_test_records(25);
        let filter = FilterState {
            current_page: 2,
            ..FilterState::default()
        };
        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);
        let rows: Vec<&ExerciseRecord> = output.exercises.iter().collect();

        let formatted = format_exercise_rows(&rows, &output.pagination);

        assert!(formatted.contains("[11]"));
        assert!(formatted.contains("[20]"));
        assert!(!formatted.contains("[21]"));
    }

    #[test]
    fn test_format_list_text_basic() {
        let records = create_test_records(3);
        let output = build_list_output(&records, &FilterState::default(), DEFAULT_PAGE_SIZE);

        let formatted = format_list_text(&output);

        assert!(formatted.contains("EXERCISES: ALL"));
        assert!(formatted.contains("Page 1 of 1"));
        assert!(formatted.contains("Exercise 1"));
        assert!(formatted.contains("Exercise 3"));
        assert!(formatted.contains("NAVIGATION"));
        assert!(!formatted.contains("Next page"));
        assert!(!formatted.contains("Previous page"));
    }

    #[test]
    fn test_format_list_text_middle_page() {
        let records = create_test_records(30);
        let filter = FilterState {
            current_page: 2,
            ..FilterState::default()
        };
        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);

        let formatted = format_list_text(&output);

        assert!(formatted.contains("Next page"));
        assert!(formatted.contains("unifit exercises list --page 3"));
        assert!(formatted.contains("Previous page"));
        assert!(formatted.contains("unifit exercises list --page 1"));
    }

    #[test]
    fn test_format_list_text_with_filter() {
        let records = vec![
            create_test_record(1, "Bench Press", "Chest"),
            create_test_record(2, "Squat", "Legs"),
        ];
        let mut filter = FilterState::default();
        filter.select_category(Some("Legs"));
        filter.set_search("squat");
        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);

        let formatted = format_list_text(&output);

        assert!(formatted.contains("EXERCISES: LEGS"));
        assert!(formatted.contains("Search"));
        assert!(formatted.contains("Squat"));
        assert!(!formatted.contains("Bench Press"));
        assert!(formatted.contains("Chest, Legs"));
    }

    #[test]
    fn test_format_list_text_no_matches() {
        let records = create_test_records(3);
        let mut filter = FilterState::default();
        filter.set_search("deadlift");
        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);

        let formatted = format_list_text(&output);

        assert!(formatted.contains("No exercises match the current filter."));
        assert!(formatted.contains("Page 1 of 1"));
    }

    #[test]
    fn test_format_list_text_page_out_of_range() {
        let records = create_test_records(3);
        let filter = FilterState {
            current_page: 9,
            ..FilterState::default()
        };
        let output = build_list_output(&records, &filter, DEFAULT_PAGE_SIZE);

        let formatted = format_list_text(&output);

        assert!(formatted.contains("No exercises on this page."));
        assert!(formatted.contains("Previous page"));
    }

    #[test]
    fn test_format_list_text_empty_catalog() {
        let output = ExerciseListOutput {
            filter: FilterState::default(),
            exercises: vec![],
            pagination: unifit_core::pagination::page_info(0, DEFAULT_PAGE_SIZE, 1),
            navigation: NavigationCommands {
                next_page_command: None,
                prev_page_command: None,
            },
            categories: vec![],
        };

        let formatted = format_list_text(&output);

        assert!(formatted.contains("No exercises match the current filter."));
        assert!(!formatted.contains("To filter by category"));
    }
}
