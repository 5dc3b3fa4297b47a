use crate::prelude::{println, *};
use colored::Colorize;
use std::path::{Path, PathBuf};
use unifit_core::plan::{find_plan, parse_plans, summarize_plan, PlanOverview, WorkoutPlan};

#[derive(Debug, clap::Parser)]
#[command(name = "plan")]
#[command(about = "Workout plan overviews")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List the plans in a JSON plan file
    #[clap(name = "list")]
    List(ListOptions),

    /// Show the overview of one plan
    #[clap(name = "show")]
    Show(ShowOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// JSON file holding one plan or an array of plans
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ShowOptions {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Plan name, case-insensitive
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Read and parse a plan file
pub fn load_plans(path: &Path) -> Result<Vec<WorkoutPlan>> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("Failed to read plan file {}", path.display()))?;

    let plans = parse_plans(&contents).wrap_err_with(|| f!("Failed to parse {}", path.display()))?;
    log::debug!("loaded {} plans from {}", plans.len(), path.display());

    Ok(plans)
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::List(options) => {
            let plans = load_plans(&options.file)?;
            let overviews: Vec<PlanOverview> = plans.iter().map(summarize_plan).collect();

            if options.json {
                println!("{}", to_json(&overviews)?);
            } else {
                print!("{}", format_plan_table(&overviews));
            }
        }
        Commands::Show(options) => {
            let plans = load_plans(&options.file)?;
            let overview = summarize_plan(find_plan(&plans, &options.name)?);

            if global.verbose {
                println!("Plan file: {}", options.file.display());
            }

            if options.json {
                println!("{}", to_json(&overview)?);
            } else {
                print!("{}", format_plan_overview(&overview));
            }
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

fn format_plan_table(overviews: &[PlanOverview]) -> String {
    if overviews.is_empty() {
        return format!("\n{}\n", "No plans found.".yellow());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Name".bold().cyan(),
        "Coach".bold().cyan(),
        "Rating".bold().cyan(),
        "Minutes".bold().cyan(),
        "Calories".bold().cyan(),
        "Exercises".bold().cyan()
    ]);

    for plan in overviews {
        table.add_row(prettytable::row![
            plan.name.bright_white(),
            plan.coach.bright_magenta(),
            format!("{:.1}", plan.rating).bright_yellow(),
            plan.minutes.to_string(),
            plan.calories.to_string(),
            plan.exercise_count.to_string()
        ]);
    }

    format!(
        "\n{}\n\n{}\n{}: {}\n",
        format!("WORKOUT PLANS ({})", overviews.len()).bright_cyan().bold(),
        table,
        "To view a plan".bright_white().bold(),
        "unifit plan show <file> <name>".cyan()
    )
}

/// Header figures, description and the exercise rows of one plan
fn format_plan_overview(plan: &PlanOverview) -> String {
    let mut result = String::new();

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!("{}\n", plan.name.to_uppercase().bright_cyan().bold()));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    if !plan.coach.is_empty() {
        result.push_str(&format!("{}: {}\n", "Coach".green(), plan.coach.bright_white()));
    }
    result.push_str(&format!(
        "{}: {} | {}: {} min | {}: {} kcal | {}: {}\n",
        "Rating".green(),
        format!("{:.1}", plan.rating).bright_yellow(),
        "Time".green(),
        plan.minutes,
        "Calories".green(),
        plan.calories,
        "Exercises".green(),
        plan.exercise_count
    ));

    if !plan.description.trim().is_empty() {
        result.push_str(&format!("\n{}\n", plan.description.trim()));
    }

    if plan.exercises.is_empty() {
        result.push_str(&format!("\n{}\n", "This plan has no exercises yet.".yellow()));
    } else {
        let mut table = new_table();
        table.add_row(prettytable::row![
            "#".bold().cyan(),
            "Exercise".bold().cyan(),
            "Time".bold().cyan(),
            "Sets".bold().cyan()
        ]);
        for (idx, exercise) in plan.exercises.iter().enumerate() {
            table.add_row(prettytable::row![
                (idx + 1).to_string().bright_yellow(),
                exercise.name.bright_white(),
                exercise.time,
                exercise.set
            ]);
        }
        result.push_str(&format!("\n{}", table));
    }

    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_plan_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn create_test_plans() -> Vec<WorkoutPlan> {
        parse_plans(
            &serde_json::json!([
                {
                    "name": "Full Body Burn",
                    "coach": "Alex",
                    "rating": 4.5,
                    "minutes": 45,
                    "calories": 420,
                    "description": "A fast circuit.",
                    "exercises": [
                        {"id": "1", "name": "Burpees", "time": "00:40", "set": "3 x 10"},
                        {"id": "2", "name": "Lunges", "time": "00:30", "set": "3 x 12"}
                    ]
                },
                {"name": "Stretch"}
            ])
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_load_plans_from_file() {
        let file = create_test_plan_file(r#"{"name": "Core", "minutes": 20}"#);

        let plans = load_plans(file.path()).unwrap();

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].minutes, 20);
    }

    #[test]
    fn test_load_plans_missing_file() {
        let err = load_plans(Path::new("/nonexistent/plans.json")).unwrap_err();

        assert!(err.to_string().contains("Failed to read plan file"));
    }

    #[test]
    fn test_load_plans_invalid_json() {
        let file = create_test_plan_file("[{");

        let err = load_plans(file.path()).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_format_plan_table() {
        let overviews: Vec<PlanOverview> = create_test_plans().iter().map(summarize_plan).collect();

        let formatted = format_plan_table(&overviews);

        assert!(formatted.contains("WORKOUT PLANS (2)"));
        assert!(formatted.contains("Full Body Burn"));
        assert!(formatted.contains("4.5"));
        assert!(formatted.contains("Stretch"));
    }

    #[test]
    fn test_format_plan_table_empty() {
        assert!(format_plan_table(&[]).contains("No plans found."));
    }

    #[test]
    fn test_format_plan_overview() {
        let plans = create_test_plans();
        let overview = summarize_plan(find_plan(&plans, "full body burn").unwrap());

        let formatted = format_plan_overview(&overview);

        assert!(formatted.contains("FULL BODY BURN"));
        assert!(formatted.contains("Alex"));
        assert!(formatted.contains("45 min"));
        assert!(formatted.contains("420 kcal"));
        assert!(formatted.contains("Burpees"));
        assert!(formatted.contains("3 x 12"));
        assert!(formatted.contains("A fast circuit."));
    }

    #[test]
    fn test_format_plan_overview_without_exercises() {
        let plans = create_test_plans();
        let overview = summarize_plan(find_plan(&plans, "Stretch").unwrap());

        let formatted = format_plan_overview(&overview);

        assert!(formatted.contains("This plan has no exercises yet."));
        assert!(!formatted.contains("Coach"));
    }

    #[test]
    fn test_plan_overview_json() {
        let plans = create_test_plans();
        let json = to_json(&summarize_plan(&plans[0])).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["exercise_count"], 2);
        assert_eq!(parsed["exercises"][0]["name"], "Burpees");
    }
}
