//! Workout plan overview transformations

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid plan document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Plan not found: {0}")]
    NotFound(String),
}

/// One exercise inside a workout plan
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlanExercise {
    pub id: String,
    pub name: String,
    /// Duration label, e.g. "00:30"
    #[serde(default)]
    pub time: String,
    /// Set/rep label, e.g. "3 x 12"
    #[serde(default)]
    pub set: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkoutPlan {
    pub name: String,
    #[serde(default)]
    pub coach: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub exercises: Vec<PlanExercise>,
}

/// Header figures plus exercise rows of a plan
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlanOverview {
    pub name: String,
    pub coach: String,
    pub rating: f32,
    pub minutes: u32,
    pub calories: u32,
    pub exercise_count: usize,
    pub description: String,
    pub exercises: Vec<PlanExercise>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Many(Vec<WorkoutPlan>),
    One(WorkoutPlan),
}

/// Parse a JSON document holding one plan or an array of plans
pub fn parse_plans(json: &str) -> Result<Vec<WorkoutPlan>, PlanError> {
    let document: PlanDocument = serde_json::from_str(json)?;

    Ok(match document {
        PlanDocument::Many(plans) => plans,
        PlanDocument::One(plan) => vec![plan],
    })
}

/// Find a plan by name, ignoring case
pub fn find_plan<'a>(plans: &'a [WorkoutPlan], name: &str) -> Result<&'a WorkoutPlan, PlanError> {
    let wanted = name.trim().to_lowercase();

    plans
        .iter()
        .find(|plan| plan.name.to_lowercase() == wanted)
        .ok_or_else(|| PlanError::NotFound(name.to_string()))
}

pub fn summarize_plan(plan: &WorkoutPlan) -> PlanOverview {
    PlanOverview {
        name: plan.name.clone(),
        coach: plan.coach.clone(),
        rating: plan.rating,
        minutes: plan.minutes,
        calories: plan.calories,
        exercise_count: plan.exercises.len(),
        description: plan.description.clone(),
        exercises: plan.exercises.clone(),
    }
}
