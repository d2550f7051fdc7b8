//! Council research plan

use crate::core::error::DomainError;
use crate::expert::role::ExpertKind;
use crate::util::extract_json;
use serde::{Deserialize, Serialize};

/// One expert's assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub role: ExpertKind,
    pub task: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_areas: Vec<String>,
}

impl PlannedTask {
    /// Generic assignment used when the coordinator skipped a role
    pub fn default_for(role: ExpertKind, goal: &str) -> Self {
        Self {
            role,
            task: format!(
                "Analyze from the perspective of a {}: {}",
                role.display_name(),
                goal
            ),
            focus_areas: Vec::new(),
        }
    }
}

/// Ordered assignments, one per participating expert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilPlan {
    pub goal: String,
    pub tasks: Vec<PlannedTask>,
}

impl CouncilPlan {
    pub fn roles(&self) -> Vec<ExpertKind> {
        self.tasks.iter().map(|t| t.role).collect()
    }

    pub fn task_for(&self, role: ExpertKind) -> Option<&PlannedTask> {
        self.tasks.iter().find(|t| t.role == role)
    }
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(default)]
    goal: String,
    #[serde(default)]
    tasks: Vec<RawTask>,
}

#[derive(Deserialize)]
struct RawTask {
    #[serde(default)]
    role: String,
    #[serde(default)]
    task: String,
    #[serde(default)]
    focus_areas: Vec<String>,
}

/// Parse a coordinator's plan.
///
/// Tasks for roles outside `requested` are dropped and repeated roles keep
/// their first task. Requested roles the coordinator forgot get a default
/// task appended. A response with no usable task at all is a planning
/// failure.
pub fn parse_plan(
    text: &str,
    requested: &[ExpertKind],
    scope: &str,
) -> Result<CouncilPlan, DomainError> {
    let value = extract_json(text).ok_or_else(|| {
        DomainError::PlanningFailed("coordinator response contains no JSON plan".to_string())
    })?;
    let raw: RawPlan = serde_json::from_value(value)
        .map_err(|e| DomainError::PlanningFailed(format!("malformed plan: {}", e)))?;

    let mut tasks: Vec<PlannedTask> = Vec::new();
    for raw_task in raw.tasks {
        let Ok(role) = raw_task.role.parse::<ExpertKind>() else {
            continue;
        };
        if !requested.contains(&role) || tasks.iter().any(|t| t.role == role) {
            continue;
        }
        if raw_task.task.trim().is_empty() {
            continue;
        }
        tasks.push(PlannedTask {
            role,
            task: raw_task.task.trim().to_string(),
            focus_areas: raw_task.focus_areas,
        });
    }

    if tasks.is_empty() {
        return Err(DomainError::PlanningFailed(
            "plan assigns no task to any requested expert".to_string(),
        ));
    }

    let goal = if raw.goal.trim().is_empty() {
        scope.to_string()
    } else {
        raw.goal.trim().to_string()
    };
    for role in requested {
        if !tasks.iter().any(|t| t.role == *role) {
            tasks.push(PlannedTask::default_for(*role, &goal));
        }
    }

    Ok(CouncilPlan { goal, tasks })
}
