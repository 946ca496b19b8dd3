//! Calendar export: write a meal plan as an iCalendar (`.ics`) file.
//!
//! Each meal becomes a one-hour event: breakfast at 08:00, lunch at 13:00,
//! anything else at 19:00. Day N of the plan lands on `start + N - 1`.
//! Times are floating local times, so calendar apps show them at the
//! stated hour in whatever zone the user is in.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use souschef_core::error::ToolError;
use souschef_core::meal::{MealPlan, PlannedMeal};
use souschef_core::tool::{Tool, ToolContext, ToolKind, ToolOutput, ToolParams};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const ICS_DATETIME: &str = "%Y%m%dT%H%M%S";

/// Writes a meal plan to a calendar file.
#[async_trait]
pub trait CalendarExporter: Send + Sync {
    /// Write `plan`, starting on `start`, to `path`. Returns the written path.
    async fn export(&self, plan: &MealPlan, start: NaiveDate, path: &Path) -> Result<PathBuf, ToolError>;
}

/// iCalendar exporter.
pub struct IcsExporter;

impl IcsExporter {
    fn slot(meal: &PlannedMeal, start: NaiveDate) -> NaiveDateTime {
        let hour = match meal.meal_type.trim().to_lowercase().as_str() {
            "breakfast" => 8,
            "lunch" => 13,
            _ => 19,
        };
        let offset = i64::from(meal.day.saturating_sub(1));
        let date = start
            .checked_add_signed(TimeDelta::days(offset))
            .unwrap_or(start);
        date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default())
    }

    /// Render the plan as iCalendar text (CRLF line endings).
    pub fn render(plan: &MealPlan, start: NaiveDate) -> String {
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//Sous-Chef//Meal Plan//EN".to_string(),
            "CALSCALE:GREGORIAN".to_string(),
        ];

        for meal in &plan.plan {
            let begin = Self::slot(meal, start);
            let end = begin + TimeDelta::hours(1);
            lines.push("BEGIN:VEVENT".into());
            lines.push(format!("UID:{}@souschef", uuid::Uuid::new_v4()));
            lines.push(format!("DTSTAMP:{stamp}"));
            lines.push(format!("DTSTART:{}", begin.format(ICS_DATETIME)));
            lines.push(format!("DTEND:{}", end.format(ICS_DATETIME)));
            lines.push(format!(
                "SUMMARY:{}",
                escape_text(&format!("{}: {}", meal.meal_type, meal.meal_name))
            ));
            lines.push("END:VEVENT".into());
        }

        lines.push("END:VCALENDAR".into());
        let mut out = lines.join("\r\n");
        out.push_str("\r\n");
        out
    }
}

/// Escape a TEXT value (RFC 5545 §3.3.11).
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

#[async_trait]
impl CalendarExporter for IcsExporter {
    async fn export(&self, plan: &MealPlan, start: NaiveDate, path: &Path) -> Result<PathBuf, ToolError> {
        let failed = |reason: String| ToolError::ExecutionFailed {
            tool: ToolKind::ExportCalendar.name().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(format!("cannot create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(path, Self::render(plan, start))
            .await
            .map_err(|e| failed(format!("cannot write {}: {e}", path.display())))?;

        info!(path = %path.display(), events = plan.plan.len(), "Calendar file written");
        Ok(path.to_path_buf())
    }
}

/// The `export_calendar` tool.
pub struct ExportCalendarTool {
    exporter: Arc<dyn CalendarExporter>,
    output_dir: PathBuf,
    user_id: String,
}

impl ExportCalendarTool {
    pub fn new(exporter: Arc<dyn CalendarExporter>, output_dir: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            exporter,
            output_dir: output_dir.into(),
            user_id: user_id.into(),
        }
    }

    fn target_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_meal_plan.ics", self.user_id))
    }
}

#[async_trait]
impl Tool for ExportCalendarTool {
    fn kind(&self) -> ToolKind {
        ToolKind::ExportCalendar
    }

    async fn execute(&self, params: &ToolParams, ctx: ToolContext<'_>) -> Result<ToolOutput, ToolError> {
        let plan = match params.value("meal_plan") {
            Some(value) => MealPlan::from_value(value.clone()).map_err(|e| ToolError::InvalidParameters {
                tool: self.kind().name().to_string(),
                field: "meal_plan".into(),
                reason: e.to_string(),
            })?,
            None => ctx.last_meal_plan.cloned().ok_or_else(|| ToolError::ExecutionFailed {
                tool: self.kind().name().to_string(),
                reason: "no meal plan was given and none has been generated in this session".into(),
            })?,
        };

        let start = match params.str("start_date") {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ToolError::InvalidParameters {
                tool: self.kind().name().to_string(),
                field: "start_date".into(),
                reason: format!("'{raw}' is not a YYYY-MM-DD date"),
            })?,
            None => Local::now().date_naive(),
        };

        let path = self.exporter.export(&plan, start, &self.target_path()).await?;

        let data = serde_json::json!({
            "status": "success",
            "message": "Calendar file created successfully.",
            "file_path": path.display().to_string(),
            "events": plan.plan.len(),
            "start_date": start.format("%Y-%m-%d").to_string(),
        });
        Ok(ToolOutput::text(data.to_string()).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::params;
    use souschef_core::memory::MemoryBank;
    use serde_json::json;

    fn plan() -> MealPlan {
        MealPlan::from_value(json!([
            { "day": 1, "meal_type": "Breakfast", "meal_name": "Oatmeal with Berries" },
            { "day": 1, "meal_type": "lunch", "meal_name": "Quinoa Salad" },
            { "day": 2, "meal_type": "Dinner", "meal_name": "Leeks, Peas; Rice" }
        ]))
        .unwrap()
    }

    #[test]
    fn render_places_meals_on_their_slots() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let ics = IcsExporter::render(&plan(), start);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
        assert!(ics.contains("DTSTART:20250310T080000\r\nDTEND:20250310T090000"));
        assert!(ics.contains("DTSTART:20250310T130000"));
        assert!(ics.contains("DTSTART:20250311T190000\r\nDTEND:20250311T200000"));
        assert!(ics.contains("SUMMARY:Dinner: Leeks\\, Peas\\; Rice"));
    }

    #[tokio::test]
    async fn tool_writes_file_for_explicit_plan() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ExportCalendarTool::new(Arc::new(IcsExporter), dir.path(), "cli_user");
        let bank = MemoryBank::new();

        let out = tool
            .execute(
                &params(
                    ToolKind::ExportCalendar,
                    json!({ "meal_plan": serde_json::to_value(plan()).unwrap(), "start_date": "2025-03-10" }),
                ),
                ToolContext::new(&bank),
            )
            .await
            .unwrap();

        let path = dir.path().join("cli_user_meal_plan.ics");
        assert_eq!(out.data.as_ref().unwrap()["file_path"], path.display().to_string());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("SUMMARY:Breakfast: Oatmeal with Berries"));
        assert!(out.delta.is_none());
    }

    #[tokio::test]
    async fn tool_falls_back_to_session_plan() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ExportCalendarTool::new(Arc::new(IcsExporter), dir.path(), "cli_user");
        let bank = MemoryBank::new();
        let last = plan();

        let out = tool
            .execute(
                &params(ToolKind::ExportCalendar, json!({})),
                ToolContext::new(&bank).with_meal_plan(Some(&last)),
            )
            .await
            .unwrap();
        assert_eq!(out.data.unwrap()["events"], 3);
    }

    #[tokio::test]
    async fn tool_without_any_plan_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ExportCalendarTool::new(Arc::new(IcsExporter), dir.path(), "cli_user");
        let bank = MemoryBank::new();

        let err = tool
            .execute(&params(ToolKind::ExportCalendar, json!({})), ToolContext::new(&bank))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
