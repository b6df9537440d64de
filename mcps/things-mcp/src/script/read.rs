//! Read scripts
//!
//! Lists come back as delimited records rather than formatted text: fields
//! are separated by `character id 31` and records are terminated by
//! `character id 30`. Neither character can be typed into Things, so names
//! and notes pass through unescaped, line breaks included. Dates are emitted
//! as `YYYY-MM-DD` and empty when missing.

use super::{applescript_date, quote, ScriptBuilder};
use crate::types::{SearchQuery, ThingsList};

/// Separator between the fields of one record
pub const FIELD_SEPARATOR: char = '\u{1f}';
/// Terminator after every record
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Declares `fieldSep` and `recordSep` for record-returning scripts
pub(crate) const SEPARATORS_DECL: &str = "set fieldSep to character id 31\nset recordSep to character id 30";

/// AppleScript expression rendering date variable `var` as `YYYY-MM-DD`
fn iso_date(var: &str) -> String {
    format!(
        "((year of {v}) as text) & \"-\" & text -2 thru -1 of (\"0\" & ((month of {v}) as integer)) & \"-\" & text -2 thru -1 of (\"0\" & (day of {v}))",
        v = var
    )
}

/// Collect `matches` (already set) into todo records: id, name, notes,
/// status, due date, activation date
fn todo_records(limit: Option<usize>) -> String {
    let mut lines = vec![
        SEPARATORS_DECL.to_string(),
        "set matchCount to count of matches".to_string(),
    ];
    if let Some(limit) = limit {
        lines.push(format!(
            "if matchCount > {limit} then set matchCount to {limit}",
            limit = limit
        ));
    }
    lines.push("set output to \"\"".to_string());
    lines.push("repeat with i from 1 to matchCount".to_string());
    lines.push("    set currentToDo to item i of matches".to_string());
    lines.push("    set todoNotes to notes of currentToDo".to_string());
    lines.push("    if todoNotes is missing value then set todoNotes to \"\"".to_string());
    for (var, property) in [("dueText", "due date"), ("startText", "activation date")] {
        lines.push(format!("    set {} to \"\"", var));
        lines.push(format!("    set dateValue to {} of currentToDo", property));
        lines.push(format!(
            "    if dateValue is not missing value then set {} to {}",
            var,
            iso_date("dateValue")
        ));
    }
    lines.push(
        "    set output to output & (id of currentToDo) & fieldSep & (name of currentToDo) & fieldSep & todoNotes & fieldSep & ((status of currentToDo) as text) & fieldSep & dueText & fieldSep & startText & recordSep"
            .to_string(),
    );
    lines.push("end repeat".to_string());
    lines.push("return output".to_string());
    lines.join("\n")
}

/// `to dos ... whose ...` clause for a search
pub fn search_clause(query: &SearchQuery) -> String {
    let collection = match (&query.area, &query.project) {
        (Some(area), _) => format!("to dos of area {}", quote(area)),
        (None, Some(project)) => format!("to dos of project {}", quote(project)),
        (None, None) => "to dos".to_string(),
    };

    let mut conditions = Vec::new();
    if let Some(text) = query.text.as_deref().filter(|t| !t.is_empty()) {
        conditions.push(format!("name contains {}", quote(text)));
    }
    if let Some(tag) = &query.tag {
        conditions.push(format!("tag names contains {}", quote(tag)));
    }
    if let Some(status) = query.status {
        conditions.push(format!("status is {}", status.keyword()));
    }
    let ranges = [
        ("due date", "≥", query.due_start),
        ("due date", "≤", query.due_end),
        ("activation date", "≥", query.scheduled_start),
        ("activation date", "≤", query.scheduled_end),
    ];
    for (property, op, date) in ranges {
        if let Some(date) = date {
            conditions.push(format!(
                "{} {} (date {})",
                property,
                op,
                quote(&applescript_date(date))
            ));
        }
    }

    if conditions.is_empty() {
        collection
    } else {
        format!("{} whose {}", collection, conditions.join(" and "))
    }
}

impl ScriptBuilder {
    /// Every todo in a built-in list
    pub fn list_todos_script(&self, list: ThingsList) -> String {
        self.tell(&format!(
            "set matches to to dos of list {}\n{}",
            quote(list.name()),
            todo_records(None)
        ))
    }

    /// Todos matching a search, at most `query.limit` of them
    pub fn search_todos_script(&self, query: &SearchQuery) -> String {
        self.tell(&format!(
            "set matches to {}\n{}",
            search_clause(query),
            todo_records(Some(query.limit))
        ))
    }

    /// Area records: id, name
    pub fn list_areas_script(&self) -> String {
        self.tell(&format!(
            "{}\nset output to \"\"\nset allAreas to areas\nrepeat with i from 1 to count of allAreas\n    set currentArea to item i of allAreas\n    set output to output & (id of currentArea) & fieldSep & (name of currentArea) & recordSep\nend repeat\nreturn output",
            SEPARATORS_DECL
        ))
    }

    /// Project records: id, name, area name (empty outside an area)
    pub fn list_projects_script(&self) -> String {
        self.tell(&format!(
            "{}
set output to \"\"
set allProjects to projects
repeat with i from 1 to count of allProjects
    set currentProject to item i of allProjects
    set areaName to \"\"
    try
        set projectArea to area of currentProject
        if projectArea is not missing value then set areaName to name of projectArea
    end try
    set output to output & (id of currentProject) & fieldSep & (name of currentProject) & fieldSep & areaName & recordSep
end repeat
return output",
            SEPARATORS_DECL
        ))
    }

    /// Tag records: id, name, parent tag name (empty for top-level tags)
    pub fn list_tags_script(&self) -> String {
        self.tell(&format!(
            "{}
set output to \"\"
set allTags to tags
repeat with i from 1 to count of allTags
    set currentTag to item i of allTags
    set parentName to \"\"
    try
        set parentTag to parent tag of currentTag
        if parentTag is not missing value then set parentName to name of parentTag
    end try
    set output to output & (id of currentTag) & fieldSep & (name of currentTag) & fieldSep & parentName & recordSep
end repeat
return output",
            SEPARATORS_DECL
        ))
    }

    pub fn version_script(&self) -> String {
        self.tell("return version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TodoStatus;
    use chrono::NaiveDate;

    #[test]
    fn test_search_clause_without_filters() {
        assert_eq!(search_clause(&SearchQuery::default()), "to dos");
    }

    #[test]
    fn test_search_clause_area_wins_over_project() {
        let query = SearchQuery {
            text: Some("call".into()),
            area: Some("Work".into()),
            project: Some("Launch".into()),
            status: Some(TodoStatus::Open),
            ..Default::default()
        };
        assert_eq!(
            search_clause(&query),
            r#"to dos of area "Work" whose name contains "call" and status is open"#
        );
    }

    #[test]
    fn test_search_clause_date_ranges() {
        let query = SearchQuery {
            tag: Some("errand".into()),
            due_start: NaiveDate::from_ymd_opt(2024, 12, 25),
            scheduled_end: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..Default::default()
        };
        assert_eq!(
            search_clause(&query),
            r#"to dos whose tag names contains "errand" and due date ≥ (date "December 25, 2024 00:00:00") and activation date ≤ (date "December 31, 2024 00:00:00")"#
        );
    }

    #[test]
    fn test_search_script_applies_limit() {
        let query = SearchQuery {
            text: Some("say \"hi\"".into()),
            limit: 50,
            ..Default::default()
        };
        let script = ScriptBuilder::default().search_todos_script(&query);
        assert!(script.contains(r#"set matches to to dos whose name contains "say \"hi\"""#));
        assert!(script.contains("if matchCount > 50 then set matchCount to 50"));
        assert!(script.contains("character id 31"));
    }

    #[test]
    fn test_list_script_targets_list_without_limit() {
        let script = ScriptBuilder::default().list_todos_script(ThingsList::Logbook);
        assert!(script.contains(r#"set matches to to dos of list "Logbook""#));
        assert!(!script.contains("if matchCount >"));
        assert!(script.contains("activation date of currentToDo"));
    }

    #[test]
    fn test_iso_date_pads_month_and_day() {
        let expr = iso_date("d");
        assert!(expr.starts_with("((year of d) as text)"));
        assert!(expr.contains("text -2 thru -1 of (\"0\" & ((month of d) as integer))"));
    }
}
