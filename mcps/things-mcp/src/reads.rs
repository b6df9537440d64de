//! Read operations: lists, search, areas, projects, tags
//!
//! Scripts return separator-delimited records (see [`crate::script::read`]);
//! this module turns them into typed summaries. A record with the wrong number
//! of fields, an unknown status or a malformed date fails the whole call with
//! [`ThingsError::UnexpectedOutput`].

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::client::ThingsClient;
use crate::script::read::{FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::types::{
    parse_date, AreaSummary, ProjectSummary, SearchQuery, TagSummary, ThingsError, ThingsList,
    TodoStatus, TodoSummary, VersionInfo,
};

/// Split script output into records of exactly `fields` fields
pub fn parse_records(output: &str, fields: usize) -> Result<Vec<Vec<&str>>, ThingsError> {
    output
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .map(|record| {
            let values: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
            if values.len() == fields {
                Ok(values)
            } else {
                Err(ThingsError::UnexpectedOutput(format!(
                    "expected {} fields per record, got {}",
                    fields,
                    values.len()
                )))
            }
        })
        .collect()
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn record_date(value: &str) -> Result<Option<NaiveDate>, ThingsError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(value)
        .map(Some)
        .ok_or_else(|| ThingsError::UnexpectedOutput(format!("bad date '{}'", value)))
}

fn todo_summary(record: &[&str]) -> Result<TodoSummary, ThingsError> {
    let status = record[3]
        .parse::<TodoStatus>()
        .map_err(|e| ThingsError::UnexpectedOutput(e.to_string()))?;
    Ok(TodoSummary {
        id: record[0].trim().to_string(),
        name: record[1].to_string(),
        notes: record[2].to_string(),
        status,
        due_date: record_date(record[4])?,
        activation_date: record_date(record[5])?,
    })
}

pub fn parse_todos(output: &str) -> Result<Vec<TodoSummary>, ThingsError> {
    parse_records(output, 6)?
        .iter()
        .map(|record| todo_summary(record))
        .collect()
}

pub fn parse_areas(output: &str) -> Result<Vec<AreaSummary>, ThingsError> {
    Ok(parse_records(output, 2)?
        .into_iter()
        .map(|r| AreaSummary {
            id: r[0].trim().to_string(),
            name: r[1].to_string(),
        })
        .collect())
}

pub fn parse_projects(output: &str) -> Result<Vec<ProjectSummary>, ThingsError> {
    Ok(parse_records(output, 3)?
        .into_iter()
        .map(|r| ProjectSummary {
            id: r[0].trim().to_string(),
            name: r[1].to_string(),
            area: optional(r[2]),
        })
        .collect())
}

pub fn parse_tags(output: &str) -> Result<Vec<TagSummary>, ThingsError> {
    Ok(parse_records(output, 3)?
        .into_iter()
        .map(|r| TagSummary {
            id: r[0].trim().to_string(),
            name: r[1].to_string(),
            parent: optional(r[2]),
        })
        .collect())
}

impl ThingsClient {
    #[instrument(skip(self), fields(list = list.name()))]
    pub async fn list_todos(&self, list: ThingsList) -> Result<Vec<TodoSummary>, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().list_todos_script(list)).await?;
        let todos = parse_todos(&output)?;
        debug!(count = todos.len(), "Listed todos");
        Ok(todos)
    }

    #[instrument(skip(self, query), fields(limit = query.limit))]
    pub async fn search_todos(&self, query: &SearchQuery) -> Result<Vec<TodoSummary>, ThingsError> {
        self.ensure_running().await?;
        let output = self.run(&self.scripts().search_todos_script(query)).await?;
        let todos = parse_todos(&output)?;
        debug!(count = todos.len(), "Search finished");
        Ok(todos)
    }

    pub async fn fetch_areas(&self) -> Result<Vec<AreaSummary>, ThingsError> {
        self.ensure_running().await?;
        parse_areas(&self.run(&self.scripts().list_areas_script()).await?)
    }

    pub async fn fetch_projects(&self) -> Result<Vec<ProjectSummary>, ThingsError> {
        self.ensure_running().await?;
        parse_projects(&self.run(&self.scripts().list_projects_script()).await?)
    }

    pub async fn fetch_tags(&self) -> Result<Vec<TagSummary>, ThingsError> {
        self.ensure_running().await?;
        parse_tags(&self.run(&self.scripts().list_tags_script()).await?)
    }

    pub async fn version_info(&self) -> Result<VersionInfo, ThingsError> {
        let version = self.run(&self.scripts().version_script()).await?;
        Ok(VersionInfo {
            version,
            app_name: "Things 3".to_string(),
        })
    }
}
