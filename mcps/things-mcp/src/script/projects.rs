//! Project and tag scripts

use super::read::SEPARATORS_DECL;
use super::{applescript_date, quote, ScriptBuilder};
use crate::types::{NewProject, When};

impl ScriptBuilder {
    /// Create a project, returning its id. Scheduling is a separate step.
    pub fn create_project_script(&self, project: &NewProject) -> String {
        let mut properties = vec![format!("name:{}", quote(&project.title))];
        if let Some(notes) = project.notes.as_deref().filter(|n| !n.is_empty()) {
            properties.push(format!("notes:{}", quote(notes)));
        }
        if let Some(deadline) = project.deadline {
            properties.push(format!("due date:(date {})", quote(&applescript_date(deadline))));
        }
        if !project.tags.is_empty() {
            properties.push(format!("tag names:{}", quote(&project.tags.join(", "))));
        }
        if let Some(area) = &project.area {
            properties.push(format!("area:area {}", quote(area)));
        }
        self.tell(&format!(
            "set newProject to make new project with properties {{{}}}\nreturn id of newProject",
            properties.join(", ")
        ))
    }

    /// Schedule a project's start date; `None` for Someday
    pub fn schedule_project_script(&self, project_id: &str, when: When) -> Option<String> {
        self.schedule_item_script("project", project_id, when)
    }

    pub fn cancel_project_script(&self, project_id: &str) -> String {
        self.tell(&format!(
            "set targetProject to project id {}\nset status of targetProject to canceled\nreturn name of targetProject",
            quote(project_id)
        ))
    }

    /// Projects are deleted by moving them to the Trash list
    pub fn delete_project_script(&self, project_id: &str) -> String {
        self.tell(&format!(
            "set targetProject to project id {}\nset projectName to name of targetProject\nmove targetProject to list \"Trash\"\nreturn projectName",
            quote(project_id)
        ))
    }

    /// Create a tag, returning one record: id, name, parent name.
    ///
    /// A parent that does not exist is skipped and reported as empty.
    pub fn create_tag_script(&self, name: &str, parent: Option<&str>) -> String {
        let mut lines = vec![
            SEPARATORS_DECL.to_string(),
            format!("set newTag to make new tag with properties {{name:{}}}", quote(name)),
            "set parentName to \"\"".to_string(),
        ];
        if let Some(parent) = parent {
            lines.push("try".to_string());
            lines.push(format!("    set parent tag of newTag to tag {}", quote(parent)));
            lines.push("    set parentName to name of parent tag of newTag".to_string());
            lines.push("end try".to_string());
        }
        lines.push(
            "return (id of newTag) & fieldSep & (name of newTag) & fieldSep & parentName & recordSep"
                .to_string(),
        );
        self.tell(&lines.join("\n"))
    }
}
