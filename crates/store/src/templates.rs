use chrono::Utc;
use docsum_common::{DocsumError, Result};
use docsum_llm::{system_templates, PromptOption, PromptTemplate, TemplateRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{load_records, write_records};

/// User input for creating or editing a template
///
/// `id` set means edit, unset means create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub template: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub options: Vec<PromptOption>,
}

/// User-authored prompt templates kept in a JSON file
pub struct TemplateStore {
    system: Vec<PromptTemplate>,
    user: Vec<PromptTemplate>,
    file_path: PathBuf,
}

impl TemplateStore {
    pub fn load(path: &Path) -> Result<Self> {
        let system = system_templates();
        let user: Vec<PromptTemplate> = load_records::<PromptTemplate>(path)?
            .into_iter()
            .filter(|t| !system.iter().any(|s| s.id == t.id))
            .collect();

        Ok(Self {
            system,
            user,
            file_path: path.to_path_buf(),
        })
    }

    /// System templates followed by user templates
    pub fn list_templates(&self) -> Vec<PromptTemplate> {
        self.system.iter().chain(self.user.iter()).cloned().collect()
    }

    pub fn user_templates(&self) -> &[PromptTemplate] {
        &self.user
    }

    /// Registry for composing prompts with the current user templates
    pub fn registry(&self) -> TemplateRegistry {
        TemplateRegistry::new(self.user.clone())
    }

    /// Create a user template, or update one when the draft carries an id
    pub fn save_user_template(&mut self, draft: TemplateDraft) -> Result<PromptTemplate> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DocsumError::invalid_input("Template name is required"));
        }
        if draft.template.trim().is_empty() {
            return Err(DocsumError::invalid_input("Template text is required"));
        }
        if let Some(id) = draft.id.as_deref() {
            self.ensure_not_system(id)?;
        }
        self.ensure_not_system(&name)?;

        let now = Utc::now();
        let existing = match draft.id.as_deref() {
            Some(id) => Some(
                self.user
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or_else(|| DocsumError::not_found(format!("Template '{}'", id)))?,
            ),
            None => None,
        };

        let id = match &draft.id {
            Some(id) => id.clone(),
            None => self.next_id(now.timestamp_millis()),
        };

        let template = PromptTemplate {
            id,
            name,
            description: draft.description,
            template: draft.template,
            customizable: true,
            is_system_template: false,
            created_at: existing
                .and_then(|i| self.user[i].created_at)
                .or(Some(now)),
            updated_at: Some(now),
            category: draft.category.filter(|c| !c.trim().is_empty()),
            options: draft.options,
            default_options: Vec::new(),
        };

        let previous = match existing {
            Some(i) => Some(std::mem::replace(&mut self.user[i], template.clone())),
            None => {
                self.user.push(template.clone());
                None
            }
        };

        if let Err(e) = self.flush() {
            match (existing, previous) {
                (Some(i), Some(previous)) => self.user[i] = previous,
                _ => {
                    self.user.pop();
                }
            }
            return Err(e);
        }

        info!("Template saved: {} ({})", template.name, template.id);
        Ok(template)
    }

    /// Remove a user template; returns whether it existed
    pub fn delete_user_template(&mut self, id: &str) -> Result<bool> {
        self.ensure_not_system(id)?;

        let Some(position) = self.user.iter().position(|t| t.id == id) else {
            return Ok(false);
        };

        let removed = self.user.remove(position);
        if let Err(e) = self.flush() {
            self.user.insert(position, removed);
            return Err(e);
        }

        info!("Template deleted: {}", id);
        Ok(true)
    }

    fn ensure_not_system(&self, key: &str) -> Result<()> {
        let key = key.trim();
        let clashes = self
            .system
            .iter()
            .any(|t| t.id == key || t.name.eq_ignore_ascii_case(key));
        if clashes {
            return Err(DocsumError::invalid_input(format!(
                "'{}' is a built-in template and cannot be modified",
                key
            )));
        }
        Ok(())
    }

    fn next_id(&self, millis: i64) -> String {
        let mut millis = millis;
        loop {
            let id = format!("prompt-{}", millis);
            if !self.user.iter().any(|t| t.id == id) {
                return id;
            }
            millis += 1;
        }
    }

    fn flush(&self) -> Result<()> {
        write_records(&self.file_path, &self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(name: &str) -> TemplateDraft {
        TemplateDraft {
            name: name.to_string(),
            description: "Legal style".to_string(),
            template: "Summarize for a {{audience}} audience.".to_string(),
            ..Default::default()
        }
    }

    fn store(dir: &TempDir) -> TemplateStore {
        TemplateStore::load(&dir.path().join("prompt_templates.json")).unwrap()
    }

    #[test]
    fn test_list_templates_system_first() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.save_user_template(draft("Legal brief")).unwrap();

        let all = store.list_templates();
        let system_count = system_templates().len();
        assert_eq!(all.len(), system_count + 1);
        assert!(all[..system_count].iter().all(|t| t.is_system_template));
        assert_eq!(all[system_count].name, "Legal brief");
        assert_eq!(store.user_templates().len(), 1);
    }

    #[test]
    fn test_create_assigns_prompt_id_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let first = store.save_user_template(draft("One")).unwrap();
        let second = store.save_user_template(draft("Two")).unwrap();
        assert!(first.id.starts_with("prompt-"));
        assert_ne!(first.id, second.id);
        assert!(!first.is_system_template);
        assert!(first.created_at.is_some());

        let reloaded = TemplateStore::load(&dir.path().join("prompt_templates.json")).unwrap();
        assert_eq!(reloaded.user_templates(), store.user_templates());
        assert!(reloaded.registry().get(&first.id).is_some());
    }

    #[test]
    fn test_update_preserves_created_at() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let created = store.save_user_template(draft("Memo")).unwrap();

        let updated = store
            .save_user_template(TemplateDraft {
                id: Some(created.id.clone()),
                template: "Summarize as a memo.".to_string(),
                ..draft("Memo v2")
            })
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, "Memo v2");
        assert_eq!(store.user_templates().len(), 1);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let err = store
            .save_user_template(TemplateDraft {
                id: Some("prompt-1".to_string()),
                ..draft("Ghost")
            })
            .unwrap_err();
        assert!(matches!(err, DocsumError::NotFound(_)));
    }

    #[test]
    fn test_system_templates_are_immutable() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let by_id = store
            .save_user_template(TemplateDraft {
                id: Some("bullet_points".to_string()),
                ..draft("Mine")
            })
            .unwrap_err();
        assert!(matches!(by_id, DocsumError::InvalidInput(_)));

        let system_name = system_templates()[0].name.clone();
        let by_name = store.save_user_template(draft(&system_name)).unwrap_err();
        assert!(matches!(by_name, DocsumError::InvalidInput(_)));

        assert!(store.delete_user_template("financial").is_err());
        assert!(store.user_templates().is_empty());
    }

    #[test]
    fn test_delete_user_template() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let created = store.save_user_template(draft("Temp")).unwrap();

        assert!(store.delete_user_template(&created.id).unwrap());
        assert!(!store.delete_user_template(&created.id).unwrap());
        assert!(store.user_templates().is_empty());
    }

    #[test]
    fn test_rejects_blank_fields() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        assert!(store.save_user_template(draft("  ")).is_err());
        assert!(store
            .save_user_template(TemplateDraft {
                template: String::new(),
                ..draft("Empty")
            })
            .is_err());
    }

    #[test]
    fn test_stored_system_ids_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompt_templates.json");
        let mut shadow = system_templates()[1].clone();
        shadow.template = "shadowed".to_string();
        shadow.is_system_template = false;
        std::fs::write(&path, serde_json::to_string(&vec![shadow]).unwrap()).unwrap();

        let store = TemplateStore::load(&path).unwrap();
        assert!(store.user_templates().is_empty());
    }
}
