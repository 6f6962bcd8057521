use serde::{Deserialize, Serialize};

/// Entity type the platform reports for tasks in a selection.
pub const TASK_ENTITY_TYPE: &str = "task";

/// One entry of the host UI selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub entity_id: Option<String>,
}

impl SelectionEntry {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: Some(entity_id.into()),
        }
    }

    /// The entity id, treating an empty string the same as a missing one.
    pub fn id(&self) -> Option<&str> {
        self.entity_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Ordered selection produced by the host UI.
pub type Selection = Vec<SelectionEntry>;

/// Return the single selected entity when the selection holds exactly one
/// entry of `entity_type`.
pub fn single_entity<'a>(
    selection: &'a [SelectionEntry],
    entity_type: &str,
) -> Option<&'a SelectionEntry> {
    match selection {
        [only] if only.entity_type == entity_type => Some(only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_entry_wire_names() {
        let entry: SelectionEntry =
            serde_json::from_str(r#"{"entityType":"task","entityId":"42"}"#).unwrap();
        assert_eq!(entry.entity_type, "task");
        assert_eq!(entry.id(), Some("42"));

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["entityType"], "task");
        assert_eq!(json["entityId"], "42");
    }

    #[test]
    fn test_selection_entry_missing_fields() {
        let entry: SelectionEntry = serde_json::from_str("{}").unwrap();
        assert_eq!(entry.entity_type, "");
        assert_eq!(entry.id(), None);
    }

    #[test]
    fn test_empty_entity_id_is_missing() {
        let entry = SelectionEntry::new("task", "");
        assert_eq!(entry.id(), None);
    }

    #[test]
    fn test_single_entity() {
        let one = vec![SelectionEntry::new("task", "42")];
        assert_eq!(
            single_entity(&one, TASK_ENTITY_TYPE).and_then(|e| e.id()),
            Some("42")
        );

        let wrong_type = vec![SelectionEntry::new("shot", "42")];
        assert!(single_entity(&wrong_type, TASK_ENTITY_TYPE).is_none());

        let two = vec![SelectionEntry::new("task", "1"), SelectionEntry::new("task", "2")];
        assert!(single_entity(&two, TASK_ENTITY_TYPE).is_none());

        assert!(single_entity(&[], TASK_ENTITY_TYPE).is_none());
    }
}
