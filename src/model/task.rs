use serde::de::{self, Deserializer, Visitor};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use super::error::ModelError;

/// Store assigned task identifier. Never zero, never reused.
pub type TaskId = u64;

/// Task is one entry of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
}

impl Task {
    pub fn new(id: TaskId, title: String, completed: bool) -> Self {
        Self {
            id,
            title,
            completed,
        }
    }
}

/// Payload of a create request. `completed` defaults to false.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl NewTask {
    pub fn validate(self) -> Result<Self, ModelError> {
        validate_title(&self.title)?;
        Ok(self)
    }
}

/// Payload of an update request. Title and completed are replaced wholesale,
/// so both are required; the id may come from the path instead of the body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, deserialize_with = "deserialize_task_id")]
    pub id: Option<TaskId>,
    pub title: String,
    pub completed: bool,
}

impl TaskUpdate {
    pub fn validate(self) -> Result<Self, ModelError> {
        validate_title(&self.title)?;
        Ok(self)
    }
}

fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::EmptyTitle);
    }
    Ok(())
}

/// Parses an id coming from a path segment, a query parameter or a JSON string.
pub fn parse_task_id(input: &str) -> Result<TaskId, ModelError> {
    let digits_only = !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit());
    match input.parse::<TaskId>() {
        Ok(id) if digits_only && id > 0 => Ok(id),
        _ => Err(ModelError::InvalidId(input.to_string())),
    }
}

// Ids were strings in one flavour of the API and integers in the other,
// both are accepted on input.
fn deserialize_task_id<'de, D>(deserializer: D) -> Result<Option<TaskId>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TaskIdVisitor;

    impl<'de> Visitor<'de> for TaskIdVisitor {
        type Value = Option<TaskId>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a positive integer or a string holding one")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            if v == 0 {
                return Err(E::custom(ModelError::InvalidId(v.to_string())));
            }
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            match u64::try_from(v) {
                Ok(id) => self.visit_u64(id),
                Err(_) => Err(E::custom(ModelError::InvalidId(v.to_string()))),
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_task_id(v).map(Some).map_err(E::custom)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(TaskIdVisitor)
        }
    }

    deserializer.deserialize_option(TaskIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task: NewTask = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed, "completed defaults to false");

        // client supplied ids are ignored on create
        let task: NewTask =
            serde_json::from_str(r#"{"id":"7","title":"Buy milk","completed":true}"#).unwrap();
        assert!(task.completed);
    }

    #[test]
    fn test_title_validation() {
        let empty = NewTask {
            title: "".to_string(),
            completed: false,
        };
        assert_eq!(empty.validate().unwrap_err(), ModelError::EmptyTitle);

        let blank = TaskUpdate {
            id: None,
            title: "   ".to_string(),
            completed: true,
        };
        assert_eq!(blank.validate().unwrap_err(), ModelError::EmptyTitle);

        let ok = NewTask {
            title: "Walk the dog".to_string(),
            completed: false,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_update_id_forms() {
        let numeric: TaskUpdate =
            serde_json::from_str(r#"{"id":3,"title":"a","completed":true}"#).unwrap();
        assert_eq!(numeric.id, Some(3));

        let string: TaskUpdate =
            serde_json::from_str(r#"{"id":"3","title":"a","completed":true}"#).unwrap();
        assert_eq!(string.id, Some(3));

        let missing: TaskUpdate =
            serde_json::from_str(r#"{"title":"a","completed":false}"#).unwrap();
        assert_eq!(missing.id, None);

        let null: TaskUpdate =
            serde_json::from_str(r#"{"id":null,"title":"a","completed":false}"#).unwrap();
        assert_eq!(null.id, None);

        assert!(serde_json::from_str::<TaskUpdate>(r#"{"id":"abc","title":"a","completed":false}"#).is_err());
        assert!(serde_json::from_str::<TaskUpdate>(r#"{"id":-1,"title":"a","completed":false}"#).is_err());
        assert!(serde_json::from_str::<TaskUpdate>(r#"{"id":0,"title":"a","completed":false}"#).is_err());
        assert!(serde_json::from_str::<TaskUpdate>(r#"{"id":"+3","title":"a","completed":false}"#).is_err());
        // replacement is wholesale
        assert!(serde_json::from_str::<TaskUpdate>(r#"{"id":1,"title":"a"}"#).is_err());
    }

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("42").unwrap(), 42);
        assert_eq!(
            parse_task_id("0").unwrap_err(),
            ModelError::InvalidId("0".to_string())
        );
        assert!(parse_task_id("").is_err());
        assert!(parse_task_id("1.5").is_err());
        assert!(parse_task_id("-4").is_err());
        assert!(parse_task_id("99999999999999999999999").is_err());
        assert!(parse_task_id("+1").is_err());
        assert!(parse_task_id(" 1").is_err());
        assert!(parse_task_id("1 ").is_err());
        assert_eq!(parse_task_id("007").unwrap(), 7);
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task::new(1, "Buy milk".to_string(), false);
        assert_eq!(
            serde_json::to_string(&task).unwrap(),
            r#"{"id":1,"title":"Buy milk","completed":false}"#
        );
    }
}
