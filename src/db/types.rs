use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "accountstatus", rename_all = "lowercase")]
pub(crate) enum AccountStatus {
    Active,
    Inactive,
    Banned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "rolestatus", rename_all = "lowercase")]
pub(crate) enum RoleStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "menukind", rename_all = "lowercase")]
pub(crate) enum MenuKind {
    Menu,
    Button,
}

/// Publication state shared by materials, courses, topics and exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "contentstatus", rename_all = "lowercase")]
pub(crate) enum ContentStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "materialtype", rename_all = "lowercase")]
pub(crate) enum MaterialType {
    Text,
    Video,
    File,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "coursecontenttype", rename_all = "lowercase")]
pub(crate) enum CourseContentType {
    Video,
    Text,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    SingleChoice,
    MultipleChoice,
    FillBlank,
}

impl QuestionType {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single_choice" => Some(Self::SingleChoice),
            "multiple_choice" => Some(Self::MultipleChoice),
            "fill_blank" => Some(Self::FillBlank),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "examrecordstatus", rename_all = "snake_case")]
pub(crate) enum ExamRecordStatus {
    InProgress,
    Submitted,
    Graded,
}

impl ExamRecordStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parse_is_case_insensitive() {
        assert_eq!(QuestionType::parse(" Single_Choice "), Some(QuestionType::SingleChoice));
        assert_eq!(QuestionType::parse("fill_blank"), Some(QuestionType::FillBlank));
        assert_eq!(QuestionType::parse("essay"), None);
    }

    #[test]
    fn enums_serialize_in_wire_case() {
        assert_eq!(serde_json::to_value(ExamRecordStatus::InProgress).unwrap(), "in_progress");
        assert_eq!(serde_json::to_value(QuestionType::MultipleChoice).unwrap(), "multiple_choice");
        assert_eq!(serde_json::to_value(AccountStatus::Banned).unwrap(), "banned");
    }
}
