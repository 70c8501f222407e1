pub(crate) mod auth;
pub(crate) mod exam_workflow;
pub(crate) mod grading;
pub(crate) mod import_export;
pub(crate) mod permissions;
pub(crate) mod progress;
pub(crate) mod storage;
