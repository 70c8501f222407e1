mod attempts;
mod create;
mod list;
mod manage;

pub(super) use attempts::{list_exam_records, start_exam};
pub(super) use create::create_exam;
pub(super) use list::{get_exam, list_exams};
pub(super) use manage::{delete_exam, update_exam};
