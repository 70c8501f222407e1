use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Course;
use crate::db::types::{ContentStatus, CourseContentType};
use crate::schemas::course_record::CourseRecordResponse;
use crate::schemas::{double_option, format_primitive};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) cover_image: Option<String>,
    #[serde(default = "default_content_type")]
    pub(crate) content_type: CourseContentType,
    #[serde(default)]
    pub(crate) video_url: Option<String>,
    #[serde(default)]
    pub(crate) text_content: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "duration must be non-negative"))]
    pub(crate) duration: i32,
    #[serde(default)]
    pub(crate) sort_order: i32,
}

fn default_content_type() -> CourseContentType {
    CourseContentType::Video
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) cover_image: Option<Option<String>>,
    #[serde(default)]
    pub(crate) content_type: Option<CourseContentType>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) video_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) text_content: Option<Option<String>>,
    #[serde(default)]
    #[validate(range(min = 0, message = "duration must be non-negative"))]
    pub(crate) duration: Option<i32>,
    #[serde(default)]
    pub(crate) sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseListQuery {
    pub(crate) page: Option<i64>,
    pub(crate) page_size: Option<i64>,
    pub(crate) keyword: Option<String>,
    pub(crate) status: Option<ContentStatus>,
    pub(crate) content_type: Option<CourseContentType>,
}

/// A video course needs a video reference and a text course needs text.
pub(crate) fn content_matches_type(
    content_type: CourseContentType,
    video_url: Option<&str>,
    text_content: Option<&str>,
) -> Result<(), &'static str> {
    let present = |value: Option<&str>| value.is_some_and(|value| !value.trim().is_empty());
    match content_type {
        CourseContentType::Video if !present(video_url) => {
            Err("video_url is required for video courses")
        }
        CourseContentType::Text if !present(text_content) => {
            Err("text_content is required for text courses")
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) cover_image: Option<String>,
    pub(crate) content_type: CourseContentType,
    pub(crate) video_url: Option<String>,
    pub(crate) text_content: Option<String>,
    pub(crate) duration: i32,
    pub(crate) status: ContentStatus,
    pub(crate) sort_order: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            cover_image: course.cover_image,
            content_type: course.content_type,
            video_url: course.video_url,
            text_content: course.text_content,
            duration: course.duration,
            status: course.status,
            sort_order: course.sort_order,
            created_by: course.created_by,
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

/// A published course as seen by a learner, with their own progress.
#[derive(Debug, Serialize)]
pub(crate) struct LearnCourseResponse {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) record: Option<CourseRecordResponse>,
}
