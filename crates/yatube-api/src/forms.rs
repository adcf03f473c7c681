//! Form validation. Invalid submissions are answered here and never reach the feed core.

use yatube_db::Database;
use yatube_feed::PostDraft;
use yatube_types::api::{CommentForm, PostForm, ValidationErrors};

use crate::error::ApiError;

const REQUIRED: &str = "This field is required.";
const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

pub fn validate_post_form(db: &Database, form: PostForm) -> Result<PostDraft, ApiError> {
    let mut errors = ValidationErrors::default();

    let text = form.text.trim();
    if text.is_empty() {
        errors.add("text", REQUIRED);
    }

    let group_id = match form.group.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) if db.get_group(id)?.is_some() => Some(id),
            _ => {
                errors.add("group", INVALID_GROUP);
                None
            }
        },
    };

    let image = form
        .image
        .map(|image| image.trim().to_string())
        .filter(|image| !image.is_empty());

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok(PostDraft {
        text: text.to_string(),
        group_id,
        image,
    })
}

pub fn validate_comment_form(form: CommentForm) -> Result<String, ApiError> {
    let text = form.text.trim();
    if text.is_empty() {
        let mut errors = ValidationErrors::default();
        errors.add("text", REQUIRED);
        return Err(ApiError::Validation(errors));
    }
    Ok(text.to_string())
}
