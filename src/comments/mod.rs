//! Comment submission
//!
//! A [`CommentForm`] walks through `Editing` → `Submitting` → `Submitted`.
//! Validation failures and transport failures both return the form to
//! `Editing` with the user's values kept, the former with one message per
//! missing field and the latter with an explicit failure message.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::content::NewComment;
use crate::store::{ContentStore, StoreError};

/// Message shown when the creation request fails
pub const SUBMIT_FAILED_MESSAGE: &str =
    "Your comment could not be submitted. Please try again in a moment.";

/// Required fields in display order
const REQUIRED_FIELDS: [&str; 3] = ["name", "email", "comment"];

/// Raw form values as submitted by the reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CommentInput {
    /// Post id from the hidden field
    #[serde(rename = "_id", default)]
    pub post_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "The Name Field is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "The Email Field is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "The Comment Field is required"))]
    pub comment: String,
}

impl CommentInput {
    /// Trim surrounding whitespace so blank fields count as missing
    pub fn normalized(&self) -> Self {
        Self {
            post_id: self.post_id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            comment: self.comment.trim().to_string(),
        }
    }

    /// Messages for every missing required field, in field order
    pub fn missing_field_messages(&self) -> Vec<String> {
        let errors = match self.validate() {
            Ok(()) => return Vec::new(),
            Err(errors) => errors,
        };
        let by_field = errors.field_errors();

        REQUIRED_FIELDS
            .iter()
            .filter_map(|field| by_field.get(*field))
            .flat_map(|errs| errs.iter())
            .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .collect()
    }
}

/// Where the form currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// Accepting input; may carry validation errors or a failure message
    Editing {
        values: CommentInput,
        errors: Vec<String>,
        failure: Option<String>,
    },
    /// Creation request in flight
    Submitting { comment: NewComment },
    /// Accepted for moderation; the form is replaced by a thank-you panel
    Submitted,
}

/// Comment form bound to one post
#[derive(Debug, Clone)]
pub struct CommentForm {
    post_id: String,
    state: FormState,
}

impl CommentForm {
    /// Fresh form for a post
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            state: FormState::Editing {
                values: CommentInput::default(),
                errors: Vec::new(),
                failure: None,
            },
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, FormState::Submitted)
    }

    /// Validate input and move to `Submitting`
    ///
    /// Returns the creation payload when the request should be sent. While a
    /// request is in flight or after success, further submits are ignored.
    pub fn submit(&mut self, input: &CommentInput) -> Option<NewComment> {
        if !matches!(self.state, FormState::Editing { .. }) {
            tracing::debug!("Ignoring submit while form is {:?}", self.state);
            return None;
        }

        let values = input.normalized();
        let errors = values.missing_field_messages();
        if !errors.is_empty() {
            self.state = FormState::Editing {
                values,
                errors,
                failure: None,
            };
            return None;
        }

        let comment = NewComment {
            post_id: self.post_id.clone(),
            name: values.name,
            email: values.email,
            comment: values.comment,
        };
        self.state = FormState::Submitting {
            comment: comment.clone(),
        };
        Some(comment)
    }

    /// Apply the outcome of the creation request
    pub fn resolve(&mut self, outcome: Result<(), StoreError>) {
        let comment = match &self.state {
            FormState::Submitting { comment } => comment.clone(),
            _ => return,
        };

        self.state = match outcome {
            Ok(()) => FormState::Submitted,
            Err(e) => {
                tracing::error!("Failed to submit comment on post {}: {}", self.post_id, e);
                FormState::Editing {
                    values: CommentInput {
                        post_id: comment.post_id,
                        name: comment.name,
                        email: comment.email,
                        comment: comment.comment,
                    },
                    errors: Vec::new(),
                    failure: Some(SUBMIT_FAILED_MESSAGE.to_string()),
                }
            }
        };
    }

    /// Run a full submit cycle against a store
    pub async fn send(&mut self, store: &dyn ContentStore, input: &CommentInput) -> &FormState {
        if let Some(comment) = self.submit(input) {
            let outcome = store.create_comment(&comment).await;
            self.resolve(outcome);
        }
        &self.state
    }
}
