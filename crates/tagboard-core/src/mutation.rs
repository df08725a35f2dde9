//! Tag creation.
//!
//! [`CreateTagForm`] is the state behind the "create tag" dialog: the title
//! being typed, the slug derived from it, local validation, and the busy flag
//! that blocks double submission. The remote call itself happens between
//! [`CreateTagForm::begin_submit`] and [`CreateTagForm::finish`], wherever the
//! host chooses to run it. A successful create invalidates every cached page,
//! since the new tag's position under an arbitrary filter is unknown. A failed
//! one leaves the cache untouched.

use crate::error::{ApiError, CreateError, ValidationError};
use crate::model::{CreateTagRequest, Tag};
use crate::query::QueryCache;
use crate::slug::derive_slug;
use crate::source::TagSource;
use tracing::{info, warn};

pub const DEFAULT_MIN_TITLE_LEN: usize = 3;

/// Input of the one-shot create pathway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct CreateTagForm {
    title: String,
    min_title_len: usize,
    busy: bool,
    error: Option<CreateError>,
}

impl CreateTagForm {
    #[must_use]
    pub const fn new(min_title_len: usize) -> Self {
        Self {
            title: String::new(),
            min_title_len,
            busy: false,
            error: None,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the title. A field-level validation message is cleared as soon
    /// as the user edits the field.
    pub fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
        if matches!(self.error, Some(CreateError::Validation(_))) {
            self.error = None;
        }
    }

    pub fn push_char(&mut self, c: char) {
        let mut title = std::mem::take(&mut self.title);
        title.push(c);
        self.set_title(&title);
    }

    pub fn pop_char(&mut self) {
        let mut title = std::mem::take(&mut self.title);
        title.pop();
        self.set_title(&title);
    }

    /// Slug for the current title, recomputed on every call.
    #[must_use]
    pub fn slug(&self) -> String {
        derive_slug(&self.title)
    }

    /// Check local constraints and build the request body.
    pub fn validate(&self) -> Result<CreateTagRequest, ValidationError> {
        if self.title.trim().chars().count() < self.min_title_len {
            return Err(ValidationError::TitleTooShort {
                min: self.min_title_len,
            });
        }
        Ok(CreateTagRequest {
            title: self.title.clone(),
            slug: self.slug(),
            video_count: 0,
        })
    }

    /// Validate and mark the form busy. The caller must perform exactly one
    /// remote create with the returned request and pass its result to
    /// [`finish`](Self::finish).
    pub fn begin_submit(&mut self) -> Result<CreateTagRequest, CreateError> {
        if self.busy {
            return Err(CreateError::Busy);
        }
        match self.validate() {
            Ok(request) => {
                self.busy = true;
                self.error = None;
                Ok(request)
            }
            Err(err) => {
                self.error = Some(CreateError::Validation(err.clone()));
                Err(err.into())
            }
        }
    }

    /// Settle a submission started with [`begin_submit`](Self::begin_submit).
    pub fn finish(
        &mut self,
        result: Result<Tag, ApiError>,
        cache: &mut QueryCache,
    ) -> Result<Tag, CreateError> {
        self.busy = false;
        match result {
            Ok(tag) => {
                let invalidated = cache.invalidate_all();
                info!(id = %tag.id, title = %tag.title, invalidated, "tag created");
                self.error = None;
                Ok(tag)
            }
            Err(err) => {
                warn!(error = %err, "tag creation failed");
                let err = CreateError::Network(err);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Last error to display, validation or network.
    #[must_use]
    pub const fn error(&self) -> Option<&CreateError> {
        self.error.as_ref()
    }

    /// Message for the title field, if validation failed.
    #[must_use]
    pub const fn field_error(&self) -> Option<&ValidationError> {
        match &self.error {
            Some(CreateError::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

impl Default for CreateTagForm {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TITLE_LEN)
    }
}

/// Validate, perform exactly one remote create, and invalidate the cache on
/// success.
pub fn create_tag(
    source: &dyn TagSource,
    cache: &mut QueryCache,
    input: &NewTag,
    min_title_len: usize,
) -> Result<Tag, CreateError> {
    let mut form = CreateTagForm::new(min_title_len);
    form.set_title(&input.title);
    let request = form.begin_submit()?;
    let result = source.create_tag(&request);
    form.finish(result, cache)
}
