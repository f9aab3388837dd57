// src/render.rs
//! Feed document rendering.
//!
//! Two templates: one item fragment rendered per transformed record, and an
//! envelope with `{last_refresh}`, `{missing_nums}` and `{items}`.
//! Placeholders are `{name}`; `{{` and `}}` are literal braces. A placeholder
//! with no value is an error, never left in the output.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::options::OutputOptions;
use crate::error::TemplateError;
use crate::store::{EpisodeRecord, FetchFailure};

pub const LAST_REFRESH_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    body: String,
}

impl Template {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self { name: name.into(), body: body.into() }
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let body = fs::read_to_string(path).map_err(|e| TemplateError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::new(path.display().to_string(), body))
    }

    /// Substitute every `{name}` through `lookup`.
    pub fn fill<F>(&self, lookup: F) -> Result<String, TemplateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let src = self.body.as_str();
        let mut out = String::with_capacity(src.len());
        let mut rest = src;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let offset = src.len() - rest.len() + pos;
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('}') {
                return Err(self.unbalanced(offset));
            } else {
                let close = tail.find('}').ok_or_else(|| self.unbalanced(offset))?;
                let name = &tail[1..close];
                if name.contains('{') {
                    return Err(self.unbalanced(offset));
                }
                let value = lookup(name).ok_or_else(|| TemplateError::MissingField {
                    template: self.name.clone(),
                    name: s!(name),
                })?;
                out.push_str(&value);
                rest = &tail[close + 1..];
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    fn unbalanced(&self, offset: usize) -> TemplateError {
        TemplateError::Unbalanced { template: self.name.clone(), offset }
    }
}

pub struct Templates {
    pub item: Template,
    pub envelope: Template,
}

impl Templates {
    pub fn load(opts: &OutputOptions) -> Result<Self, TemplateError> {
        Ok(Self {
            item: Template::load(&opts.item_template_path())?,
            envelope: Template::load(&opts.feed_template_path())?,
        })
    }

    pub fn render(
        &self,
        records: &[EpisodeRecord],
        failures: &[FetchFailure],
        refreshed_at: DateTime<Utc>,
    ) -> Result<String, TemplateError> {
        let items = records
            .iter()
            .map(|r| self.item.fill(|name| r.field(name)))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n");

        let last_refresh = refreshed_at.format(LAST_REFRESH_FORMAT).to_string();
        let missing_nums = failures
            .iter()
            .map(|f| f.num.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        self.envelope.fill(|name| match name {
            "last_refresh" => Some(last_refresh.clone()),
            "missing_nums" => Some(missing_nums.clone()),
            "items" => Some(items.clone()),
            _ => None,
        })
    }
}
