//! Minimal field-substitution templates.
//!
//! Syntax is a strict subset of Go's `text/template`: literal text interleaved with
//! actions of the form `{{ .Field }}` or `{{ .Map.key }}`. There are no pipelines,
//! conditionals or functions; anything other than a dotted field path is rejected
//! at parse time, and an unknown path is rejected at render time.
use std::borrow::Cow;

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Source of values for template fields.
pub trait TemplateScope {
    /// Resolve a dotted path (without the leading dot), e.g. `["BenchArgs", "cpu"]`.
    ///
    /// Returns `None` when the path is not defined.
    fn lookup(&self, path: &[&str]) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Vec<String>),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template source.
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = src;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open
                .find(CLOSE)
                .ok_or(TemplateError::Unterminated(offset + start))?;

            segments.push(Segment::Field(parse_path(&after_open[..end])?));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Ok(Self { segments })
    }

    #[cfg(test)]
    fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Text(_)))
    }

    /// Substitute every action from `scope`.
    pub fn render(&self, scope: &dyn TemplateScope) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(path) => {
                    let parts: Vec<&str> = path.iter().map(String::as_str).collect();
                    let value = scope
                        .lookup(&parts)
                        .ok_or_else(|| TemplateError::UndefinedField(format!(".{}", path.join("."))))?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

fn parse_path(expr: &str) -> Result<Vec<String>, TemplateError> {
    let trimmed = expr.trim();
    let bad = || TemplateError::BadExpression(trimmed.to_string());

    let body = trimmed.strip_prefix('.').ok_or_else(bad)?;
    let parts: Vec<String> = body.split('.').map(str::to_string).collect();

    let valid = parts.iter().all(|p| {
        !p.is_empty()
            && p.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    });
    if !valid {
        return Err(bad());
    }
    Ok(parts)
}
