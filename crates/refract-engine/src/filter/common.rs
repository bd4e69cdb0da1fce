//! Pieces shared by the concrete filters

use std::fmt;

use refract_sdk::{Member, TraitState, TypeHandle, VisibilityMask};
use regex::Regex;

use crate::error::{ReflectError, ReflectResult};

#[derive(Debug, Clone)]
enum Matcher {
    Any,
    Exact(String),
    Regex(Regex),
}

/// Member name pattern with full-string match semantics
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Matcher,
}

impl NamePattern {
    /// Compile `pattern`, anchored at both ends
    pub fn compile(pattern: &str) -> ReflectResult<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            ReflectError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            matcher: Matcher::Regex(regex),
        })
    }

    /// Pattern matching exactly `name`
    pub fn exact(name: &str) -> Self {
        Self {
            source: name.to_string(),
            matcher: Matcher::Exact(name.to_string()),
        }
    }

    /// Pattern matching every name
    pub fn any() -> Self {
        Self {
            source: ".*".to_string(),
            matcher: Matcher::Any,
        }
    }

    /// Whether the whole of `name` matches
    pub fn is_match(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Exact(exact) => exact == name,
            Matcher::Regex(regex) => regex.is_match(name),
        }
    }

    /// Pattern source as written
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for NamePattern {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Required and forbidden annotations
#[derive(Debug, Clone, Default)]
pub(crate) struct AnnotationRule {
    required: Vec<TypeHandle>,
    forbidden: Vec<TypeHandle>,
}

impl AnnotationRule {
    pub(crate) fn require(&mut self, annotation: TypeHandle) {
        self.required.push(annotation);
    }

    pub(crate) fn forbid(&mut self, annotation: TypeHandle) {
        self.forbidden.push(annotation);
    }

    pub(crate) fn admits<M: Member>(&self, member: &M) -> bool {
        self.required.iter().all(|a| member.has_annotation(a))
            && !self.forbidden.iter().any(|a| member.has_annotation(a))
    }
}

/// Visibility list followed by a space, e.g. `public/private `
pub(crate) fn push_visibility(out: &mut String, mask: VisibilityMask) {
    out.push_str(&mask.to_string());
    out.push(' ');
}

/// Trait word followed by a space, nothing for `Either`
pub(crate) fn push_trait(out: &mut String, state: TraitState, word: &str) {
    if let Some(text) = state.describe(word) {
        out.push_str(&text);
        out.push(' ');
    }
}

/// Simple type name followed by a space, nothing when unset
pub(crate) fn push_type(out: &mut String, ty: Option<&TypeHandle>) {
    if let Some(ty) = ty {
        out.push_str(ty.simple_name());
        out.push(' ');
    }
}

/// `(A,B)` for an exact list, `(...)` when unconstrained
pub(crate) fn push_params(out: &mut String, params: Option<&[TypeHandle]>) {
    match params {
        Some(params) => {
            let names: Vec<&str> = params.iter().map(|p| p.simple_name()).collect();
            out.push('(');
            out.push_str(&names.join(","));
            out.push(')');
        }
        None => out.push_str("(...)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = NamePattern::compile("get.*").unwrap();
        assert!(pattern.is_match("getName"));
        assert!(!pattern.is_match("forget"));
        assert!(!pattern.is_match("xgetName"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_group() {
        let pattern = NamePattern::compile("a|b").unwrap();
        assert!(pattern.is_match("a"));
        assert!(pattern.is_match("b"));
        assert!(!pattern.is_match("ab"));
    }

    #[test]
    fn test_exact_is_literal() {
        let pattern = NamePattern::exact("a.b");
        assert!(pattern.is_match("a.b"));
        assert!(!pattern.is_match("axb"));
        assert_eq!(pattern.to_string(), "a.b");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = NamePattern::compile("(unclosed").unwrap_err();
        assert!(matches!(err, ReflectError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_param_description() {
        let mut out = String::new();
        let params = [refract_sdk::builtin::string(), refract_sdk::builtin::object()];
        push_params(&mut out, Some(&params[..]));
        assert_eq!(out, "(String,Object)");
        out.clear();
        push_params(&mut out, None);
        assert_eq!(out, "(...)");
    }
}
