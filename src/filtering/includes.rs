//! Include resolution.
//!
//! Expands dotted relation-include paths into an ordered, dependency-correct
//! load plan. Any multi-segment path schedules its parents first so the ORM
//! never loads a nested relation before the relation it hangs off. Paths that
//! exist purely for response shaping resolve to inert placeholder directives
//! that satisfy the "is this include known" check without issuing queries.

use crate::errors::{FilterViolation, QueryErrors, ViolationKind};
use crate::models::IncludeRequest;

/// Whether a directive actually eager-loads a relation or merely marks the
/// path as known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Eager,
    /// No-op include registered for response shaping only.
    Placeholder,
}

/// One entry of the resolved load plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDirective {
    pub path: String,
    pub kind: LoadKind,
}

/// Resolves requested include paths against an allow-list.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    allowed: Vec<String>,
    placeholders: Vec<String>,
    nesting: char,
}

impl Default for IncludeResolver {
    /// Empty allow-list; every requested include is rejected.
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl IncludeResolver {
    #[must_use]
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            placeholders: Vec::new(),
            nesting: '.',
        }
    }

    /// Paths registered as known but never eager-loaded.
    #[must_use]
    pub fn with_placeholders<I, S>(mut self, placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholders = placeholders.into_iter().map(Into::into).collect();
        self
    }

    /// Override the nesting separator (defaults to `.`).
    #[must_use]
    pub fn with_nesting(mut self, nesting: char) -> Self {
        self.nesting = nesting;
        self
    }

    fn is_known(&self, path: &str) -> bool {
        self.allowed.iter().any(|allowed| allowed == path)
            || self.placeholders.iter().any(|placeholder| placeholder == path)
    }

    fn kind_of(&self, path: &str) -> LoadKind {
        if self.placeholders.iter().any(|placeholder| placeholder == path) {
            LoadKind::Placeholder
        } else {
            LoadKind::Eager
        }
    }

    /// Resolve requests into an ordered load plan.
    ///
    /// # Errors
    ///
    /// Returns accumulated `include not allowed` violations for every
    /// requested path outside the allow-list.
    pub fn resolve(&self, requests: &[IncludeRequest]) -> Result<Vec<LoadDirective>, QueryErrors> {
        let mut errors = QueryErrors::default();
        let plan = self.resolve_into(requests, &mut errors);
        errors.finish(plan)
    }

    /// Like [`Self::resolve`] but feeding an existing collector.
    pub fn resolve_into(
        &self,
        requests: &[IncludeRequest],
        errors: &mut QueryErrors,
    ) -> Vec<LoadDirective> {
        let mut plan: Vec<LoadDirective> = Vec::new();
        for request in requests {
            if !self.is_known(&request.path) {
                errors.push(FilterViolation::new(
                    &request.path,
                    ViolationKind::UnknownInclude,
                    "include is not allowed",
                ));
                continue;
            }
            // Schedule every ancestor prefix ahead of the leaf; duplicates
            // collapse to the first occurrence.
            let mut prefix = String::new();
            for segment in request.path.split(self.nesting) {
                if !prefix.is_empty() {
                    prefix.push(self.nesting);
                }
                prefix.push_str(segment);
                if !plan.iter().any(|directive| directive.path == prefix) {
                    plan.push(LoadDirective {
                        path: prefix.clone(),
                        kind: self.kind_of(&prefix),
                    });
                }
            }
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests(paths: &[&str]) -> Vec<IncludeRequest> {
        paths.iter().copied().map(IncludeRequest::new).collect()
    }

    #[test]
    fn parent_is_scheduled_before_child() {
        let resolver = IncludeResolver::new(["customer", "customer.invoices"]);
        let plan = resolver.resolve(&requests(&["customer.invoices"])).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].path, "customer");
        assert_eq!(plan[1].path, "customer.invoices");
    }

    #[test]
    fn deep_chains_resolve_in_order() {
        let resolver = IncludeResolver::new(["a.b.c"]);
        let plan = resolver.resolve(&requests(&["a.b.c"])).unwrap();
        let paths: Vec<&str> = plan.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["a", "a.b", "a.b.c"]);
    }

    #[test]
    fn duplicates_collapse() {
        let resolver = IncludeResolver::new(["customer", "customer.invoices"]);
        let plan = resolver
            .resolve(&requests(&[
                "customer",
                "customer.invoices",
                "customer.invoices",
            ]))
            .unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn placeholder_paths_load_as_noops() {
        let resolver =
            IncludeResolver::new(["customer"]).with_placeholders(["customer.balance"]);
        let plan = resolver.resolve(&requests(&["customer.balance"])).unwrap();
        assert_eq!(plan[0].kind, LoadKind::Eager);
        assert_eq!(plan[1].kind, LoadKind::Placeholder);
    }

    #[test]
    fn unknown_include_is_rejected() {
        let resolver = IncludeResolver::new(["customer"]);
        let err = resolver.resolve(&requests(&["payments"])).unwrap_err();
        assert_eq!(err.violations()[0].kind, ViolationKind::UnknownInclude);
        assert_eq!(err.violations()[0].field, "payments");
    }

    #[test]
    fn all_unknown_paths_are_reported_together() {
        let resolver = IncludeResolver::new(["customer"]);
        let err = resolver
            .resolve(&requests(&["payments", "ledger", "customer"]))
            .unwrap_err();
        assert_eq!(err.len(), 2);
    }
}
