//! Symbol filtering for include/exclude glob patterns
//!
//! Extracted symbol names are mangled, while callers write qualified-name
//! globs such as `ns::Foo::*`. Matching is approximate: a glob is split on
//! `::`, wildcard components are dropped, and every remaining component must
//! appear somewhere in the symbol name. Substring coincidences can over-match
//! and mangling differences can under-match; existing gates depend on this
//! behavior, so it is not tightened to structured matching.

/// Namespace separator used to split qualified-name globs
pub const NAMESPACE_SEPARATOR: &str = "::";

/// A qualified-name glob reduced to its non-wildcard components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPattern {
    components: Vec<String>,
}

impl FilterPattern {
    /// Build a pattern from a glob like `ns::Foo::*`
    pub fn parse(glob: &str) -> Self {
        let components = glob
            .split(NAMESPACE_SEPARATOR)
            .filter(|part| !is_wildcard(part))
            .map(str::to_string)
            .collect();

        Self { components }
    }

    /// Non-wildcard components, in source order
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// True when every component is a substring of `name`
    ///
    /// A pattern with zero components matches everything.
    pub fn matches(&self, name: &str) -> bool {
        self.components
            .iter()
            .all(|component| name.contains(component.as_str()))
    }
}

/// `*`, `**` and the empty string carry no constraint
fn is_wildcard(part: &str) -> bool {
    part.chars().all(|c| c == '*')
}

/// A set of patterns; a name matches the set if it matches any pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    patterns: Vec<FilterPattern>,
}

impl FilterSet {
    pub fn new<I, S>(globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: globs
                .into_iter()
                .map(|glob| FilterPattern::parse(glob.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if at least one pattern matches `name`
    pub fn any_match(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
    }
}

/// Include/exclude decision for a single symbol name
#[derive(Debug, Clone, Default)]
pub struct SymbolFilter {
    include: FilterSet,
    exclude: FilterSet,
}

impl SymbolFilter {
    pub fn new(include: FilterSet, exclude: FilterSet) -> Self {
        Self { include, exclude }
    }

    /// Build a filter straight from glob strings
    pub fn from_globs<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Self {
        Self::new(FilterSet::new(includes), FilterSet::new(excludes))
    }

    /// An empty include set includes everything
    pub fn is_included(&self, name: &str) -> bool {
        self.include.is_empty() || self.include.any_match(name)
    }

    /// An empty exclude set excludes nothing
    pub fn is_excluded(&self, name: &str) -> bool {
        !self.exclude.is_empty() && self.exclude.any_match(name)
    }

    /// Included and not excluded; exclusion wins when both match
    pub fn should_include(&self, name: &str) -> bool {
        self.is_included(name) && !self.is_excluded(name)
    }
}
