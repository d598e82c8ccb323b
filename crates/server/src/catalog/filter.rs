use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::resource::{Resource, ResourceId, ResourceType};

/// Browse filters. An empty field means "no filter".
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub search: String,
    pub year: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub course: String,
}

impl FilterCriteria {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.year.is_empty()
            && self.resource_type.is_empty()
            && self.course.is_empty()
    }

    pub fn matcher(&self) -> ResourceMatcher<'_> {
        ResourceMatcher {
            needle: (!self.search.is_empty()).then(|| self.search.to_lowercase()),
            criteria: self,
        }
    }
}

pub struct ResourceMatcher<'a> {
    needle: Option<String>,
    criteria: &'a FilterCriteria,
}

impl ResourceMatcher<'_> {
    pub fn matches(&self, resource: &Resource) -> bool {
        self.matches_search(resource)
            && (self.criteria.year.is_empty() || resource.year.to_string() == self.criteria.year)
            && (self.criteria.resource_type.is_empty()
                || resource.resource_type.as_str() == self.criteria.resource_type)
            && (self.criteria.course.is_empty() || resource.course == self.criteria.course)
    }

    fn matches_search(&self, resource: &Resource) -> bool {
        let Some(needle) = self.needle.as_deref() else {
            return true;
        };
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);
        contains(resource.name.as_str())
            || contains(resource.description.as_str())
            || resource.keywords.iter().any(|k| contains(k.as_str()))
    }
}

/// Filter options offered to the user, always derived from the full
/// collection so one selection never hides the others' options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub available_years: Vec<i32>,
    pub available_types: Vec<ResourceType>,
    pub available_courses: Vec<String>,
}

impl Facets {
    pub fn from_resources(resources: &[Resource]) -> Self {
        let years: BTreeSet<i32> = resources.iter().map(|r| r.year).collect();
        let types: BTreeSet<&'static str> =
            resources.iter().map(|r| r.resource_type.as_str()).collect();
        let courses: BTreeSet<&str> = resources.iter().map(|r| r.course.as_str()).collect();
        Self {
            available_years: years.into_iter().rev().collect(),
            available_types: types
                .into_iter()
                .filter_map(|t| t.parse().ok())
                .collect(),
            available_courses: courses.into_iter().map(ToString::to_string).collect(),
        }
    }
}

/// Visible subset in input order.
pub fn filter_resources(resources: &[Resource], criteria: &FilterCriteria) -> Vec<Resource> {
    if criteria.is_empty() {
        return resources.to_vec();
    }
    let matcher = criteria.matcher();
    resources
        .iter()
        .filter(|r| matcher.matches(r))
        .cloned()
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogView {
    pub resources: Vec<Resource>,
    #[serde(flatten)]
    pub facets: Facets,
    pub total: usize,
    /// Visible resources whose deletion is still running.
    pub deleting: Vec<ResourceId>,
}

impl CatalogView {
    pub fn build(resources: &[Resource], criteria: &FilterCriteria) -> Self {
        Self {
            resources: filter_resources(resources, criteria),
            facets: Facets::from_resources(resources),
            total: resources.len(),
            deleting: Vec::new(),
        }
    }
}
