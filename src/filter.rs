use crate::model::{Category, Issue};

/// Decides which fetched issues count towards the report.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    versions: Vec<String>,
    categories: Vec<Category>,
}

impl Filter {
    pub fn new(versions: Vec<String>, categories: Vec<Category>) -> Self {
        Self {
            versions,
            categories,
        }
    }

    pub fn is_relevant(&self, issue: &Issue) -> bool {
        !self.is_blocked_version(&issue.version)
            && !self
                .categories
                .iter()
                .any(|category| category.code() == issue.category)
    }

    /// `8.9.x-dev` is blocked by either `8.9.x-dev` or its major version `8`.
    fn is_blocked_version(&self, version: &str) -> bool {
        let major = version.split('.').next().unwrap_or(version);
        self.versions
            .iter()
            .any(|blocked| blocked == version || blocked == major)
    }

    pub fn apply(&self, issues: Vec<Issue>) -> Vec<Issue> {
        issues
            .into_iter()
            .filter(|issue| self.is_relevant(issue))
            .collect()
    }
}
