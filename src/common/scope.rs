use std::fmt;

use serde::{Deserialize, Serialize};

/// Which footage a search runs against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "job_id", rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    AllFootage,
    SingleJob(String),
}

impl SearchScope {
    /// Builds a scope from a user-typed job id. Blank input selects the whole corpus.
    pub fn from_job_input(job_id: &str) -> Self {
        match job_id.trim() {
            "" => SearchScope::AllFootage,
            id => SearchScope::SingleJob(id.to_string()),
        }
    }

    /// The job id to send as a search filter, if any.
    ///
    /// A `SingleJob` whose id is blank is treated exactly like `AllFootage`.
    pub fn job_filter(&self) -> Option<&str> {
        match self {
            SearchScope::AllFootage => None,
            SearchScope::SingleJob(id) => {
                let id = id.trim();
                (!id.is_empty()).then_some(id)
            }
        }
    }

    pub fn is_all_footage(&self) -> bool {
        self.job_filter().is_none()
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.job_filter() {
            None => write!(f, "all videos in database"),
            Some(id) => write!(f, "video {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_single_job_has_no_filter() {
        assert_eq!(SearchScope::SingleJob(String::new()).job_filter(), None);
        assert_eq!(SearchScope::SingleJob("   ".to_string()).job_filter(), None);
        assert_eq!(SearchScope::AllFootage.job_filter(), None);
        assert!(SearchScope::SingleJob(" \t".to_string()).is_all_footage());
    }

    #[test]
    fn test_single_job_filter_is_trimmed() {
        let scope = SearchScope::SingleJob("  job-7 ".to_string());
        assert_eq!(scope.job_filter(), Some("job-7"));
    }

    #[test]
    fn test_from_job_input() {
        assert_eq!(SearchScope::from_job_input(""), SearchScope::AllFootage);
        assert_eq!(
            SearchScope::from_job_input(" abc "),
            SearchScope::SingleJob("abc".to_string())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(SearchScope::AllFootage.to_string(), "all videos in database");
        assert_eq!(
            SearchScope::SingleJob("j1".to_string()).to_string(),
            "video j1"
        );
    }
}
