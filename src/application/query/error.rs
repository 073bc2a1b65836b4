use std::fmt::Write as _;

use thiserror::Error;

/// One offending query parameter, rendered as `key=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterProblem {
    /// Key does not split into a known column and a known suffix.
    UnrecognizedParameter(String),
    /// No literal candidate decoded for the operator's cardinality.
    UnparseableValue(String),
    /// `limit` or `offset` is not a non-negative integer.
    LimitOffsetParseError(String),
}

impl FilterProblem {
    pub fn parameter(&self) -> &str {
        match self {
            FilterProblem::UnrecognizedParameter(param)
            | FilterProblem::UnparseableValue(param)
            | FilterProblem::LimitOffsetParseError(param) => param,
        }
    }
}

/// Every problem found in a request, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.problems))]
pub struct FilterError {
    problems: Vec<FilterProblem>,
}

impl FilterError {
    /// Returns `None` when there is nothing to report.
    pub fn from_problems(problems: Vec<FilterProblem>) -> Option<Self> {
        (!problems.is_empty()).then_some(Self { problems })
    }

    pub fn problems(&self) -> &[FilterProblem] {
        &self.problems
    }

    pub fn contains(&self, problem: &FilterProblem) -> bool {
        self.problems.contains(problem)
    }
}

const GROUP_LABELS: [&str; 3] = [
    "unrecognized params",
    "unparseable params",
    "invalid paging params",
];

fn group(problem: &FilterProblem) -> usize {
    match problem {
        FilterProblem::UnrecognizedParameter(_) => 0,
        FilterProblem::UnparseableValue(_) => 1,
        FilterProblem::LimitOffsetParseError(_) => 2,
    }
}

fn summarize(problems: &[FilterProblem]) -> String {
    let mut summary = String::new();
    for (index, label) in GROUP_LABELS.iter().enumerate() {
        let params: Vec<&str> = problems
            .iter()
            .filter(|problem| group(problem) == index)
            .map(FilterProblem::parameter)
            .collect();
        if params.is_empty() {
            continue;
        }
        if !summary.is_empty() {
            summary.push_str("; ");
        }
        let _ = write!(summary, "{label} {}", params.join(", "));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_problem_list_is_not_an_error() {
        assert!(FilterError::from_problems(Vec::new()).is_none());
    }

    #[test]
    fn message_groups_problems_by_kind() {
        let error = FilterError::from_problems(vec![
            FilterProblem::UnparseableValue("age__gte=a\"b".to_string()),
            FilterProblem::UnrecognizedParameter("bogus__eq=x".to_string()),
            FilterProblem::UnrecognizedParameter("name__between=1".to_string()),
            FilterProblem::LimitOffsetParseError("limit=ten".to_string()),
        ])
        .expect("problems present");

        assert_eq!(
            error.to_string(),
            "unrecognized params bogus__eq=x, name__between=1; \
             unparseable params age__gte=a\"b; \
             invalid paging params limit=ten"
        );
        assert_eq!(error.problems().len(), 4);
    }
}
