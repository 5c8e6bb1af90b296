use serde::{Deserialize, Serialize};

use crate::error::{CutoffError, Result};
use crate::sheet::{find_label, Sheet};

/// Header labels of the course catalog sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub code: String,
    pub name: String,
    pub interested: String,
    pub interested_flag: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            code: "COURSE CODE".to_string(),
            name: "COURSE DETAIL".to_string(),
            interested: "INTERESTED".to_string(),
            interested_flag: "Y".to_string(),
        }
    }
}

impl CatalogColumns {
    pub fn comedk() -> Self {
        Self {
            code: "Branch Code".to_string(),
            name: "Branch Name".to_string(),
            interested: "Interested".to_string(),
            interested_flag: "Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseCode {
    pub code: String,
    pub display_name: String,
    pub interested: bool,
}

impl CourseCode {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, interested: bool) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            interested,
        }
    }

    /// Column label used for section-scanned programs, e.g. `CS [Computer Science]`.
    pub fn bracket_label(&self) -> String {
        format!("{} [{}]", self.code, self.display_name)
    }

    /// Column label used by tabular exports, e.g. `30316-Aeronautical Engineering`.
    pub fn dash_label(&self) -> String {
        format!("{}-{}", self.code, self.display_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseCatalog {
    courses: Vec<CourseCode>,
}

impl CourseCatalog {
    pub fn new(courses: Vec<CourseCode>) -> Self {
        Self { courses }
    }

    /// Load the catalog from a sheet whose first row holds the column labels.
    pub fn load(sheet: &Sheet, columns: &CatalogColumns) -> Result<Self> {
        let header = sheet.header().map(Vec::as_slice).unwrap_or(&[]);

        let code_idx = find_label(header, &columns.code);
        let name_idx = find_label(header, &columns.name);
        let interested_idx = find_label(header, &columns.interested);

        let (code_idx, name_idx, interested_idx) = match (code_idx, name_idx, interested_idx) {
            (Some(c), Some(n), Some(i)) => (c, n, i),
            _ => {
                let missing = [
                    (code_idx, &columns.code),
                    (name_idx, &columns.name),
                    (interested_idx, &columns.interested),
                ]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, label)| label.clone())
                .collect();
                return Err(CutoffError::schema(&sheet.name, missing));
            }
        };

        let courses = sheet
            .data_rows()
            .iter()
            .filter_map(|row| {
                let cell = |idx: usize| row.get(idx).map(|c| c.to_display_string()).unwrap_or_default();
                let code = cell(code_idx);
                if code.is_empty() {
                    return None;
                }
                Some(CourseCode {
                    code,
                    display_name: cell(name_idx),
                    interested: cell(interested_idx) == columns.interested_flag,
                })
            })
            .collect::<Vec<_>>();

        log::info!(
            "loaded {} course(s) from '{}', {} of interest",
            courses.len(),
            sheet.name,
            courses.iter().filter(|c| c.interested).count()
        );

        Ok(Self { courses })
    }

    /// Courses flagged as interesting, in catalog order.
    pub fn interested(&self) -> impl Iterator<Item = &CourseCode> {
        self.courses.iter().filter(|course| course.interested)
    }

    /// First interested course whose code prefixes `candidate` followed by
    /// `separator`. Catalog order decides ties.
    pub fn match_program(&self, candidate: &str, separator: &str) -> Option<&CourseCode> {
        let candidate = candidate.trim();
        self.interested().find(|course| {
            candidate
                .strip_prefix(course.code.as_str())
                .is_some_and(|rest| rest.starts_with(separator))
        })
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}
