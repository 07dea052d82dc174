//! Lookups for the CLI report. A failed lookup never fails the report: it is
//! logged and comes back as `None`.

use serde::Serialize;
use tracing::{info, warn};

use super::{CourseDetails, CourseSummary, HandicapLookup};
use crate::storage::Storage;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HandicapReport {
    pub golfer_id: i64,
    pub handicap_index: Option<f64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CourseSearchReport {
    pub name: String,
    pub courses: Option<Vec<CourseSummary>>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CourseDetailsReport {
    pub course_id: i64,
    pub details: Option<CourseDetails>,
}

/// One entry per requested golfer. `lookup` is `None` when no credentials
/// were configured.
pub async fn handicap_report<S, L>(
    storage: &S,
    lookup: Option<&L>,
    golfer_ids: &[i64],
) -> Vec<HandicapReport>
where
    S: Storage,
    L: HandicapLookup,
{
    let mut found = Vec::with_capacity(golfer_ids.len());
    for &golfer_id in golfer_ids {
        let handicap_index = match lookup {
            Some(lookup) => golfer_handicap(storage, lookup, golfer_id).await,
            None => None,
        };
        found.push(HandicapReport {
            golfer_id,
            handicap_index,
        });
    }
    found
}

async fn golfer_handicap<S: Storage, L: HandicapLookup>(
    storage: &S,
    lookup: &L,
    golfer_id: i64,
) -> Option<f64> {
    let golfer = match storage.get_golfer(golfer_id).await {
        Ok(golfer) => golfer,
        Err(err) => {
            warn!(golfer_id, "handicap lookup skipped: {err}");
            return None;
        }
    };
    let (Some(ghin_id), Some(last_name), Some(state)) =
        (&golfer.ghin_id, &golfer.last_name, &golfer.state)
    else {
        warn!(golfer_id, "golfer has no ghin number, last name and state on file");
        return None;
    };
    match lookup.golfer_handicap(ghin_id, last_name, state).await {
        Ok(handicap) => {
            info!(golfer_id, ?handicap, "handicap lookup");
            handicap
        }
        Err(err) => {
            warn!(golfer_id, "handicap lookup failed: {err}");
            None
        }
    }
}

pub async fn course_search_report<L: HandicapLookup>(
    lookup: Option<&L>,
    name: &str,
) -> CourseSearchReport {
    let courses = match lookup {
        Some(lookup) => match lookup.search_courses(name).await {
            Ok(courses) => Some(courses),
            Err(err) => {
                warn!(name, "course search failed: {err}");
                None
            }
        },
        None => None,
    };
    CourseSearchReport {
        name: name.to_string(),
        courses,
    }
}

pub async fn course_details_report<L: HandicapLookup>(
    lookup: Option<&L>,
    course_id: i64,
) -> CourseDetailsReport {
    let details = match lookup {
        Some(lookup) => match lookup.course_details(course_id).await {
            Ok(details) => Some(details),
            Err(err) => {
                warn!(course_id, "course details failed: {err}");
                None
            }
        },
        None => None,
    };
    CourseDetailsReport { course_id, details }
}
