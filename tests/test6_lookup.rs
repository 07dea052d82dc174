mod common;

use async_trait::async_trait;
use common::golfer;
use rusty_scorecard::lookup::{
    CourseDetails, CourseSummary, GhinClient, HandicapLookup, LookupError, course_details_report,
    course_search_report, handicap_report,
};
use rusty_scorecard::{MemoryStorage, Storage};

/// Answers for one GHIN number and fails everything else.
struct OneGolferLookup;

#[async_trait]
impl HandicapLookup for OneGolferLookup {
    async fn golfer_handicap(
        &self,
        ghin_id: &str,
        _last_name: &str,
        _state: &str,
    ) -> Result<Option<f64>, LookupError> {
        if ghin_id == "1234567" {
            Ok(Some(12.4))
        } else {
            Err(LookupError::Network("connection refused".to_string()))
        }
    }

    async fn search_courses(&self, _name: &str) -> Result<Vec<CourseSummary>, LookupError> {
        Err(LookupError::Auth("token rejected".to_string()))
    }

    async fn course_details(&self, course_id: i64) -> Result<CourseDetails, LookupError> {
        Err(LookupError::Parse(format!("course {course_id}")))
    }
}

async fn storage_with_golfers() -> Result<MemoryStorage, Box<dyn std::error::Error>> {
    let storage = MemoryStorage::new();
    let mut ana = golfer(1);
    ana.ghin_id = Some("1234567".to_string());
    ana.last_name = Some("Ortiz".to_string());
    ana.state = Some("OR".to_string());
    storage.insert_golfer(&ana).await?;
    let mut ben = golfer(2);
    ben.ghin_id = Some("7654321".to_string());
    ben.last_name = Some("Walsh".to_string());
    ben.state = Some("WA".to_string());
    storage.insert_golfer(&ben).await?;
    // no ghin number on file
    storage.insert_golfer(&golfer(3)).await?;
    Ok(storage)
}

#[tokio::test]
async fn test6_failed_lookups_leave_nulls() -> Result<(), Box<dyn std::error::Error>> {
    let storage = storage_with_golfers().await?;
    let report = handicap_report(&storage, Some(&OneGolferLookup), &[1, 2, 3, 42]).await;
    let found: Vec<(i64, Option<f64>)> = report
        .iter()
        .map(|r| (r.golfer_id, r.handicap_index))
        .collect();
    assert_eq!(found, vec![(1, Some(12.4)), (2, None), (3, None), (42, None)]);

    let json = serde_json::to_value(&report[1])?;
    assert_eq!(json["handicap_index"], serde_json::Value::Null);

    let courses = course_search_report(Some(&OneGolferLookup), "Pine Valley").await;
    assert_eq!(courses.name, "Pine Valley");
    assert_eq!(courses.courses, None);
    let details = course_details_report(Some(&OneGolferLookup), 77).await;
    assert_eq!(details.details, None);
    Ok(())
}

#[tokio::test]
async fn test6_missing_credentials_leave_nulls() -> Result<(), Box<dyn std::error::Error>> {
    let storage = storage_with_golfers().await?;
    let report = handicap_report::<_, GhinClient>(&storage, None, &[1, 2]).await;
    assert!(report.iter().all(|r| r.handicap_index.is_none()));
    assert_eq!(report.len(), 2);
    let courses = course_search_report::<GhinClient>(None, "Pine Valley").await;
    assert_eq!(courses.courses, None);
    Ok(())
}
