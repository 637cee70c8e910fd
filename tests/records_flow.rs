mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use campus_gate::authz::Role;
use common::{api, spawn_app, TestApp};

async fn add_student(t: &TestApp, admin: &str, email: &str, roll: &str) -> Result<String> {
    let body = json!({ "name": "Pupil", "email": email, "class_name": "9-B", "roll_number": roll });
    let (status, _, created) = t.send(api("POST", "/api/students", Some(admin), Some(body))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(created["id"].as_str().context("student id")?.to_string())
}

fn len(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}

#[tokio::test]
async fn attendance_is_marked_once_per_day_and_students_see_their_own() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("North School").await?;
    let (_, admin) = t.seed_user("admin@north.test", Role::Admin, Some(org)).await?;
    let (_, staff) = t.seed_user("staff@north.test", Role::Staff, Some(org)).await?;
    let (_, pupil) = t.seed_user("ann@north.test", Role::Student, Some(org)).await?;

    let ann = add_student(&t, &admin, "ann@north.test", "1").await?;
    let bob = add_student(&t, &admin, "bob@north.test", "2").await?;

    let mark = |student: &str, status: &str| json!({ "student_id": student, "date": "2025-03-10", "status": status });

    let (status, _, first) = t.send(api("POST", "/api/attendance", Some(&staff), Some(mark(ann.as_str(), "ABSENT")))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "ABSENT");

    // Re-marking the same day corrects the existing record.
    let (status, _, second) = t.send(api("POST", "/api/attendance", Some(&staff), Some(mark(ann.as_str(), "LATE")))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "LATE");
    assert_eq!(second["id"], first["id"]);

    let (status, _, _) = t.send(api("POST", "/api/attendance", Some(&staff), Some(mark(bob.as_str(), "PRESENT")))?).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _, all) = t.send(api("GET", "/api/attendance?date=2025-03-10", Some(&staff), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(len(&all), Some(2));

    let (status, _, own) = t.send(api("GET", "/api/attendance", Some(&pupil), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(len(&own), Some(1));
    assert_eq!(own[0]["student_id"], ann);

    // Students cannot mark, and unknown students are not found.
    let (status, _, _) = t.send(api("POST", "/api/attendance", Some(&pupil), Some(mark(ann.as_str(), "PRESENT")))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stranger = Uuid::new_v4().to_string();
    let (status, _, _) = t.send(api("POST", "/api/attendance", Some(&staff), Some(mark(stranger.as_str(), "PRESENT")))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn leave_requests_are_decided_exactly_once() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("North School").await?;
    let other = t.seed_org("South School").await?;
    let (_, admin) = t.seed_user("admin@north.test", Role::Admin, Some(org)).await?;
    let (_, other_admin) = t.seed_user("admin@south.test", Role::Admin, Some(other)).await?;
    let (_, staff) = t.seed_user("staff@north.test", Role::Staff, Some(org)).await?;
    let (_, colleague) = t.seed_user("colleague@north.test", Role::Staff, Some(org)).await?;

    let backwards = json!({ "reason": "Conference", "start_date": "2025-04-10", "end_date": "2025-04-08" });
    let (status, _, _) = t.send(api("POST", "/api/leaves", Some(&staff), Some(backwards))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "reason": "Conference", "start_date": "2025-04-08", "end_date": "2025-04-10" });
    let (status, _, leave) = t.send(api("POST", "/api/leaves", Some(&staff), Some(body))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(leave["status"], "PENDING");
    let uri = format!("/api/leaves/{}", leave["id"].as_str().context("leave id")?);

    // Requesters see their own, reviewers see the organization.
    let (_, _, mine) = t.send(api("GET", "/api/leaves", Some(&staff), None)?).await?;
    assert_eq!(len(&mine), Some(1));
    let (_, _, theirs) = t.send(api("GET", "/api/leaves", Some(&colleague), None)?).await?;
    assert_eq!(len(&theirs), Some(0));
    let (_, _, all) = t.send(api("GET", "/api/leaves", Some(&admin), None)?).await?;
    assert_eq!(len(&all), Some(1));

    let approve = json!({ "status": "APPROVED" });
    let (status, _, _) = t.send(api("PUT", &uri, Some(&staff), Some(approve.clone()))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = t.send(api("PUT", &uri, Some(&other_admin), Some(approve.clone()))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = t.send(api("PUT", &uri, Some(&admin), Some(json!({ "status": "PENDING" })))?).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, decided) = t.send(api("PUT", &uri, Some(&admin), Some(approve))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "APPROVED");
    assert!(decided["reviewed_by"].is_string());

    let (status, _, _) = t.send(api("PUT", &uri, Some(&admin), Some(json!({ "status": "REJECTED" })))?).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // A reviewer's own request needs another reviewer.
    let body = json!({ "reason": "Family event", "start_date": "2025-05-02", "end_date": "2025-05-02" });
    let (status, _, own) = t.send(api("POST", "/api/leaves", Some(&admin), Some(body))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let own_uri = format!("/api/leaves/{}", own["id"].as_str().context("leave id")?);

    let (status, _, _) = t.send(api("PUT", &own_uri, Some(&admin), Some(json!({ "status": "APPROVED" })))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, root) = t.seed_user("root@campus.test", Role::SuperAdmin, None).await?;
    let (status, _, decided) = t.send(api("PUT", &own_uri, Some(&root), Some(json!({ "status": "APPROVED" })))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "APPROVED");

    Ok(())
}

#[tokio::test]
async fn results_validate_marks_and_stay_private_to_the_student() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("North School").await?;
    let (_, admin) = t.seed_user("admin@north.test", Role::Admin, Some(org)).await?;
    let (_, staff) = t.seed_user("staff@north.test", Role::Staff, Some(org)).await?;
    let (_, pupil) = t.seed_user("ann@north.test", Role::Student, Some(org)).await?;

    let ann = add_student(&t, &admin, "ann@north.test", "1").await?;
    let bob = add_student(&t, &admin, "bob@north.test", "2").await?;

    let record = |student: &str, marks: f64| {
        json!({ "student_id": student, "exam_type": "Midterm", "subject": "Physics", "marks": marks, "max_marks": 100.0 })
    };

    let (status, _, _) = t.send(api("POST", "/api/results", Some(&staff), Some(record(ann.as_str(), 120.0)))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _, _) = t.send(api("POST", "/api/results", Some(&staff), Some(record(ann.as_str(), -1.0)))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = t.send(api("POST", "/api/results", Some(&staff), Some(record(ann.as_str(), 88.5)))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _, _) = t.send(api("POST", "/api/results", Some(&staff), Some(record(ann.as_str(), 90.0)))?).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _, _) = t.send(api("POST", "/api/results", Some(&staff), Some(record(bob.as_str(), 40.0)))?).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, _) = t.send(api("POST", "/api/results", Some(&pupil), Some(record(bob.as_str(), 100.0)))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, all) = t.send(api("GET", "/api/results", Some(&staff), None)?).await?;
    assert_eq!(len(&all), Some(2));

    let (status, _, own) = t.send(api("GET", "/api/results", Some(&pupil), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(len(&own), Some(1));
    assert_eq!(own[0]["marks"], 88.5);

    Ok(())
}
