/// Back-office services working together over the bundled seed data
mod fixtures;

use std::sync::Arc;

use fixtures::load_violation_report;
use inspection_wizard::dashboard;
use inspection_wizard::services::{
    seed, InMemoryLogService, InMemoryUserService, InMemoryVisitService, Latency, LogService,
    LogType, MockSubmissionService, NewUser, ReportSubmitter, ServiceError, UserQuery, UserRole,
    UserService, VisitQuery, VisitService,
};

#[tokio::test]
async fn submitted_report_shows_up_in_visits_and_log_stats() {
    let visits = Arc::new(InMemoryVisitService::seeded(Latency::NONE, "").unwrap());
    let logs = Arc::new(InMemoryLogService::seeded(Latency::NONE).unwrap());
    let submitter = MockSubmissionService::new(visits.clone(), logs.clone());
    let before = logs.stats().await.unwrap();

    let receipt = submitter.submit(&load_violation_report()).await.unwrap();

    let found = visits
        .list(VisitQuery {
            search: Some("F-001".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(found.data.iter().any(|v| v.id == receipt.visit_id));

    let after = logs.stats().await.unwrap();
    assert_eq!(after.total, before.total + 1);
    assert_eq!(
        after.by_type[&LogType::FormSubmitted],
        before.by_type[&LogType::FormSubmitted] + 1
    );

    let entry = logs.get(&receipt.log_id).await.unwrap();
    let details = entry.details.expect("submission details");
    assert_eq!(details["visitId"], receipt.visit_id.as_str());
    assert_eq!(details["totalFine"], 23000.0);
}

#[tokio::test]
async fn archiving_moves_a_visit_between_listings() {
    let visits = InMemoryVisitService::seeded(Latency::NONE, "").unwrap();
    let active = visits.list(VisitQuery::default()).await.unwrap();
    assert_eq!(active.total, 8);

    visits.archive("VISIT-0003").await.unwrap();

    let active = visits.list(VisitQuery::default()).await.unwrap();
    let archived = visits
        .list(VisitQuery {
            archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.total, 7);
    assert_eq!(archived.total, 1);
    assert_eq!(archived.data[0].id, "VISIT-0003");

    let missing = visits.archive("VISIT-0999").await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn visit_pages_split_the_listing() {
    let visits = InMemoryVisitService::seeded(Latency::NONE, "").unwrap();

    let last = visits
        .list(VisitQuery {
            page: 3,
            page_size: 3,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(last.total, 8);
    assert_eq!(last.total_pages, 3);
    assert_eq!(last.data.len(), 2);
}

#[tokio::test]
async fn created_users_are_listed_and_invalid_ones_rejected() {
    let users = InMemoryUserService::seeded(Latency::NONE).unwrap();
    let valid = NewUser {
        name: "سارة فهد القحطاني".into(),
        email: "sara.q@example.com".into(),
        national_id: "10293847561".into(),
        employee_id: "EMP010".into(),
        role: UserRole::Inspector,
        is_active: None,
    };

    let created = users.create(valid.clone()).await.unwrap();
    assert_eq!(created.id, "4");
    assert!(created.is_active);
    assert!(!created.is_verified);

    let rejected = users
        .create(NewUser {
            national_id: "12ab".into(),
            ..valid
        })
        .await
        .unwrap_err();
    assert!(matches!(rejected, ServiceError::Invalid { field: "nationalId", .. }));

    let listed = users.list(UserQuery::default()).await.unwrap();
    assert_eq!(listed.total, 4);
}

#[test]
fn dashboard_aggregates_the_seed_records() {
    let records = seed::inspections().unwrap();

    let summary = dashboard::summary(&records);
    let regions = dashboard::by_region(&records);
    let performance = dashboard::inspector_performance(&records);

    assert_eq!(summary.total_inspections, 8);
    assert_eq!(regions.values().sum::<usize>(), 8);
    assert_eq!(
        performance.iter().map(|p| p.total_inspections).sum::<usize>(),
        8
    );
    assert!(performance
        .windows(2)
        .all(|w| w[0].total_inspections >= w[1].total_inspections));
}
