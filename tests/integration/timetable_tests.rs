//! Timetable lifecycle and weekday interval behaviour over the in-memory store

use appoint_scheduling::{
    models::{CreateTimetable, DayOfWeek, OpeningInterval, Timetable},
    Services,
};
use chrono::{Days, Utc};

fn intervals(pairs: &[(&str, &str)]) -> Vec<OpeningInterval> {
    pairs.iter().map(|(o, c)| OpeningInterval::new(*o, *c)).collect()
}

fn hours(days: &[appoint_scheduling::models::TimetableDay]) -> Vec<(String, String)> {
    days.iter().map(|d| (d.opening.clone(), d.closing.clone())).collect()
}

async fn create_timetable(services: &Services) -> Timetable {
    services
        .timetables
        .create(&CreateTimetable {
            name: "Regular hours".to_string(),
            valid_from: Utc::now().date_naive(),
            valid_until: None,
        })
        .await
        .expect("Failed to create timetable")
}

#[tokio::test]
async fn test_create_validity_window() {
    let (services, _) = Services::in_memory();
    let today = Utc::now().date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
    let next_week = today.checked_add_days(Days::new(7)).unwrap();

    let err = services
        .timetables
        .create(&CreateTimetable {
            name: "Late".to_string(),
            valid_from: yesterday,
            valid_until: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = services
        .timetables
        .create(&CreateTimetable {
            name: "Backwards".to_string(),
            valid_from: next_week,
            valid_until: Some(today),
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());

    for until in [None, Some(today), Some(next_week)] {
        let created = services
            .timetables
            .create(&CreateTimetable {
                name: "Ok".to_string(),
                valid_from: today,
                valid_until: until,
            })
            .await
            .unwrap();
        assert_eq!(created.valid_from, today);
        assert_eq!(created.valid_until, until);
    }
}

#[tokio::test]
async fn test_scenario_a_two_intervals() {
    let (services, _) = Services::in_memory();
    let tt = create_timetable(&services).await;

    let created = services
        .timetables
        .create_week_day(
            tt.id,
            DayOfWeek::Monday,
            &intervals(&[("09:00", "12:00"), ("13:00", "17:00")]),
        )
        .await
        .unwrap();
    assert_eq!(
        hours(&created),
        vec![
            ("09:00".to_string(), "12:00".to_string()),
            ("13:00".to_string(), "17:00".to_string()),
        ]
    );
    assert!(created.iter().all(|d| d.timetable_id == tt.id && d.day_of_week == DayOfWeek::Monday));

    let stored = services.timetables.get_week_day(tt.id, DayOfWeek::Monday).await.unwrap();
    assert_eq!(hours(&stored), hours(&created));
}

#[tokio::test]
async fn test_scenario_b_overlap_leaves_prior_state() {
    let (services, _) = Services::in_memory();
    let tt = create_timetable(&services).await;

    services
        .timetables
        .create_week_day(tt.id, DayOfWeek::Monday, &intervals(&[("08:00", "10:00")]))
        .await
        .unwrap();

    let err = services
        .timetables
        .create_week_day(
            tt.id,
            DayOfWeek::Monday,
            &intervals(&[("09:00", "12:00"), ("11:00", "14:00")]),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let stored = services.timetables.get_week_day(tt.id, DayOfWeek::Monday).await.unwrap();
    assert_eq!(hours(&stored), vec![("08:00".to_string(), "10:00".to_string())]);
}

#[tokio::test]
async fn test_scenario_c_second_call_replaces_first() {
    let (services, store) = Services::in_memory();
    let tt = create_timetable(&services).await;

    services
        .timetables
        .create_week_day(
            tt.id,
            DayOfWeek::Monday,
            &intervals(&[("09:00", "12:00"), ("13:00", "17:00")]),
        )
        .await
        .unwrap();
    services
        .timetables
        .create_week_day(tt.id, DayOfWeek::Monday, &intervals(&[("10:00", "16:00")]))
        .await
        .unwrap();

    let stored = services.timetables.get_week_day(tt.id, DayOfWeek::Monday).await.unwrap();
    assert_eq!(hours(&stored), vec![("10:00".to_string(), "16:00".to_string())]);

    // the replaced rows are soft-deleted, not removed
    let all = store.all_days(tt.id).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all.iter().filter(|d| d.deleted_at.is_some()).count(), 2);
}

#[tokio::test]
async fn test_scenario_d_full_timetable_without_intervals() {
    let (services, _) = Services::in_memory();
    let tt = create_timetable(&services).await;

    let details = services.timetables.get_by_id(tt.id, true).await.unwrap();
    assert_eq!(details.timetable, tt);
    let week = details.week.expect("week should be loaded");
    assert!(week.is_empty());
}

#[tokio::test]
async fn test_full_timetable_groups_days() {
    let (services, _) = Services::in_memory();
    let tt = create_timetable(&services).await;

    services
        .timetables
        .create_week_day_by_name(tt.id, "Saturday", &intervals(&[("10:00", "13:00")]))
        .await
        .unwrap();
    services
        .timetables
        .create_week_day(tt.id, DayOfWeek::Tuesday, &intervals(&[("08:30", "12:00"), ("14:00", "18:00")]))
        .await
        .unwrap();

    let week = services.timetables.get_by_id(tt.id, true).await.unwrap().week.unwrap();
    assert_eq!(week.day(DayOfWeek::Saturday).len(), 1);
    assert_eq!(week.day(DayOfWeek::Tuesday).len(), 2);
    assert!(week.day(DayOfWeek::Monday).is_empty());
}

#[tokio::test]
async fn test_delete_week_day_is_idempotent() {
    let (services, _) = Services::in_memory();
    let tt = create_timetable(&services).await;

    services.timetables.delete_week_day(tt.id, DayOfWeek::Sunday).await.unwrap();
    services.timetables.delete_week_day(tt.id, DayOfWeek::Sunday).await.unwrap();
    assert!(services
        .timetables
        .get_week_day(tt.id, DayOfWeek::Sunday)
        .await
        .unwrap()
        .is_empty());

    services
        .timetables
        .create_week_day(tt.id, DayOfWeek::Sunday, &intervals(&[("10:00", "12:00")]))
        .await
        .unwrap();
    services.timetables.delete_week_day_by_name(tt.id, "sunday").await.unwrap();
    assert!(services
        .timetables
        .get_week_day(tt.id, DayOfWeek::Sunday)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_timetable_cascades() {
    let (services, store) = Services::in_memory();
    let tt = create_timetable(&services).await;

    services
        .timetables
        .create_week_day(tt.id, DayOfWeek::Monday, &intervals(&[("09:00", "12:00")]))
        .await
        .unwrap();
    services
        .timetables
        .create_week_day(tt.id, DayOfWeek::Friday, &intervals(&[("09:00", "12:00")]))
        .await
        .unwrap();

    services.timetables.delete(tt.id).await.unwrap();

    assert!(services.timetables.get_by_id(tt.id, false).await.unwrap_err().is_not_found());
    assert!(services
        .timetables
        .get_week_day(tt.id, DayOfWeek::Monday)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(store.all_days(tt.id).unwrap().iter().all(|d| d.deleted_at.is_some()));

    // a second delete finds nothing
    assert!(services.timetables.delete(tt.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_week_day_on_missing_timetable() {
    let (services, _) = Services::in_memory();

    assert!(services
        .timetables
        .create_week_day(5, DayOfWeek::Monday, &intervals(&[("09:00", "12:00")]))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(services
        .timetables
        .delete_week_day(5, DayOfWeek::Monday)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(services
        .timetables
        .get_week_day_by_name(5, "funday")
        .await
        .unwrap_err()
        .is_validation());
}

#[tokio::test]
async fn test_concurrent_replacements_never_interleave() {
    let (services, _) = Services::in_memory();
    let tt = create_timetable(&services).await;

    let timetable_id = tt.id;
    let mut handles = Vec::new();
    for hour in 6..14 {
        let services = services.clone();
        let opening = format!("{:02}:00", hour);
        let closing = format!("{:02}:30", hour);
        handles.push(tokio::spawn(async move {
            services
                .timetables
                .create_week_day(
                    timetable_id,
                    DayOfWeek::Wednesday,
                    &[OpeningInterval::new(opening, closing)],
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // whichever call won, exactly one full batch survives
    let stored = services.timetables.get_week_day(tt.id, DayOfWeek::Wednesday).await.unwrap();
    assert_eq!(stored.len(), 1);
}
