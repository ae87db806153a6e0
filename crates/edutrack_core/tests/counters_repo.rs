use edutrack_core::db::open_db_in_memory;
use edutrack_core::{
    CivilDay, CounterKind, CountersListQuery, CountersRepository, CountersValidationError,
    CreateOutcome, DailyCounters, RepoError, SqliteCountersRepository, UserId,
};
use rusqlite::params;

fn day(raw: &str) -> CivilDay {
    raw.parse().unwrap()
}

fn user(raw: &str) -> UserId {
    UserId::parse(raw).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    let counters = DailyCounters::zeroed(user("u1"), day("2024-06-15"), 1_718_409_600_000);
    let created = match repo.create_counters(&counters) {
        CreateOutcome::Created(created) => created,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(created, counters);

    let loaded = repo
        .get_counters(&user("u1"), day("2024-06-15"))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, counters);
    assert!(loaded.is_untouched());
}

#[test]
fn get_missing_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    assert!(repo
        .get_counters(&user("u1"), day("2024-06-15"))
        .unwrap()
        .is_none());
}

#[test]
fn second_create_for_same_user_and_day_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    let first = DailyCounters::zeroed(user("u1"), day("2024-06-15"), 1_000);
    let second = DailyCounters::zeroed(user("u1"), day("2024-06-15"), 2_000);
    assert!(matches!(repo.create_counters(&first), CreateOutcome::Created(_)));
    assert!(matches!(repo.create_counters(&second), CreateOutcome::Conflict));

    let stored = repo
        .get_counters(&user("u1"), day("2024-06-15"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.created_at, 1_000);
}

#[test]
fn duplicate_row_id_is_a_failure_not_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    let first = DailyCounters::zeroed(user("u1"), day("2024-06-15"), 1_000);
    let mut reused_id = DailyCounters::zeroed(user("u2"), day("2024-06-15"), 1_000);
    reused_id.id = first.id;

    assert!(matches!(repo.create_counters(&first), CreateOutcome::Created(_)));
    assert!(matches!(
        repo.create_counters(&reused_id),
        CreateOutcome::Failed(RepoError::Db(_))
    ));
}

#[test]
fn same_day_for_different_users_does_not_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    let a = DailyCounters::zeroed(user("u1"), day("2024-06-15"), 1_000);
    let b = DailyCounters::zeroed(user("u2"), day("2024-06-15"), 1_000);
    assert!(matches!(repo.create_counters(&a), CreateOutcome::Created(_)));
    assert!(matches!(repo.create_counters(&b), CreateOutcome::Created(_)));
}

#[test]
fn increment_updates_only_the_addressed_counter_and_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    let mine = DailyCounters::zeroed(user("u1"), day("2024-06-15"), 1_000);
    let theirs = DailyCounters::zeroed(user("u2"), day("2024-06-15"), 1_000);
    repo.create_counters(&mine);
    repo.create_counters(&theirs);

    let updated = repo
        .increment_counter(
            &user("u1"),
            day("2024-06-15"),
            CounterKind::LessonsCompleted,
            3,
            5_000,
        )
        .unwrap();
    assert_eq!(updated.lessons_completed, 3);
    assert_eq!(updated.xp_earned, 0);
    assert_eq!(updated.updated_at, 5_000);
    assert_eq!(updated.created_at, 1_000);

    let untouched = repo
        .get_counters(&user("u2"), day("2024-06-15"))
        .unwrap()
        .unwrap();
    assert!(untouched.is_untouched());
}

#[test]
fn increment_rejects_zero_missing_row_and_overflow() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    let err = repo
        .increment_counter(&user("u1"), day("2024-06-15"), CounterKind::XpEarned, 0, 1)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CountersValidationError::ZeroIncrement)
    ));

    let err = repo
        .increment_counter(&user("u1"), day("2024-06-15"), CounterKind::XpEarned, 1, 1)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    repo.create_counters(&DailyCounters::zeroed(user("u1"), day("2024-06-15"), 1));
    repo.increment_counter(
        &user("u1"),
        day("2024-06-15"),
        CounterKind::XpEarned,
        u32::MAX,
        2,
    )
    .unwrap();
    let err = repo
        .increment_counter(&user("u1"), day("2024-06-15"), CounterKind::XpEarned, 1, 3)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CountersValidationError::CounterOverflow(CounterKind::XpEarned))
    ));
}

#[test]
fn list_returns_most_recent_first_with_range_and_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    for key in ["2024-06-12", "2024-06-13", "2024-06-14", "2024-06-15"] {
        repo.create_counters(&DailyCounters::zeroed(user("u1"), day(key), 1));
    }
    repo.create_counters(&DailyCounters::zeroed(user("u2"), day("2024-06-15"), 1));

    let all = repo
        .list_counters(&user("u1"), &CountersListQuery::default())
        .unwrap();
    let keys: Vec<String> = all.iter().map(|row| row.day.key()).collect();
    assert_eq!(
        keys,
        vec!["2024-06-15", "2024-06-14", "2024-06-13", "2024-06-12"]
    );

    let limited = repo
        .list_counters(
            &user("u1"),
            &CountersListQuery {
                limit: Some(2),
                ..CountersListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].day, day("2024-06-15"));

    let ranged = repo
        .list_counters(
            &user("u1"),
            &CountersListQuery {
                from_day: Some(day("2024-06-13")),
                to_day: Some(day("2024-06-14")),
                limit: None,
            },
        )
        .unwrap();
    let keys: Vec<String> = ranged.iter().map(|row| row.day.key()).collect();
    assert_eq!(keys, vec!["2024-06-14", "2024-06-13"]);
}

#[test]
fn invalid_persisted_state_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCountersRepository::try_new(&conn).unwrap();

    conn.execute(
        "INSERT INTO daily_counters (id, user_id, day, created_at, updated_at)
         VALUES (?1, 'u1', '2024-06-15', 1, 1);",
        params!["not-a-uuid"],
    )
    .unwrap();

    let err = repo
        .get_counters(&user("u1"), day("2024-06-15"))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("uuid")));
}
