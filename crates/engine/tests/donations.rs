use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{Amount, Campaign, CampaignStatus, Engine, EngineError, Role, User};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    // A single pooled connection serializes writers, which is all SQLite
    // supports anyway.
    let mut options = ConnectOptions::new(url);
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

async fn donor_with_balance(engine: &Engine, email: &str, balance_minor: i64) -> User {
    let user = engine
        .register_user("Alice Donor", email, Role::User)
        .await
        .unwrap();
    if balance_minor > 0 {
        engine
            .add_to_wallet(&user.id, Amount::new(balance_minor))
            .await
            .unwrap();
    }
    user
}

async fn open_campaign(engine: &Engine, creator: &str, goal_minor: i64) -> Campaign {
    engine
        .new_campaign(
            "Clean water",
            "Wells for three villages in the north region.",
            Amount::new(goal_minor),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            creator,
        )
        .await
        .unwrap()
}

fn mid_campaign() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn donation_debits_wallet_and_completes_campaign_at_goal() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 150_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    let donation = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(100_000),
            Some("wallet"),
            mid_campaign(),
        )
        .await
        .unwrap();

    assert!(donation.transaction_ref.starts_with("TXN"));
    assert_eq!(
        engine.wallet_balance(&donor.id).await.unwrap(),
        Amount::new(50_000)
    );

    let campaign = engine.campaign(&campaign.id).await.unwrap();
    assert_eq!(campaign.raised, Amount::new(100_000));
    assert_eq!(campaign.status, CampaignStatus::Completed);
}

#[tokio::test]
async fn insufficient_funds_leaves_no_trace() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 500).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    let err = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(1_000),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(
        engine.wallet_balance(&donor.id).await.unwrap(),
        Amount::new(500)
    );
    let campaign = engine.campaign(&campaign.id).await.unwrap();
    assert_eq!(campaign.raised, Amount::ZERO);
    assert!(
        engine
            .list_donations_for_campaign(&campaign.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn donations_accumulate_and_complete_exactly_at_goal() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 20_000).await;
    let campaign = open_campaign(&engine, &donor.id, 10_000).await;

    engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(3_000),
            None,
            mid_campaign(),
        )
        .await
        .unwrap();
    let mid = engine.campaign(&campaign.id).await.unwrap();
    assert_eq!(mid.raised, Amount::new(3_000));
    assert_eq!(mid.status, CampaignStatus::Active);

    engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(7_000),
            None,
            mid_campaign(),
        )
        .await
        .unwrap();
    let done = engine.campaign(&campaign.id).await.unwrap();
    assert_eq!(done.raised, Amount::new(10_000));
    assert_eq!(done.status, CampaignStatus::Completed);
}

#[tokio::test]
async fn completed_campaign_rejects_further_donations() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 50_000).await;
    let campaign = open_campaign(&engine, &donor.id, 10_000).await;

    engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(12_000),
            None,
            mid_campaign(),
        )
        .await
        .unwrap();
    let overshot = engine.campaign(&campaign.id).await.unwrap();
    assert_eq!(overshot.raised, Amount::new(12_000));
    assert_eq!(overshot.status, CampaignStatus::Completed);

    let err = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(1_000),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CampaignClosed(_)));
}

#[tokio::test]
async fn end_date_is_inclusive_for_donations() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    let on_end_date = Utc.with_ymd_and_hms(2026, 12, 31, 23, 0, 0).unwrap();
    engine
        .make_donation(&donor.id, &campaign.id, Amount::new(500), None, on_end_date)
        .await
        .unwrap();

    let day_after = Utc.with_ymd_and_hms(2027, 1, 1, 0, 30, 0).unwrap();
    let err = engine
        .make_donation(&donor.id, &campaign.id, Amount::new(500), None, day_after)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CampaignClosed(_)));
}

#[tokio::test]
async fn cancelled_campaign_rejects_donations() {
    let (engine, _db) = engine_with_db().await;
    let admin = engine
        .register_user("Root Admin", "admin@example.com", Role::Admin)
        .await
        .unwrap();
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    engine.cancel_campaign(&campaign.id, &admin.id).await.unwrap();

    let err = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(500),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CampaignClosed(_)));
}

#[tokio::test]
async fn donation_below_minimum_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    let err = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(99),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(
        engine.wallet_balance(&donor.id).await.unwrap(),
        Amount::new(10_000)
    );
}

#[tokio::test]
async fn donation_with_unknown_ids_fails() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    let err = engine
        .make_donation(
            "missing",
            &campaign.id,
            Amount::new(500),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UserNotFound(_)));

    let err = engine
        .make_donation(&donor.id, "missing", Amount::new(500), None, mid_campaign())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CampaignNotFound(_)));
}

#[tokio::test]
async fn failed_campaign_credit_rolls_back_the_debit() {
    let (engine, db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    // Push the stored total to the brink so the campaign credit fails after
    // the wallet has already been debited inside the same transaction.
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE campaigns SET raised_minor = ? WHERE id = ?",
        vec![i64::MAX.into(), campaign.id.clone().into()],
    ))
    .await
    .unwrap();

    let err = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(500),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(
        engine.wallet_balance(&donor.id).await.unwrap(),
        Amount::new(10_000)
    );
    assert!(
        engine
            .list_donations_for_campaign(&campaign.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn money_is_conserved_across_operations() {
    let (engine, _db) = engine_with_db().await;
    let alice = donor_with_balance(&engine, "alice@example.com", 40_000).await;
    let bob = donor_with_balance(&engine, "bob@example.com", 25_000).await;
    let campaign = open_campaign(&engine, &alice.id, 100_000).await;

    let total_before = 40_000 + 25_000;

    engine
        .make_donation(
            &alice.id,
            &campaign.id,
            Amount::new(12_500),
            None,
            mid_campaign(),
        )
        .await
        .unwrap();
    engine
        .make_donation(
            &bob.id,
            &campaign.id,
            Amount::new(7_300),
            None,
            mid_campaign(),
        )
        .await
        .unwrap();
    // A failed donation must not move money either.
    let _ = engine
        .make_donation(
            &bob.id,
            &campaign.id,
            Amount::new(1_000_000),
            None,
            mid_campaign(),
        )
        .await
        .unwrap_err();

    let alice_balance = engine.wallet_balance(&alice.id).await.unwrap().minor();
    let bob_balance = engine.wallet_balance(&bob.id).await.unwrap().minor();
    let raised = engine.campaign(&campaign.id).await.unwrap().raised.minor();
    assert_eq!(alice_balance + bob_balance + raised, total_before);
}

#[tokio::test]
async fn concurrent_donations_lose_no_updates() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);

    let creator = donor_with_balance(&engine, "creator@example.com", 0).await;
    let campaign = open_campaign(&engine, &creator.id, 1_000_000).await;

    let mut donors = Vec::new();
    for i in 0..50 {
        let donor = donor_with_balance(&engine, &format!("donor{i}@example.com"), 1_000).await;
        donors.push(donor.id);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for donor_id in donors.clone() {
        let engine = Arc::clone(&engine);
        let campaign_id = campaign.id.clone();
        tasks.spawn(async move {
            engine
                .make_donation(
                    &donor_id,
                    &campaign_id,
                    Amount::new(100),
                    None,
                    mid_campaign(),
                )
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let campaign = engine.campaign(&campaign.id).await.unwrap();
    assert_eq!(campaign.raised, Amount::new(50 * 100));
    for donor_id in &donors {
        assert_eq!(
            engine.wallet_balance(donor_id).await.unwrap(),
            Amount::new(900)
        );
    }
    assert_eq!(
        engine
            .list_donations_for_campaign(&campaign.id)
            .await
            .unwrap()
            .len(),
        50
    );

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn user_history_paginates_without_gaps_or_duplicates() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 100_000).await;
    let campaign = open_campaign(&engine, &donor.id, 1_000_000).await;

    let mut expected = Vec::new();
    for i in 0..25 {
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
            + chrono::Duration::minutes(i);
        let donation = engine
            .make_donation(&donor.id, &campaign.id, Amount::new(100), None, at)
            .await
            .unwrap();
        expected.push(donation.id);
    }
    expected.reverse();

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let (page, next) = engine
            .list_donations_for_user_page(&donor.id, 10, cursor.as_deref())
            .await
            .unwrap();
        assert!(page.len() <= 10);
        seen.extend(page.into_iter().map(|d| d.id));
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen, expected);
}

#[tokio::test]
async fn donation_lookup_returns_the_recorded_row() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;

    let recorded = engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(500),
            Some("wallet"),
            mid_campaign(),
        )
        .await
        .unwrap();

    let loaded = engine.donation(&recorded.id).await.unwrap();
    assert_eq!(loaded.transaction_ref, recorded.transaction_ref);
    assert_eq!(loaded.amount, Amount::new(500));
    assert_eq!(loaded.payment_mode.as_deref(), Some("wallet"));

    let err = engine.donation("missing").await.unwrap_err();
    assert!(matches!(err, EngineError::DonationNotFound(_)));
}

#[tokio::test]
async fn garbage_cursor_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 0).await;

    let err = engine
        .list_donations_for_user_page(&donor.id, 10, Some("not-a-cursor"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn state_survives_reconnect() {
    let (engine, db, path) = engine_with_file_db().await;
    let donor = donor_with_balance(&engine, "alice@example.com", 10_000).await;
    let campaign = open_campaign(&engine, &donor.id, 100_000).await;
    engine
        .make_donation(
            &donor.id,
            &campaign.id,
            Amount::new(2_500),
            None,
            mid_campaign(),
        )
        .await
        .unwrap();
    drop(engine);
    db.close().await.unwrap();

    let url = format!("sqlite:{}?mode=rwc", path.display());
    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    assert_eq!(
        engine.wallet_balance(&donor.id).await.unwrap(),
        Amount::new(7_500)
    );
    assert_eq!(
        engine.campaign(&campaign.id).await.unwrap().raised,
        Amount::new(2_500)
    );

    let _ = std::fs::remove_file(path);
}
