use chrono::{Duration, Utc};
use gacha_engine::db::init_db;
use gacha_engine::orchestration::{DrawCoordinator, HistoryRecorder, InventoryGranter};
use gacha_engine::{
    CatalogItemMaster, Emission, EmissionType, ErrorKind, GachaPool, GachaState, Item, PoolId,
    Repository, RequestId, UserId, Wallet, WalletService,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    repo: Arc<Repository>,
    coordinator: DrawCoordinator,
    wallets: WalletService,
    slime: Item,
    relic: Item,
    dragon: Item,
    _temp: TempDir,
}

async fn setup_harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let slime = Item::create("Slime", "R", 999).unwrap();
    let relic = Item::create("Relic", "SR", 1).unwrap();
    let dragon = Item::create("Dragon", "SSR", 999).unwrap();
    let master = Arc::new(CatalogItemMaster::new(["SSR"]).with_items([
        slime.clone(),
        relic.clone(),
        dragon.clone(),
    ]));

    let coordinator = DrawCoordinator::new(repo.clone(), master.clone())
        .with_listener(Arc::new(InventoryGranter::new(repo.clone(), master)))
        .with_listener(Arc::new(HistoryRecorder::new(repo.clone())));

    Harness {
        wallets: WalletService::new(repo.clone()),
        repo,
        coordinator,
        slime,
        relic,
        dragon,
        _temp: temp_dir,
    }
}

/// Open pool containing a single emission that always wins.
async fn register_pool(repo: &Repository, item: &Item, cost: i32, ceiling: i32) -> PoolId {
    let now = Utc::now();
    let pool = GachaPool::create("Banner", now - Duration::hours(1), now + Duration::days(1), cost, ceiling)
        .unwrap()
        .with_emission(Emission::new(item.id, 10_000, true).unwrap());
    repo.insert_pool(&pool).await.unwrap();
    pool.id
}

async fn funded_user(h: &Harness, paid: i64, free: i64) -> UserId {
    let user = UserId::random();
    h.wallets.open_wallet(&user).await.unwrap();
    h.wallets.deposit(&user, paid, free).await.unwrap();
    user
}

#[tokio::test]
async fn test_draw_consumes_paid_first_and_grants() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 100, 90).await;
    let user = funded_user(&h, 100, 500).await;
    let request_id = RequestId::generate();

    let receipt = h.coordinator.draw(&user, &pool, 3, request_id).await.unwrap();

    assert_eq!(receipt.request_id, request_id);
    assert_eq!(receipt.consumed_paid, 100);
    assert_eq!(receipt.consumed_free, 200);
    assert_eq!(receipt.results.len(), 3);
    assert!(receipt.results.iter().all(|r| r.item_id == h.slime.id && r.is_new));

    let wallet = h.repo.find_wallet(&user).await.unwrap().unwrap();
    assert_eq!(wallet.paid().amount(), 0);
    assert_eq!(wallet.free().amount(), 300);

    let inventory = h.repo.query_inventory(&user).await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].quantity, 3);

    let record = h.repo.find_history(&request_id).await.unwrap().unwrap();
    assert_eq!(record.consumed_paid, 100);
    assert_eq!(record.consumed_free, 200);
    assert_eq!(record.outcomes().unwrap().len(), 3);

    // Second draw: the item is already owned
    let receipt = h
        .coordinator
        .draw(&user, &pool, 1, RequestId::generate())
        .await
        .unwrap();
    assert!(!receipt.results[0].is_new);
}

#[tokio::test]
async fn test_insufficient_balance_persists_nothing() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 300, 90).await;
    let user = funded_user(&h, 100, 100).await;
    let request_id = RequestId::generate();

    let err = h.coordinator.draw(&user, &pool, 1, request_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InsufficientBalance);

    let wallet = h.repo.find_wallet(&user).await.unwrap().unwrap();
    assert_eq!(wallet.total(), 200);
    assert!(h.repo.find_history(&request_id).await.unwrap().is_none());
    assert!(h.repo.query_inventory(&user).await.unwrap().is_empty());

    let mut conn = h.repo.pool().acquire().await.unwrap();
    assert!(h.repo.find_state(&mut conn, &user, &pool).await.unwrap().is_none());
}

#[tokio::test]
async fn test_closed_pool_is_expired() {
    let h = setup_harness().await;
    let user = funded_user(&h, 1000, 0).await;
    let now = Utc::now();
    let pool = GachaPool::create("Past", now - Duration::days(2), now - Duration::days(1), 100, 90)
        .unwrap()
        .with_emission(Emission::new(h.slime.id, 10_000, false).unwrap());
    h.repo.insert_pool(&pool).await.unwrap();

    let err = h
        .coordinator
        .draw(&user, &pool.id, 1, RequestId::generate())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::GachaPoolExpired);
}

#[tokio::test]
async fn test_unknown_pool_is_expired_even_without_wallet() {
    let h = setup_harness().await;
    let err = h
        .coordinator
        .draw(&UserId::random(), &PoolId::random(), 1, RequestId::generate())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::GachaPoolExpired);
}

#[tokio::test]
async fn test_missing_wallet() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 100, 90).await;
    let err = h
        .coordinator
        .draw(&UserId::random(), &pool, 1, RequestId::generate())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::WalletNotFound);
}

#[tokio::test]
async fn test_corrupted_weights_rejected_before_debit() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 100, 90).await;
    let user = funded_user(&h, 1000, 0).await;

    sqlx::query("UPDATE gacha_emissions SET weight = 9999 WHERE pool_id = ?")
        .bind(pool.to_string())
        .execute(h.repo.pool())
        .await
        .unwrap();

    let err = h
        .coordinator
        .draw(&user, &pool, 1, RequestId::generate())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidWeightConfig);

    let wallet = h.repo.find_wallet(&user).await.unwrap().unwrap();
    assert_eq!(wallet.paid().amount(), 1000);
}

/// Asserts that a failed draw left no trace for the user.
async fn assert_untouched(
    h: &Harness,
    user: &UserId,
    pool: &PoolId,
    request_id: &RequestId,
    before: &Wallet,
) {
    // Balances and version both unchanged
    let wallet = h.repo.find_wallet(user).await.unwrap().unwrap();
    assert_eq!(&wallet, before);
    assert!(h.repo.query_inventory(user).await.unwrap().is_empty());
    assert!(h.repo.find_history(request_id).await.unwrap().is_none());

    let mut conn = h.repo.pool().acquire().await.unwrap();
    assert!(h.repo.find_state(&mut conn, user, pool).await.unwrap().is_none());
}

#[tokio::test]
async fn test_negative_stored_ceiling_rolls_back_draw() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 100, 90).await;
    let user = funded_user(&h, 1000, 0).await;
    let before = h.repo.find_wallet(&user).await.unwrap().unwrap();

    sqlx::query("UPDATE gacha_pools SET pity_ceiling = -1 WHERE id = ?")
        .bind(pool.to_string())
        .execute(h.repo.pool())
        .await
        .unwrap();

    let request_id = RequestId::generate();
    let err = h.coordinator.draw(&user, &pool, 3, request_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);

    assert_untouched(&h, &user, &pool, &request_id, &before).await;
}

#[tokio::test]
async fn test_item_missing_from_master_rolls_back_draw() {
    let h = setup_harness().await;
    let unlisted = Item::create("Ghost", "SR", 10).unwrap();
    let pool = register_pool(&h.repo, &unlisted, 100, 90).await;
    let user = funded_user(&h, 1000, 0).await;
    let before = h.repo.find_wallet(&user).await.unwrap().unwrap();

    let request_id = RequestId::generate();
    let err = h.coordinator.draw(&user, &pool, 2, request_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);

    assert_untouched(&h, &user, &pool, &request_id, &before).await;
}

#[tokio::test]
async fn test_replayed_request_is_rejected_without_double_debit() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 100, 90).await;
    let user = funded_user(&h, 1000, 0).await;
    let request_id = RequestId::generate();

    h.coordinator.draw(&user, &pool, 2, request_id).await.unwrap();
    let err = h.coordinator.draw(&user, &pool, 2, request_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateRequest);

    let wallet = h.repo.find_wallet(&user).await.unwrap().unwrap();
    assert_eq!(wallet.paid().amount(), 800);

    let inventory = h.repo.query_inventory(&user).await.unwrap();
    assert_eq!(inventory[0].quantity, 2);

    let mut conn = h.repo.pool().acquire().await.unwrap();
    let state = h.repo.find_state(&mut conn, &user, &pool).await.unwrap().unwrap();
    assert_eq!(state.pity_count, 2);
}

#[tokio::test]
async fn test_inventory_overflow_rolls_back_debit() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.relic, 100, 90).await;
    let user = funded_user(&h, 1000, 0).await;
    let request_id = RequestId::generate();

    let err = h.coordinator.draw(&user, &pool, 2, request_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InventoryOverflow);

    let wallet = h.repo.find_wallet(&user).await.unwrap().unwrap();
    assert_eq!(wallet.paid().amount(), 1000);
    assert!(h.repo.query_inventory(&user).await.unwrap().is_empty());
    assert!(h.repo.find_history(&request_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_top_rarity_resets_pity_and_is_labelled() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.dragon, 100, 6).await;
    let user = funded_user(&h, 1000, 0).await;

    let mut conn = h.repo.pool().acquire().await.unwrap();
    let mut state = GachaState::create(user, pool);
    state.pity_count = 5;
    state.guaranteed_count = 5;
    h.repo.save_state(&mut conn, &mut state).await.unwrap();
    drop(conn);

    let receipt = h
        .coordinator
        .draw(&user, &pool, 2, RequestId::generate())
        .await
        .unwrap();
    assert_eq!(receipt.results[0].emission_type, EmissionType::AtCeiling);
    assert_eq!(receipt.results[1].emission_type, EmissionType::Normal);

    let mut conn = h.repo.pool().acquire().await.unwrap();
    let state = h.repo.find_state(&mut conn, &user, &pool).await.unwrap().unwrap();
    assert_eq!((state.pity_count, state.guaranteed_count), (0, 0));
    assert_eq!(state.version, 2);
}

#[tokio::test]
async fn test_pity_counter_clamped_at_ceiling() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 10, 3).await;
    let user = funded_user(&h, 1000, 0).await;

    let receipt = h
        .coordinator
        .draw(&user, &pool, 5, RequestId::generate())
        .await
        .unwrap();
    let labels: Vec<_> = receipt.results.iter().map(|r| r.emission_type).collect();
    assert_eq!(
        labels,
        vec![
            EmissionType::Normal,
            EmissionType::Normal,
            EmissionType::AtCeiling,
            EmissionType::AtCeiling,
            EmissionType::AtCeiling
        ]
    );

    let mut conn = h.repo.pool().acquire().await.unwrap();
    let state = h.repo.find_state(&mut conn, &user, &pool).await.unwrap().unwrap();
    assert_eq!(state.pity_count, 3);
}

#[tokio::test]
async fn test_history_newest_first() {
    let h = setup_harness().await;
    let pool = register_pool(&h.repo, &h.slime, 10, 90).await;
    let user = funded_user(&h, 1000, 0).await;

    for _ in 0..3 {
        h.coordinator
            .draw(&user, &pool, 1, RequestId::generate())
            .await
            .unwrap();
    }

    let history = h.repo.query_history(&user, 10, 0).await.unwrap();
    assert_eq!(history.len(), 3);
    for pair in history.windows(2) {
        let newer = (pair[0].executed_at, pair[0].request_id);
        let older = (pair[1].executed_at, pair[1].request_id);
        assert!(newer > older);
    }
}
