//! Payout claims against a real Postgres.
//!
//! Needs a disposable database:
//! `TEST_DATABASE_URL=postgres://... cargo test --test payout_claim_pg_test -- --ignored`
mod common;

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use uuid::Uuid;

use sitework_backend::create_pool;
use sitework_backend::db::payments as payment_db;
use sitework_backend::models::contracts::Status;
use sitework_backend::models::roles::RoleKind;
use sitework_backend::models::{contracts, payments, phases, roles, tasks};

async fn connect() -> DatabaseConnection {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let db = create_pool(&url).await.expect("connect");
    Migrator::up(&db, None).await.expect("migrate");
    db
}

async fn insert_role(db: &DatabaseConnection, kind: RoleKind) -> roles::Model {
    roles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(Uuid::new_v4()),
        name: Set(kind),
        display_name: Set(None),
        billing_customer_id: Set(None),
        subscription_payment_method_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

/// A hired contract with one phase holding `n` funded tasks.
async fn seed(db: &DatabaseConnection, n: usize) -> (contracts::Model, Vec<Uuid>) {
    let owner = insert_role(db, RoleKind::HomeOwner).await;
    let partner = insert_role(db, RoleKind::Pro).await;

    let contract = common::contract(&(&owner).into(), &(&partner).into(), Status::Hired);
    let contract: contracts::Model = contracts::ActiveModel::from(contract)
        .reset_all()
        .insert(db)
        .await
        .unwrap();

    let phase: phases::Model = phases::ActiveModel::from(common::phase(contract.id, "Build", 1))
        .reset_all()
        .insert(db)
        .await
        .unwrap();

    let mut ids = Vec::new();
    for _ in 0..n {
        let mut payment = common::payment();
        payment.charge_id = None;
        let payment: payments::Model = payments::ActiveModel::from(payment)
            .reset_all()
            .insert(db)
            .await
            .unwrap();

        let mut task = common::task(phase.id, 1, 5);
        task.payment_id = Some(payment.id);
        tasks::ActiveModel::from(task)
            .reset_all()
            .insert(db)
            .await
            .unwrap();
        ids.push(payment.id);
    }

    (contract, ids)
}

#[tokio::test]
#[ignore]
async fn test_unpaid_payments_cover_the_contract() {
    let db = connect().await;
    let (contract, ids) = seed(&db, 3).await;

    let unpaid = payment_db::get_unpaid_payments(&db, contract.id).await.unwrap();
    let mut found: Vec<Uuid> = unpaid.iter().map(|p| p.id).collect();
    let mut expected = ids.clone();
    found.sort();
    expected.sort();
    assert_eq!(found, expected);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_claims_take_each_payment_once() {
    let db = connect().await;
    let (contract, ids) = seed(&db, 2).await;
    let signer = insert_role(&db, RoleKind::HomeOwner).await;

    let claim = |db: DatabaseConnection, ids: Vec<Uuid>, signer: Uuid| async move {
        let txn = db.begin().await.unwrap();
        let esign = payment_db::insert_esign(&txn, signer, "sig".to_string())
            .await
            .unwrap();
        let claimed = payment_db::claim_for_payout(&txn, ids, esign.id, Utc::now())
            .await
            .unwrap();
        txn.commit().await.unwrap();
        claimed.len()
    };

    let (a, b) = tokio::join!(
        claim(db.clone(), ids.clone(), signer.id),
        claim(db.clone(), ids.clone(), signer.id),
    );
    assert_eq!(a + b, ids.len(), "each payment is claimed exactly once");

    let unpaid = payment_db::get_unpaid_payments(&db, contract.id).await.unwrap();
    assert!(unpaid.iter().all(|p| p.payout_requested_at.is_some()));
}
