use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::models::subscriptions::{self, SubscriptionStatus};

/// The role's active subscription, if any.
pub async fn get_active_subscription<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
) -> Result<Option<subscriptions::Model>, DbErr> {
    subscriptions::Entity::find()
        .filter(subscriptions::Column::RoleId.eq(role_id))
        .filter(subscriptions::Column::Active.eq(true))
        .order_by_desc(subscriptions::Column::CreatedAt)
        .one(db)
        .await
}

pub async fn get_subscription_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<subscriptions::Model>, DbErr> {
    subscriptions::Entity::find_by_id(id).one(db).await
}

pub async fn insert_subscription<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
    provider_subscription_id: String,
    status: SubscriptionStatus,
    quantity: i32,
    access_expiration_date: Option<DateTime<Utc>>,
) -> Result<subscriptions::Model, DbErr> {
    subscriptions::ActiveModel {
        id: Set(Uuid::new_v4()),
        role_id: Set(role_id),
        active: Set(true),
        provider_subscription_id: Set(provider_subscription_id),
        status: Set(status),
        quantity: Set(quantity),
        access_expiration_date: Set(access_expiration_date),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// Mirror the provider's seat count, and status when known.
pub async fn mirror_provider_state<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    quantity: i32,
    status: Option<SubscriptionStatus>,
) -> Result<(), DbErr> {
    let mut changes = subscriptions::ActiveModel {
        quantity: Set(quantity),
        ..Default::default()
    };
    if let Some(status) = status {
        changes.status = Set(status);
    }

    subscriptions::Entity::update_many()
        .set(changes)
        .filter(subscriptions::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}
