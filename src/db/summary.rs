//! Queries feeding the contract summary.

use sea_orm::*;
use uuid::Uuid;

use crate::models::{change_orders, view_points};

pub async fn get_change_orders<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Vec<change_orders::Model>, DbErr> {
    change_orders::Entity::find()
        .filter(change_orders::Column::ContractId.eq(contract_id))
        .all(db)
        .await
}

pub async fn get_view_points<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Vec<view_points::Model>, DbErr> {
    view_points::Entity::find()
        .filter(view_points::Column::ContractId.eq(contract_id))
        .order_by_asc(view_points::Column::SeenAt)
        .all(db)
        .await
}
