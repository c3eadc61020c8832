//! Keeps the partner's monthly subscription in step with their contracts.
//!
//! One provider subscription pays for every monthly contract of a partner:
//! the seat quantity counts them and the metadata lists their ids.

use chrono::DateTime;
use tracing::{debug, error, info, warn};

use crate::billing::{BillingClient, BillingError, NewSubscription, metadata};
use crate::db::{contracts as contract_db, subscriptions as subscription_db};
use crate::errors::{ApiError, Result};
use crate::events::AfterCommit;
use crate::jobs::{payloads, queues};
use crate::models::contracts;
use crate::models::subscriptions::{self, SubscriptionStatus};
use crate::tx::RequestTx;

fn provider_error(context: &'static str, contract_id: uuid::Uuid, e: BillingError) -> ApiError {
    error!(%contract_id, "{context}: {e}");
    ApiError::ExternalService(e)
}

/// Stop billing the contract. A no-op when the contract has no subscription
/// or the provider no longer lists it.
pub async fn disable_monthly_subscription(
    tx: &mut RequestTx,
    billing: &BillingClient,
    contract: &contracts::Model,
) -> Result<()> {
    let Some(subscription_id) = contract.subscription_id else {
        debug!(contract_id = %contract.id, "no subscription to disable");
        return Ok(());
    };
    let Some(local) = subscription_db::get_subscription_by_id(tx.conn(), subscription_id).await?
    else {
        return Ok(());
    };

    let remote = billing
        .retrieve_subscription(&local.provider_subscription_id)
        .await
        .map_err(|e| provider_error("error while retrieving subscription", contract.id, e))?;

    let listed = metadata::parse_contracts(&remote.metadata);
    if !listed.contains(&contract.id) {
        debug!(contract_id = %contract.id, "contract not billed by subscription");
        return Ok(());
    }

    let remaining: Vec<_> = listed.into_iter().filter(|id| *id != contract.id).collect();
    let update = metadata::replace_contracts(&remote.metadata, &remaining);
    let item = remote.first_item()?;

    let quantity = if item.quantity > 1 {
        billing
            .update_item_quantity(&item.id, item.quantity - 1)
            .await
            .map_err(|e| provider_error("error while updating subscription item", contract.id, e))?;
        billing
            .update_subscription(&remote.id, false, &update)
            .await
            .map_err(|e| provider_error("error while updating subscription metadata", contract.id, e))?;
        item.quantity - 1
    } else {
        billing
            .update_subscription(&remote.id, true, &update)
            .await
            .map_err(|e| provider_error("error while cancelling subscription", contract.id, e))?;
        item.quantity
    };

    subscription_db::mirror_provider_state(tx.conn(), local.id, quantity as i32, None).await?;
    info!(contract_id = %contract.id, quantity, "monthly billing disabled for contract");
    Ok(())
}

/// Put a reopened monthly contract back on its partner's subscription,
/// creating the subscription when the partner has none.
pub async fn reconcile_on_reopen(
    tx: &mut RequestTx,
    billing: &BillingClient,
    contract: &contracts::Model,
) -> Result<subscriptions::Model> {
    let partner = contract_db::get_role_by_id(tx.conn(), contract.partner_id)
        .await?
        .ok_or_else(|| ApiError::not_found("contract partner"))?;
    let customer = partner.billing_customer_id.as_deref().ok_or_else(|| {
        ApiError::validation("Contract partner has no billing customer account")
    })?;

    let subscription = match subscription_db::get_active_subscription(tx.conn(), partner.id).await? {
        Some(active) => {
            let remote = billing
                .retrieve_subscription(&active.provider_subscription_id)
                .await
                .map_err(|e| provider_error("error while retrieving subscription", contract.id, e))?;
            let item = remote.first_item()?;

            let quantity = active.quantity + 1;
            billing
                .update_item_quantity(&item.id, i64::from(quantity))
                .await
                .map_err(|e| provider_error("error while updating subscription item", contract.id, e))?;

            let mut listed = metadata::parse_contracts(&remote.metadata);
            if !listed.contains(&contract.id) {
                listed.push(contract.id);
            }
            let updated = billing
                .update_subscription(
                    &remote.id,
                    false,
                    &metadata::replace_contracts(&remote.metadata, &listed),
                )
                .await
                .map_err(|e| provider_error("error while updating subscription metadata", contract.id, e))?;

            let status = SubscriptionStatus::from_provider(&updated.status);
            subscription_db::mirror_provider_state(tx.conn(), active.id, quantity, Some(status))
                .await?;
            contract_db::set_subscription(tx.conn(), contract.id, active.id).await?;

            subscriptions::Model {
                quantity,
                status,
                ..active
            }
        }
        None => {
            let payment_method_id = partner.subscription_payment_method_id.as_deref();
            let source_id = match payment_method_id {
                Some(_) => None,
                None => billing
                    .customer_bank_source(customer)
                    .await
                    .map_err(|e| provider_error("error while listing customer sources", contract.id, e))?,
            };
            if payment_method_id.is_none() && source_id.is_none() {
                warn!(
                    contract_id = %contract.id,
                    partner_role_id = %partner.id,
                    "Contract partner has no subscription payment method and no bank account source"
                );
            }

            let remote = billing
                .create_subscription(NewSubscription {
                    customer,
                    quantity: 1,
                    metadata: metadata::build_contracts(&[contract.id]),
                    payment_method_id,
                    source_id: source_id.as_deref(),
                })
                .await
                .map_err(|e| provider_error("error while creating subscription", contract.id, e))?;

            let created = subscription_db::insert_subscription(
                tx.conn(),
                partner.id,
                remote.id.clone(),
                SubscriptionStatus::from_provider(&remote.status),
                1,
                remote
                    .current_period_end
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            )
            .await?;
            contract_db::set_subscription(tx.conn(), contract.id, created.id).await?;
            created
        }
    };

    if subscription.status != SubscriptionStatus::Active {
        tx.defer(AfterCommit::enqueue(
            queues::CHECK_SUBSCRIPTION_PAID,
            &payloads::CheckSubscriptionPaid {
                contract_id: contract.id,
            },
        )?);
    }

    info!(
        contract_id = %contract.id,
        subscription_id = %subscription.id,
        quantity = subscription.quantity,
        "contract added to monthly subscription"
    );
    Ok(subscription)
}
