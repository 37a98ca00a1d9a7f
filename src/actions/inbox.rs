//! Orders and contact messages: public submissions and their dashboard views.

use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::metrics::{MESSAGES_TOTAL, ORDERS_TOTAL};
use crate::api::validation::{validate_email, validate_phone, validate_required};
use crate::db::{
    ContactInput, Message, MessageStatus, Order, OrderInput, OrderStatus, PricingPlan,
};
use crate::AppState;

/// Record an order for a pricing plan.
///
/// Plan name, price and currency are taken from the stored plan; values sent
/// by the visitor that disagree with it are replaced.
pub async fn place_order(state: &AppState, input: &OrderInput) -> Result<Order, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&input.name, "Name", 120));
    errors.check("email", validate_email(&input.email));
    errors.check("phone", validate_phone(&input.phone));
    errors.check("message", validate_optional_message(&input.message));
    errors.check("planId", validate_required(&input.plan_id, "Plan", 64));
    errors.finish()?;

    let plan = PricingPlan::get_by_id(&state.db, &input.plan_id)
        .await?
        .ok_or_else(|| ApiError::validation_field("planId", "Unknown pricing plan"))?;

    if input.plan != plan.name || input.price != plan.price || input.currency != plan.currency {
        tracing::warn!(
            plan_id = %plan.id,
            sent_plan = %input.plan,
            sent_price = input.price,
            sent_currency = %input.currency,
            "Order plan fields differ from the stored plan, using stored values"
        );
    }

    let input = OrderInput {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.trim().to_string(),
        message: input.message.trim().to_string(),
        plan_id: plan.id,
        plan: plan.name,
        price: plan.price,
        currency: plan.currency,
    };
    let order = Order::create(&state.db, &input).await?;

    metrics::counter!(ORDERS_TOTAL).increment(1);
    tracing::info!(id = %order.id, plan = %order.plan, "Order placed");
    Ok(order)
}

fn validate_optional_message(message: &str) -> Result<(), String> {
    if message.chars().count() > 5000 {
        return Err("Message is too long (max 5000 characters)".to_string());
    }
    Ok(())
}

/// Store a contact-form message. A filled honeypot field rejects the submission.
pub async fn send_message(state: &AppState, input: &ContactInput) -> Result<Message, ApiError> {
    if !input.website_url.trim().is_empty() {
        tracing::warn!(email = %input.email, "Rejected contact submission with filled honeypot");
        return Err(ApiError::bad_request("Submission rejected"));
    }

    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_required(&input.name, "Name", 120));
    errors.check("email", validate_email(&input.email));
    errors.check("phone", validate_phone(&input.phone));
    errors.check("message", validate_required(&input.message, "Message", 5000));
    errors.finish()?;

    let input = ContactInput {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.trim().to_string(),
        message: input.message.trim().to_string(),
        website_url: String::new(),
    };
    let message = Message::create(&state.db, &input).await?;

    metrics::counter!(MESSAGES_TOTAL).increment(1);
    tracing::info!(id = %message.id, "Contact message received");
    Ok(message)
}

pub async fn get_messages(state: &AppState) -> Result<Vec<Message>, ApiError> {
    Ok(Message::list(&state.db).await?)
}

pub async fn mark_message_read(state: &AppState, id: &str) -> Result<Message, ApiError> {
    Message::set_status(&state.db, id, MessageStatus::Read)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found"))
}

pub async fn get_orders(state: &AppState) -> Result<Vec<Order>, ApiError> {
    Ok(Order::list(&state.db).await?)
}

pub async fn update_order_status(state: &AppState, id: &str, status: &str) -> Result<Order, ApiError> {
    let status: OrderStatus = status
        .parse()
        .map_err(|e: String| ApiError::validation_field("status", e))?;
    let order = Order::set_status(&state.db, id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    tracing::info!(%id, %status, "Order status changed");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use crate::test_state;

    fn contact() -> ContactInput {
        ContactInput {
            name: "Ama".into(),
            email: "ama@example.com".into(),
            phone: String::new(),
            message: "We need a new site".into(),
            website_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_honeypot_rejects_submission() {
        let state = test_state().await;
        let input = ContactInput {
            website_url: "http://spam.example".into(),
            ..contact()
        };
        let err = send_message(&state, &input).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert!(get_messages(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_lifecycle() {
        let state = test_state().await;
        let message = send_message(&state, &contact()).await.unwrap();
        assert_eq!(message.status, "new");
        assert_eq!(Message::count_unread(&state.db).await.unwrap(), 1);

        let read = mark_message_read(&state, &message.id).await.unwrap();
        assert_eq!(read.status, "read");
        assert_eq!(Message::count_unread(&state.db).await.unwrap(), 0);
        assert!(mark_message_read(&state, "missing").await.is_err());
    }

    #[tokio::test]
    async fn test_order_copies_plan_fields_and_changes_status() {
        let state = test_state().await;
        let plan = PricingPlan::list(&state.db, None).await.unwrap().remove(1);

        let order = place_order(
            &state,
            &OrderInput {
                name: "Kofi".into(),
                email: "kofi@example.com".into(),
                phone: "+233 24 000 0000".into(),
                message: String::new(),
                plan_id: plan.id.clone(),
                plan: plan.name.clone(),
                price: plan.price,
                currency: plan.currency.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(order.plan_id, plan.id);
        assert_eq!(order.plan, "Growth");
        assert_eq!(order.price, plan.price);
        assert_eq!(order.status, "pending");

        let confirmed = update_order_status(&state, &order.id, "confirmed").await.unwrap();
        assert_eq!(confirmed.status, "confirmed");
        let err = update_order_status(&state, &order.id, "shipped").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(get_orders(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_takes_price_from_stored_plan() {
        let state = test_state().await;
        let growth = PricingPlan::list(&state.db, None).await.unwrap().remove(1);

        let order = place_order(
            &state,
            &OrderInput {
                name: "Kofi".into(),
                email: "kofi@example.com".into(),
                plan_id: growth.id.clone(),
                plan: "Starter".into(),
                price: 1.0,
                currency: "XXX".into(),
                ..OrderInput::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(order.plan, growth.name);
        assert_eq!(order.price, growth.price);
        assert_eq!(order.currency, growth.currency);

        let stored = get_orders(&state).await.unwrap().remove(0);
        assert_eq!(stored.price, growth.price);
    }

    #[tokio::test]
    async fn test_order_for_unknown_plan_is_rejected() {
        let state = test_state().await;
        let err = place_order(
            &state,
            &OrderInput {
                name: "Kofi".into(),
                email: "kofi@example.com".into(),
                plan_id: "nope".into(),
                plan: "Starter".into(),
                ..OrderInput::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.field_errors().contains_key("planId"));
    }
}
