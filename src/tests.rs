use std::str::FromStr;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::handlers::income_sources::ProcessDueResponse;
use crate::schemas::{ApiResponse, ErrorResponse};
use crate::test_utils::setup_test_server;

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = setup_test_server().await;

    let response = server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_create_and_list_users() {
    let (server, _) = setup_test_server().await;

    let response = server
        .post("/api/v1/users")
        .json(&json!({ "id": "auth0|carol", "username": "carol" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<Value> = response.json();
    assert!(body.success);
    assert_eq!(body.data["id"], "auth0|carol");

    let duplicate = server.post("/api/v1/users").json(&json!({ "username": "carol" })).await;
    duplicate.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = duplicate.json();
    assert_eq!(error.code, "VALIDATION_ERROR");

    let listed: ApiResponse<Vec<Value>> = server.get("/api/v1/users").await.json();
    assert_eq!(listed.data.len(), 3);
}

#[tokio::test]
async fn test_salary_processed_on_demand() {
    let (server, _) = setup_test_server().await;

    let response = server
        .post("/api/v1/users/u1/income-sources")
        .json(&json!({
            "source": "Salary",
            "amount": "1000",
            "frequency": "monthly",
            "next_pay_at": "2024-01-01"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: ApiResponse<Value> = response.json();
    assert_eq!(created.data["currency"], "USD");
    assert!(created.data["active"].as_bool().unwrap());

    let first: ApiResponse<ProcessDueResponse> = server
        .post("/api/v1/users/u1/income-sources/process-due")
        .add_query_param("date", "2024-01-01")
        .await
        .json();
    assert_eq!(first.data.created, 1);

    let second: ApiResponse<ProcessDueResponse> = server
        .post("/api/v1/users/u1/income-sources/process-due")
        .add_query_param("date", "2024-01-02")
        .await
        .json();
    assert_eq!(second.data.created, 0);

    let sources: ApiResponse<Vec<Value>> = server.get("/api/v1/users/u1/income-sources").await.json();
    assert_eq!(sources.data[0]["next_pay_at"], "2024-02-01");

    let incomes: ApiResponse<Vec<Value>> = server.get("/api/v1/users/u1/incomes").await.json();
    assert_eq!(incomes.data.len(), 1);
    assert_eq!(incomes.data[0]["source"], "Salary");
    assert_eq!(decimal(&incomes.data[0]["amount"]), Decimal::new(1000, 0));
    assert_eq!(incomes.data[0]["occurrence_date"], "2024-01-01");

    // Other users see nothing.
    let other: ApiResponse<Vec<Value>> = server.get("/api/v1/users/u2/incomes").await.json();
    assert!(other.data.is_empty());
}

#[tokio::test]
async fn test_annual_frequency_rejected_for_income_sources() {
    let (server, _) = setup_test_server().await;

    let response = server
        .post("/api/v1/users/u1/income-sources")
        .json(&json!({ "source": "Dividend", "amount": "10", "frequency": "annually" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert!(!error.success);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let (server, _) = setup_test_server().await;

    let response = server
        .post("/api/v1/users/ghost/incomes")
        .json(&json!({ "source": "Gift", "amount": "5" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "NOT_FOUND");
}

#[tokio::test]
async fn test_deactivated_source_is_skipped() {
    let (server, _) = setup_test_server().await;

    let created: ApiResponse<Value> = server
        .post("/api/v1/users/u1/income-sources")
        .json(&json!({ "source": "Rent income", "amount": "700", "frequency": "weekly", "next_pay_at": "2024-05-06" }))
        .await
        .json();
    let source_id = created.data["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/v1/users/u1/income-sources/{source_id}/active"))
        .json(&json!({ "active": false }))
        .await;
    response.assert_status(StatusCode::OK);

    let processed: ApiResponse<ProcessDueResponse> = server
        .post("/api/v1/users/u1/income-sources/process-due")
        .add_query_param("date", "2024-05-06")
        .await
        .json();
    assert_eq!(processed.data.created, 0);

    server
        .put("/api/v1/users/u1/income-sources/missing/active")
        .json(&json!({ "active": true }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_realized_income_removes_its_source() {
    let (server, _) = setup_test_server().await;

    server
        .post("/api/v1/users/u1/income-sources")
        .json(&json!({ "source": "Salary", "amount": "1000", "frequency": "biweekly", "next_pay_at": "2024-01-05" }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/users/u1/income-sources/process-due")
        .add_query_param("date", "2024-01-05")
        .await
        .assert_status(StatusCode::OK);

    let incomes: ApiResponse<Vec<Value>> = server.get("/api/v1/users/u1/incomes").await.json();
    let income_id = incomes.data[0]["id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/v1/users/u1/incomes/{income_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let sources: ApiResponse<Vec<Value>> = server.get("/api/v1/users/u1/income-sources").await.json();
    assert!(sources.data.is_empty());

    server
        .delete(&format!("/api/v1/users/u1/incomes/{income_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recurring_expense_lifecycle() {
    let (server, _) = setup_test_server().await;

    let created: ApiResponse<Value> = server
        .post("/api/v1/users/u1/expenses")
        .json(&json!({
            "source": "Rent",
            "amount": "1200",
            "currency": "EUR",
            "is_recurring": true,
            "recurrence_frequency": "monthly",
            "next_occurrence_date": "2024-01-31"
        }))
        .await
        .json();
    let template_id = created.data["id"].as_str().unwrap().to_string();

    let processed: ApiResponse<ProcessDueResponse> = server
        .post("/api/v1/users/u1/expenses/process-due")
        .add_query_param("date", "2024-01-31")
        .await
        .json();
    assert_eq!(processed.data.created, 1);

    let template: ApiResponse<Value> = server
        .get(&format!("/api/v1/users/u1/expenses/{template_id}"))
        .await
        .json();
    assert_eq!(template.data["next_occurrence_date"], "2024-02-29");

    let updated = server
        .put(&format!("/api/v1/users/u1/expenses/{template_id}"))
        .json(&json!({ "source": "Rent", "amount": "1250", "currency": "EUR", "is_recurring": true, "recurrence_frequency": "monthly" }))
        .await;
    updated.assert_status(StatusCode::OK);
    let updated: ApiResponse<Value> = updated.json();
    assert_eq!(decimal(&updated.data["amount"]), Decimal::new(1250, 0));
    assert_eq!(updated.data["next_occurrence_date"], "2024-02-29");

    let all: ApiResponse<Vec<Value>> = server.get("/api/v1/users/u1/expenses").await.json();
    assert_eq!(all.data.len(), 2);
    let realized = all.data.iter().find(|e| e["is_recurring"] == false).unwrap();
    assert_eq!(realized["recurring_expense_id"], template_id.as_str());

    server
        .delete(&format!("/api/v1/users/u1/expenses/{template_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/v1/users/u1/expenses/{template_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recurring_expense_without_frequency_is_rejected() {
    let (server, _) = setup_test_server().await;

    let response = server
        .post("/api/v1/users/u1/expenses")
        .json(&json!({ "source": "Gym", "amount": "30", "is_recurring": true }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_user_id_in_process_due() {
    let (server, _) = setup_test_server().await;

    let response = server.post("/api/v1/users/%20/expenses/process-due").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert_eq!(error.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_net_worth() {
    let (server, _) = setup_test_server().await;

    let empty: ApiResponse<Value> = server.get("/api/v1/users/u1/net-worth").await.json();
    assert_eq!(empty.data["currency"], "USD");
    assert_eq!(decimal(&empty.data["net_worth"]), Decimal::ZERO);

    server
        .post("/api/v1/users/u1/incomes")
        .json(&json!({ "source": "Salary", "amount": "3000", "currency": "EUR" }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/users/u1/expenses")
        .json(&json!({ "source": "Groceries", "amount": "250.50", "currency": "EUR" }))
        .await
        .assert_status(StatusCode::CREATED);

    let worth: ApiResponse<Value> = server.get("/api/v1/users/u1/net-worth").await.json();
    assert_eq!(decimal(&worth.data["total_income"]), Decimal::new(3000, 0));
    assert_eq!(decimal(&worth.data["total_expense"]), Decimal::new(25050, 2));
    assert_eq!(decimal(&worth.data["net_worth"]), Decimal::new(274950, 2));
    assert_eq!(worth.data["currency"], "EUR");
}
