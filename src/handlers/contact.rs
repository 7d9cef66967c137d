use axum::{Json, extract::State, http::StatusCode};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::handlers::register::not_blank;
use crate::models::{Contact, InquiryKind, NewContact};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[garde(length(chars, min = 1, max = 100), custom(not_blank))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(max = 30))]
    pub phone: Option<String>,
    #[garde(length(chars, max = 200))]
    pub subject: Option<String>,
    #[garde(length(chars, min = 1, max = 5000), custom(not_blank))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
}

/// POST /contact
///
/// 担当者への通知はバックグラウンドで送信（レスポンスは待たない）
pub async fn submit_contact(
    State(state): State<AppState>,
    AppJson(request): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    request.validate()?;

    let contact = state
        .contact_service
        .submit(NewContact {
            kind: InquiryKind::Contact,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone,
            company: None,
            subject: request.subject,
            message: request.message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ContactResponse { id: contact.id })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvestmentInquiryRequest {
    #[garde(length(chars, min = 1, max = 100), custom(not_blank))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(max = 30))]
    pub phone: Option<String>,
    #[garde(length(chars, max = 200))]
    pub company: Option<String>,
    #[garde(length(chars, max = 200))]
    pub subject: Option<String>,
    #[garde(length(chars, min = 1, max = 5000), custom(not_blank))]
    pub message: String,
}

/// POST /investment-inquiry
///
/// お問い合わせと同じ経路で保存・通知する
pub async fn submit_investment_inquiry(
    State(state): State<AppState>,
    AppJson(request): AppJson<InvestmentInquiryRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    request.validate()?;

    let inquiry = state
        .contact_service
        .submit(NewContact {
            kind: InquiryKind::Investment,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone,
            company: request.company.map(|c| c.trim().to_string()),
            subject: request.subject,
            message: request.message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ContactResponse { id: inquiry.id })))
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<Contact>,
}

/// GET /admin/contacts（要管理者）
pub async fn list_contacts(
    State(state): State<AppState>,
) -> Result<Json<ContactListResponse>, AppError> {
    let contacts = state.contact_service.list().await?;
    Ok(Json(ContactListResponse { contacts }))
}
