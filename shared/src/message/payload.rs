use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Order, OrderItem, OrderStatus, User};

// ==================== USER_DATA ====================

/// Session summary handed to the frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub is_logged_in: bool,
}

/// `USER_DATA_RESPONSE` body; `user` is `null` when nobody is signed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub user: Option<UserSummary>,
}

// ==================== ORDER_CREATED ====================

/// `ORDER_CREATED` body (frame -> host)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<f64>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub success: bool,
    pub order_id: String,
}

// ==================== CHECKOUT ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
}

// ==================== FETCH ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchUsersResponse {
    pub users: Vec<User>,
}

// ==================== UPDATE_ORDER_STATUS ====================

/// `UPDATE_ORDER_STATUS` body
///
/// Fields are optional on purpose: absence is reported as a missing-field
/// error by the lifecycle check, not as a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusPayload {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
    /// Client-side timestamp, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl UpdateOrderStatusPayload {
    pub fn new(order_id: impl Into<String>, new_status: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            new_status: Some(new_status.into()),
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusResponse {
    pub order_id: String,
    pub new_status: OrderStatus,
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ==================== ADMIN_ACTION ====================

/// Administrative sub-commands nested in `ADMIN_ACTION`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    UpdateOrder,
    ViewUser,
    SendEmail,
}

impl AdminAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AdminAction::UpdateOrder => "UPDATE_ORDER",
            AdminAction::ViewUser => "VIEW_USER",
            AdminAction::SendEmail => "SEND_EMAIL",
        }
    }
}

impl FromStr for AdminAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPDATE_ORDER" => Ok(AdminAction::UpdateOrder),
            "VIEW_USER" => Ok(AdminAction::ViewUser),
            "SEND_EMAIL" => Ok(AdminAction::SendEmail),
            other => Err(AppError::unknown_admin_action(other)),
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ADMIN_ACTION` body
///
/// `action` stays a raw string so unknown actions reach the sub-router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminActionPayload {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl AdminActionPayload {
    pub fn new(action: AdminAction, data: Value) -> Self {
        Self {
            action: action.as_str().to_string(),
            data,
        }
    }
}

/// `UPDATE_ORDER` admin data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateOrder {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `VIEW_USER` admin data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminViewUser {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `SEND_EMAIL` admin data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AdminSendEmail {
    #[validate(email)]
    pub to: String,
    #[validate(length(min = 1))]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// `ADMIN_ACTION_RESPONSE` body
///
/// Action-specific fields (`orderId`, `user`, ...) are flattened next to
/// `action` and `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminActionResponse {
    pub action: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl AdminActionResponse {
    pub fn success(action: AdminAction) -> Self {
        Self {
            action: action.as_str().to_string(),
            success: true,
            error: None,
            details: Map::new(),
        }
    }

    pub fn failure(action: AdminAction, error: impl Into<String>) -> Self {
        Self {
            action: action.as_str().to_string(),
            success: false,
            error: Some(error.into()),
            details: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
