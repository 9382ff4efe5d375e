use serde_json::Value;
use uuid::Uuid;

/// A push message addressed to one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: Option<Value>,
}

pub mod v1 {
    /// Wire form published for the push-delivery service.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PushNotification {
        #[prost(string, tag = "1")]
        pub user_id: String,
        #[prost(string, tag = "2")]
        pub title: String,
        #[prost(string, tag = "3")]
        pub body: String,
        /// JSON-encoded structured payload, if any.
        #[prost(string, optional, tag = "4")]
        pub data_json: Option<String>,
        #[prost(int64, tag = "5")]
        pub created_at_ms: i64,
    }
}

impl Notification {
    pub fn to_wire(&self, created_at_ms: i64) -> v1::PushNotification {
        v1::PushNotification {
            user_id: self.user_id.to_string(),
            title: self.title.clone(),
            body: self.body.clone(),
            data_json: self.data.as_ref().map(Value::to_string),
            created_at_ms,
        }
    }
}
