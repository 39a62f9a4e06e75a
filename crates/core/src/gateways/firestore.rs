use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::watch;

use crate::errors::CoreError;
use crate::models::document::{Collection, Document, Fields};
use crate::models::settings::FirestoreSettings;
use super::traits::{StorageGateway, Subscription};

const NAME: &str = "Firestore";
const LIST_PAGE_SIZE: &str = "300";

/// Firestore REST (v1) adapter.
///
/// - **Writes**: `POST` to create, `PATCH` with an update mask to update,
///   `DELETE` to remove. Updates and deletes carry
///   `currentDocument.exists=true`, so a missing id fails instead of
///   silently creating a document.
/// - **Subscriptions**: the REST API has no push channel, so each
///   subscription re-reads its collection every `poll_interval_secs` and
///   publishes only when the snapshot changed.
#[derive(Debug, Clone)]
pub struct FirestoreGateway {
    client: Client,
    settings: FirestoreSettings,
}

impl FirestoreGateway {
    pub fn new(settings: FirestoreSettings) -> Result<Self, CoreError> {
        settings.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    /// `{base}/projects/{project}/databases/{database}/documents`
    #[must_use]
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.project_id,
            self.settings.database
        )
    }

    #[must_use]
    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.documents_url(), collection.name())
    }

    #[must_use]
    pub fn document_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn check(
        response: Response,
        collection: Collection,
        id: Option<&str>,
    ) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(CoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }
        let body = response.text().await.unwrap_or_default();
        Err(CoreError::Storage {
            gateway: NAME.into(),
            message: format!("{collection}: HTTP {status}: {}", error_message(&body)),
        })
    }

    async fn poll(self, collection: Collection, sender: watch::Sender<Vec<Document>>) {
        let period = Duration::from_secs(self.settings.poll_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately and the initial load is already published
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if sender.is_closed() {
                break;
            }
            match self.list_once(collection).await {
                Ok(documents) => {
                    sender.send_if_modified(|current| {
                        if *current == documents {
                            false
                        } else {
                            *current = documents;
                            true
                        }
                    });
                }
                Err(e) => tracing::warn!("polling {collection} failed: {e}"),
            }
        }
        tracing::debug!("stopped polling {collection}");
    }
}

// ── Firestore REST response types ───────────────────────────────────

/// A document as returned by the REST API.
#[derive(Debug, Deserialize)]
pub struct FirestoreDocument {
    /// Full resource name, ending in `/{collection}/{id}`
    pub name: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

impl FirestoreDocument {
    pub fn into_document(self) -> Document {
        Document::new(document_id(&self.name), decode_fields(&self.fields))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ── Value codec ─────────────────────────────────────────────────────

/// Last path segment of a document resource name.
#[must_use]
pub fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

/// Plain fields → Firestore `fields` object.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Value::Object(encoded)
}

/// Plain JSON value → Firestore typed value.
///
/// Integers become `integerValue` (sent as a string, as the API expects);
/// every other number becomes `doubleValue`.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Firestore `fields` object → plain fields.
#[must_use]
pub fn decode_fields(fields: &serde_json::Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Firestore typed value → plain JSON value. Unknown shapes decode to null.
#[must_use]
pub fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = typed.get("stringValue") {
        return s.clone();
    }
    if let Some(b) = typed.get("booleanValue") {
        return b.clone();
    }
    if let Some(i) = typed.get("integerValue") {
        return match i {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(d) = typed.get("doubleValue") {
        return match d {
            // NaN/Infinity are sent as strings
            Value::String(s) => s.parse::<f64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(t) = typed.get("timestampValue") {
        return t.clone();
    }
    if let Some(array) = typed.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }
    Value::Null
}

#[async_trait]
impl StorageGateway for FirestoreGateway {
    fn name(&self) -> &str {
        NAME
    }

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, CoreError> {
        let initial = self.list_once(collection).await?;
        let (sender, receiver) = watch::channel(initial);
        let task = tokio::spawn(self.clone().poll(collection, sender));
        tracing::info!(
            "subscribed to {collection} (polling every {}s)",
            self.settings.poll_interval_secs
        );
        Ok(Subscription::with_task(collection, receiver, task))
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, CoreError> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": encode_fields(&fields) }));
        let response = self.authorized(request).send().await?;
        let response = Self::check(response, collection, None).await?;

        let created: FirestoreDocument = response.json().await.map_err(|e| CoreError::Storage {
            gateway: NAME.into(),
            message: format!("Failed to parse created {collection} document: {e}"),
        })?;
        Ok(document_id(&created.name))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), CoreError> {
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }));
        let response = self.authorized(request).send().await?;
        Self::check(response, collection, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        let request = self
            .client
            .delete(self.document_url(collection, id))
            .query(&[("currentDocument.exists", "true")]);
        let response = self.authorized(request).send().await?;
        Self::check(response, collection, Some(id)).await?;
        Ok(())
    }

    async fn list_once(&self, collection: Collection) -> Result<Vec<Document>, CoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.collection_url(collection))
                .query(&[("pageSize", LIST_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = self.authorized(request).send().await?;
            let response = Self::check(response, collection, None).await?;

            let page: ListResponse = response.json().await.map_err(|e| CoreError::Storage {
                gateway: NAME.into(),
                message: format!("Failed to parse {collection} listing: {e}"),
            })?;
            documents.extend(page.documents.into_iter().map(FirestoreDocument::into_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }
}
