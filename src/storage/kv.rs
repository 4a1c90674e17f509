//! Raw key/value capability set and its implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use hyper::body::HttpBody;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use tokio::sync::RwLock;

use super::{StorageError, StorageResult};

/// The capability set of the hosted key/value service: string keys, string
/// values, prefix listing, and full flush. All operations may suspend and
/// may fail transiently.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
    async fn clear(&self) -> StorageResult<()>;
}

/// HTTP client for the REST key/value service.
///
/// Request shape follows the hosted API: `GET {base}/get/{key}`,
/// `POST {base}/set/{key}` with the value as body, `GET {base}/keys/{prefix}*`,
/// `POST {base}/del/{key}`, `POST {base}/flushall`, all authenticated with a
/// bearer token and answered as a JSON `{"result": ...}` envelope. The
/// endpoint is taken as configured; transport security is terminated in
/// front of it.
pub struct KvClient {
    endpoint: String,
    token: String,
    client: Client<HttpConnector>,
}

impl KvClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
        }
    }

    async fn call(&self, method: Method, path: &str, body: Option<String>) -> StorageResult<String> {
        let uri = format!("{}/{}", self.endpoint, path);
        let request = Request::builder()
            .method(method)
            .uri(&uri)
            .header("Authorization", format!("Bearer {}", self.token))
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| StorageError::Http(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;
        let status = response.status();
        let bytes = read_body(response.into_body()).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(StorageError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// Unwraps the service's `{"result": ...}` envelope. Missing keys come
    /// back as 404s with empty bodies, which read as null results.
    fn result_field(payload: &str) -> StorageResult<serde_json::Value> {
        if payload.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        let envelope: serde_json::Value = serde_json::from_str(payload)?;
        Ok(envelope.get("result").cloned().unwrap_or(serde_json::Value::Null))
    }
}

async fn read_body(mut body: Body) -> StorageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| StorageError::Http(e.to_string()))?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[async_trait]
impl KvBackend for KvClient {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let payload = self.call(Method::GET, &format!("get/{key}"), None).await?;
        match Self::result_field(&payload)? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(value) => Ok(Some(value)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.call(Method::POST, &format!("set/{key}"), Some(value.to_string()))
            .await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let payload = self
            .call(Method::GET, &format!("keys/{prefix}*"), None)
            .await?;
        let keys = match Self::result_field(&payload)? {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(keys)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.call(Method::POST, &format!("del/{key}"), None).await?;
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.call(Method::POST, "flushall", None).await?;
        Ok(())
    }
}

/// In-memory backend. Used by tests and ephemeral setups; handy as a stand-in
/// for the remote service because it speaks the same capability set.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, String>>,
    fail_writes: RwLock<bool>,
    fail_reads: RwLock<bool>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail.
    pub async fn fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    /// Makes every subsequent read fail. Combined with [`fail_writes`] this
    /// simulates an unreachable remote.
    ///
    /// [`fail_writes`]: MemoryKv::fail_writes
    pub async fn fail_reads(&self, fail: bool) {
        *self.fail_reads.write().await = fail;
    }

    async fn check_writable(&self) -> StorageResult<()> {
        if *self.fail_writes.read().await {
            return Err(StorageError::Http("injected write failure".to_string()));
        }
        Ok(())
    }

    async fn check_readable(&self) -> StorageResult<()> {
        if *self.fail_reads.read().await {
            return Err(StorageError::Http("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_readable().await?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable().await?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.check_readable().await?;
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_writable().await?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.check_writable().await?;
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_kv_round_trips_and_lists_by_prefix() {
        let kv = MemoryKv::new();
        kv.set("account:A", "{}").await.unwrap();
        kv.set("transaction:1", "{}").await.unwrap();
        kv.set("tags", "[]").await.unwrap();

        assert_eq!(kv.get("account:A").await.unwrap().as_deref(), Some("{}"));
        assert!(kv.get("account:B").await.unwrap().is_none());
        assert_eq!(kv.list_keys("account:").await.unwrap(), vec!["account:A"]);
        assert_eq!(kv.list_keys("").await.unwrap().len(), 3);

        kv.remove("tags").await.unwrap();
        assert!(kv.get("tags").await.unwrap().is_none());
        kv.clear().await.unwrap();
        assert!(kv.list_keys("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_reject_writes_but_not_reads() {
        let kv = MemoryKv::new();
        kv.set("k", "v").await.unwrap();
        kv.fail_writes(true).await;

        assert!(kv.set("k2", "v").await.is_err());
        assert!(kv.remove("k").await.is_err());
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn result_envelope_unwrapping() {
        let value = KvClient::result_field("{\"result\":\"hello\"}").unwrap();
        assert_eq!(value, serde_json::Value::String("hello".to_string()));
        let missing = KvClient::result_field("{}").unwrap();
        assert!(missing.is_null());
    }
}
