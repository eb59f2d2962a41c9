//! Redis Store Module
//!
//! `Store` implementation over a single multiplexed connection to a Redis
//! compatible server.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Value;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// Connection to a remote Redis server.
///
/// The multiplexed connection is cheap to clone and pipelines concurrent
/// requests over one socket, so every call works on its own clone.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Opens the connection described by `config`.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(connection_url(config).as_str())
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("KEYS")
            .arg(pattern)
            .query_async::<Vec<String>>(&mut conn)
            .await?)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await?)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await?)
    }

    async fn set_ex(&self, key: &str, seconds: u64, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await?)
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key);
        }
        Ok(cmd.query_async::<u64>(&mut conn).await?)
    }

    async fn incr_by(&self, key: &str, by: i64) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("INCRBY")
            .arg(key)
            .arg(by)
            .query_async::<i64>(&mut conn)
            .await?)
    }

    async fn command(&self, name: &str, args: &[String]) -> StoreResult<JsonValue> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd(name);
        for arg in args {
            cmd.arg(arg);
        }
        let reply = cmd.query_async::<Value>(&mut conn).await?;
        Ok(reply_to_json(reply))
    }

    async fn quit(&self) {
        let mut conn = self.conn.clone();
        if let Err(err) = redis::cmd("QUIT").query_async::<()>(&mut conn).await {
            debug!("QUIT failed while closing store connection: {}", err);
        }
    }
}

/// Builds the `redis://` URL for `config`.
///
/// The password goes in the userinfo part, percent-encoded.
pub fn connection_url(config: &StoreConfig) -> String {
    let host = if config.host.contains(':') && !config.host.starts_with('[') {
        format!("[{}]", config.host)
    } else {
        config.host.clone()
    };

    match config.password.as_deref() {
        Some(password) if !password.is_empty() => format!(
            "redis://:{}@{}:{}/",
            percent_encode(password),
            host,
            config.port
        ),
        _ => format!("redis://{}:{}/", host, config.port),
    }
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Converts a raw reply into JSON.
pub fn reply_to_json(value: Value) -> JsonValue {
    match value {
        Value::Nil => JsonValue::Null,
        Value::Int(n) => JsonValue::from(n),
        Value::BulkString(bytes) => JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()),
        Value::SimpleString(s) => JsonValue::String(s),
        Value::Okay => JsonValue::String("OK".to_string()),
        Value::Array(items) | Value::Set(items) => {
            JsonValue::Array(items.into_iter().map(reply_to_json).collect())
        }
        Value::Map(pairs) => {
            let mut map = Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = match reply_to_json(k) {
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                };
                map.insert(key, reply_to_json(v));
            }
            JsonValue::Object(map)
        }
        Value::Double(d) => Number::from_f64(d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::VerbatimString { text, .. } => JsonValue::String(text),
        other => JsonValue::String(format!("{:?}", other)),
    }
}
