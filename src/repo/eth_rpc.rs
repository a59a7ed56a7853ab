// src/repo/eth_rpc.rs — Minimal Ethereum JSON-RPC client for contract reads

use serde_json::{json, Value};
use sha3::{Digest, Keccak256};

use crate::infra::errors::EngineError;

const SOURCE: &str = "eth_rpc";

pub struct EthRpcClient {
    client: reqwest::Client,
    url: String,
}

impl EthRpcClient {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    /// `eth_call` against the latest block, returning the raw return data.
    pub async fn eth_call(&self, to: &str, calldata: &[u8]) -> Result<Vec<u8>, EngineError> {
        let response = self
            .rpc_call(
                "eth_call",
                json!([{"to": to, "data": format!("0x{}", hex::encode(calldata))}, "latest"]),
            )
            .await?;
        let raw = response
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::fetch(SOURCE, "eth_call result was missing"))?;
        decode_hex_blob(raw).map_err(|e| EngineError::fetch(SOURCE, e))
    }

    /// Call a no-argument view function returning `string`.
    pub async fn call_string(&self, to: &str, signature: &str) -> Result<String, EngineError> {
        let data = self.eth_call(to, &selector(signature)).await?;
        decode_abi_string(&data)
            .map_err(|e| EngineError::fetch(SOURCE, format!("{signature} on {to}: {e}")))
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, EngineError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::fetch(SOURCE, format!("{method} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::fetch(
                SOURCE,
                format!("{method} returned HTTP {status}"),
            ));
        }

        let value: Value = resp.json().await.map_err(|e| {
            EngineError::fetch(SOURCE, format!("failed to parse {method} response JSON: {e}"))
        })?;
        if let Some(error) = value.get("error") {
            return Err(EngineError::fetch(
                SOURCE,
                format!("rpc returned error for {method}: {error}"),
            ));
        }
        Ok(value)
    }
}

/// First four bytes of keccak256 of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn decode_hex_blob(raw: &str) -> Result<Vec<u8>, String> {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| "eth_call result must be 0x-prefixed hex".to_string())?;
    hex::decode(without_prefix).map_err(|e| format!("eth_call result is not valid hex: {e}"))
}

/// Decode ABI-encoded return data holding a single dynamic `string`.
pub fn decode_abi_string(data: &[u8]) -> Result<String, String> {
    if data.is_empty() {
        return Err("empty return data (no such function?)".into());
    }
    let offset = read_word_usize(data, 0)?;
    let len = read_word_usize(data, offset)?;
    let start = offset
        .checked_add(32)
        .ok_or_else(|| "string offset overflows".to_string())?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| "string length overflows".to_string())?;
    let bytes = data
        .get(start..end)
        .ok_or_else(|| format!("string of {len} bytes runs past the {} byte payload", data.len()))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| format!("string is not UTF-8: {e}"))
}

fn read_word_usize(data: &[u8], at: usize) -> Result<usize, String> {
    let word = at
        .checked_add(32)
        .and_then(|end| data.get(at..end))
        .ok_or_else(|| format!("word at {at} is out of bounds"))?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(format!("word at {at} does not fit in 64 bits"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|_| format!("word at {at} is too large"))
}
