//! エラーメッセージ抽出
//!
//! バックエンドのエラー形式は統一されていないため、
//! `message` → `error`（文字列 or `{message}`）→ 本文 → 既定文言 の順に探す。

use serde_json::Value;

/// 本文をそのまま表示する上限
const MAX_RAW_BODY: usize = 200;

/// HTTPエラー応答から表示用メッセージを取り出す
pub fn extract_error_message(status: u16, body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(m) = structured_message(&json) {
            return m;
        }
    } else {
        let trimmed = body.trim();
        if !trimmed.is_empty() && trimmed.len() <= MAX_RAW_BODY && !trimmed.starts_with('<') {
            return trimmed.to_string();
        }
    }

    format!("{} (HTTP {})", fallback, status)
}

/// 200応答でも `{success:false, message}` を返す場合に使う
pub fn structured_message(json: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

    if let Some(m) = json.get("message").and_then(non_empty) {
        return Some(m);
    }

    match json.get("error") {
        Some(v @ Value::String(_)) => non_empty(v),
        Some(Value::Object(obj)) => obj.get("message").and_then(non_empty),
        _ => None,
    }
}

/// 通信エラー（応答なし）のメッセージ
pub fn transport_message(err: &reqwest::Error, fallback: &str) -> String {
    if err.is_timeout() {
        return format!("{}: request timed out", fallback);
    }
    let text = err.to_string();
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        format!("{}: {}", fallback, text)
    }
}
