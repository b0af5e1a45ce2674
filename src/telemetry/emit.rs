use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, Write};

#[derive(Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

pub fn envelope<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<Value> {
    Ok(json!({ "op": op, "result": serde_json::to_value(result)?, "meta": meta }))
}

pub fn print_result<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = envelope(op, result, meta)?;
    let mut out = io::stdout();
    serde_json::to_writer(&mut out, &env)?;
    writeln!(&mut out)?;
    Ok(())
}
