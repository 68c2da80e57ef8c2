//! Human-readable and JSON rendering of stored records.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use rollupindex_core::{BlockHeader, ContractEvent, Epoch, LegacyStateBatch, OutputProposal};

/// Render `value` as pretty JSON, or through `line` for humans.
pub fn render<T: Serialize>(value: &T, json: bool, line: impl FnOnce(&T) -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(line(value))
    }
}

/// Render an optional record; absence is `null` in JSON mode.
pub fn render_opt<T: Serialize>(
    value: &Option<T>,
    json: bool,
    what: &str,
    line: impl FnOnce(&T) -> String,
) -> Result<String> {
    match value {
        Some(v) => render(v, json, line),
        None if json => Ok("null".to_string()),
        None => Ok(format!("no {what} found")),
    }
}

fn time(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "out of range".to_string())
}

pub fn header_line(h: &BlockHeader) -> String {
    format!(
        "#{} {} parent={} ts={} ({})",
        h.number,
        h.hash,
        h.parent_hash,
        h.timestamp,
        time(h.timestamp)
    )
}

pub fn event_line(e: &ContractEvent) -> String {
    format!(
        "{} contract={} sig={} tx={} log={} block={} ts={}",
        e.guid,
        e.contract_address,
        e.event_signature,
        e.transaction_hash,
        e.log_index,
        e.block_hash,
        e.timestamp
    )
}

pub fn epoch_line(e: &Epoch) -> String {
    format!(
        "L1 #{} {} ↔ L2 #{} {} ts={} ({})",
        e.l1.number,
        e.l1.hash,
        e.l2.number,
        e.l2.hash,
        e.l1.timestamp,
        time(e.l1.timestamp)
    )
}

pub fn output_line(p: &OutputProposal) -> String {
    format!(
        "output #{} root={} l2_block={} l1_event={}",
        p.l2_output_index, p.output_root, p.l2_block_number, p.l1_contract_event_guid
    )
}

pub fn batch_line(b: &LegacyStateBatch) -> String {
    format!(
        "batch #{} root={} size={} prev_total={} l1_event={}",
        b.index, b.root, b.size, b.prev_total, b.l1_contract_event_guid
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollupindex_core::RawHeader;

    fn header() -> BlockHeader {
        BlockHeader::from_raw(RawHeader {
            number: 100,
            timestamp: 1_700_000_000,
            ..Default::default()
        })
    }

    #[test]
    fn human_header_line() {
        let line = render(&header(), false, header_line).unwrap();
        assert!(line.starts_with("#100 0x"));
        assert!(line.contains("2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn json_header() {
        let out = render(&header(), true, header_line).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["timestamp"], 1_700_000_000u64);
        assert!(v["raw_header"]["parentHash"].is_string());
    }

    #[test]
    fn absent_record() {
        let none: Option<Epoch> = None;
        assert_eq!(render_opt(&none, true, "epoch", epoch_line).unwrap(), "null");
        assert_eq!(
            render_opt(&none, false, "epoch", epoch_line).unwrap(),
            "no epoch found"
        );
    }
}
