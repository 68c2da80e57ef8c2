//! `rollupindex watch`: print the latest epoch whenever it changes.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use rollupindex_core::{Epoch, IndexStore};

use crate::output::{epoch_line, render};

/// Poll `store` every `every` until `shutdown` resolves.
///
/// Returns the number of epochs printed.
pub async fn run<W: Write>(
    store: &dyn IndexStore,
    every: Duration,
    json: bool,
    shutdown: impl Future<Output = ()>,
    out: &mut W,
) -> Result<usize> {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut last: Option<Epoch> = None;
    let mut printed = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(printed, "interrupt received, stopping watch");
                break;
            }
            _ = ticker.tick() => {
                let Some(epoch) = store.latest_epoch()? else {
                    debug!("no epoch yet");
                    continue;
                };
                if last.as_ref() != Some(&epoch) {
                    writeln!(out, "{}", render(&epoch, json, epoch_line)?)?;
                    out.flush()?;
                    printed += 1;
                    last = Some(epoch);
                }
            }
        }
    }
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollupindex_core::{BlockHeader, Chain, HeaderStore, RawHeader};
    use rollupindex_storage::InMemoryStorage;

    fn header(number: u64, timestamp: u64) -> BlockHeader {
        BlockHeader::from_raw(RawHeader {
            number,
            timestamp,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn prints_each_epoch_once() {
        let store = InMemoryStorage::new();
        store.store_headers(Chain::L1, &[header(100, 1_000)]).unwrap();
        store.store_headers(Chain::L2, &[header(500, 1_000)]).unwrap();

        let mut out = Vec::new();
        let printed = run(
            &store,
            Duration::from_millis(5),
            false,
            tokio::time::sleep(Duration::from_millis(60)),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(printed, 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("L1 #100"));
    }

    #[tokio::test]
    async fn empty_store_prints_nothing() {
        let store = InMemoryStorage::new();
        let mut out = Vec::new();
        let printed = run(
            &store,
            Duration::from_millis(5),
            true,
            tokio::time::sleep(Duration::from_millis(20)),
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(printed, 0);
        assert!(out.is_empty());
    }
}
