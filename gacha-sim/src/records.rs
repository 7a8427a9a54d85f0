//! Persistable record of a single simulation.
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use gacha_engine::{ItemId, Request};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::batch::RunOutcome;

/// A finished run together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub request: Request,
    pub seed: u64,
    pub iteration: u64,
    pub item_ids: Vec<ItemId>,
    pub goals_achieved: bool,
    pub money_spent: f64,
    pub created_at: String,
}

impl SimulationRecord {
    #[must_use]
    pub fn from_outcome(request: &Request, outcome: &RunOutcome, created_at: DateTime<Utc>) -> Self {
        Self {
            request: request.clone(),
            seed: outcome.seed,
            iteration: outcome.iteration,
            item_ids: outcome.result.item_ids(),
            goals_achieved: outcome.result.goals_achieved,
            money_spent: outcome.result.money_spent,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Write records as a pretty JSON array.
pub fn write_records(writer: &mut dyn Write, records: &[SimulationRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, records).context("serializing records")?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gacha_engine::{DrawResult, Item, Tier};

    #[test]
    fn record_echoes_request_and_result() {
        let request = Request {
            tiers: vec![Tier::new(1, 1, vec![Item::new(5, 1)])],
            items_included: true,
            ..Request::default()
        };
        let outcome = RunOutcome {
            seed: 9,
            iteration: 2,
            result: DrawResult {
                items: vec![Item::new(5, 1), Item::new(5, 1)],
                goals_achieved: false,
                money_spent: 20.0,
            },
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let record = SimulationRecord::from_outcome(&request, &outcome, at);
        assert_eq!(record.item_ids, vec![5, 5]);
        assert_eq!(record.created_at, "2024-03-01T12:00:00Z");

        let mut buffer = Vec::new();
        write_records(&mut buffer, std::slice::from_ref(&record)).unwrap();
        let decoded: Vec<SimulationRecord> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(decoded, vec![record]);
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"itemIds\""));
        assert!(text.contains("\"itemsIncluded\": true"));
    }
}
