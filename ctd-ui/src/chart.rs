//! Chart series assembly
//!
//! Pure transformation from score observations to the series the front end
//! draws: one line per client, an overall mean trajectory when more than
//! one client is present, and the tool's severity bands for background
//! rectangles.

use ctd_common::db::queries::ScorePoint;
use ctd_common::SeverityBand;
use serde::Serialize;
use std::collections::BTreeMap;

/// One vertex of a trajectory line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub session: i64,
    pub score: f64,
}

/// One client's trajectory, points ordered by session
#[derive(Debug, Clone, Serialize)]
pub struct ClientSeries {
    pub client: String,
    pub points: Vec<ChartPoint>,
}

/// Everything the front end needs for one tool chart
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub clients: Vec<ClientSeries>,
    /// Mean score per session rank; present only with more than one client
    pub mean: Option<Vec<ChartPoint>>,
    pub bands: Vec<SeverityBand>,
    pub max_session: i64,
}

/// Assemble chart series from ranked score observations
pub fn build_chart(points: &[ScorePoint], bands: &[SeverityBand]) -> ChartSeries {
    let mut by_client: BTreeMap<&str, Vec<ChartPoint>> = BTreeMap::new();
    for p in points {
        by_client.entry(&p.client).or_default().push(ChartPoint {
            session: p.session,
            score: p.score,
        });
    }
    for series in by_client.values_mut() {
        series.sort_by_key(|p| p.session);
    }

    let max_session = points.iter().map(|p| p.session).max().unwrap_or(0);

    let mean = if by_client.len() > 1 {
        let mut sums: BTreeMap<i64, (f64, u32)> = BTreeMap::new();
        for p in points {
            let entry = sums.entry(p.session).or_insert((0.0, 0));
            entry.0 += p.score;
            entry.1 += 1;
        }
        Some(
            sums.into_iter()
                .map(|(session, (sum, count))| ChartPoint {
                    session,
                    score: sum / count as f64,
                })
                .collect(),
        )
    } else {
        None
    };

    ChartSeries {
        clients: by_client
            .into_iter()
            .map(|(client, points)| ClientSeries {
                client: client.to_string(),
                points,
            })
            .collect(),
        mean,
        bands: bands.to_vec(),
        max_session,
    }
}
