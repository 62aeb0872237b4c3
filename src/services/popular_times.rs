//! 热门时段直方图
//!
//! 页面为每个星期画一张柱状图：若干小时标签 + 每小时一根柱子，
//! 柱子的无障碍标签里写着热门程度百分比。

use serde::Deserialize;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::RenderingSession;
use crate::models::{HourOccupancy, PopularTimesHistogram, Weekday};
use crate::selectors;
use crate::services::field_extractor;
use crate::utils::text::{histogram_hour, parse_occupancy_percent, start_hour_from_label};

/// 一张图的原始文本
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDayGraph {
    pub labels: Vec<String>,
    pub bars: Vec<String>,
}

fn histogram_script() -> String {
    format!(
        r#"(() => JSON.stringify(Array.from(document.querySelectorAll({graph})).map((g) => ({{
            labels: Array.from(g.querySelectorAll({label})).map((l) => (l.textContent || '').trim()),
            bars: Array.from(g.querySelectorAll({bar})).map((b) => b.getAttribute('aria-label') || ''),
        }}))))()"#,
        graph = serde_json::Value::String(selectors::POPULAR_TIMES_GRAPH.to_string()),
        label = serde_json::Value::String(selectors::POPULAR_TIMES_LABEL.to_string()),
        bar = serde_json::Value::String(selectors::POPULAR_TIMES_BAR.to_string()),
    )
}

/// 读取页面上的直方图
pub async fn read_histogram<S: RenderingSession>(session: &S) -> AppResult<PopularTimesHistogram> {
    let value = session.evaluate_structured(&histogram_script()).await?;
    let graphs: Vec<RawDayGraph> = field_extractor::decode(value)?;
    Ok(build_histogram(&graphs))
}

/// 把原始文本转换成直方图
///
/// 起始小时取自第一个能解析的小时标签（减去它的下标）；
/// 没有任何可用标签的图跳过。百分比无法解析的柱子跳过，但仍占一个小时位。
pub fn build_histogram(graphs: &[RawDayGraph]) -> PopularTimesHistogram {
    let mut histogram = PopularTimesHistogram::new();
    for (day, graph) in Weekday::ALL.into_iter().zip(graphs) {
        let Some(start_hour) = graph
            .labels
            .iter()
            .enumerate()
            .find_map(|(index, label)| {
                start_hour_from_label(label).map(|hour| ((hour as i64 - index as i64).rem_euclid(24)) as u8)
            })
        else {
            debug!("星期 {} 的图表没有小时标签，跳过", day);
            continue;
        };

        let hours = graph
            .bars
            .iter()
            .enumerate()
            .filter_map(|(bar_index, label)| {
                parse_occupancy_percent(label).map(|occupancy_percent| HourOccupancy {
                    hour: histogram_hour(start_hour, bar_index),
                    occupancy_percent,
                })
            })
            .collect();
        histogram.insert(day, hours);
    }
    histogram
}
