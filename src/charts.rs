use crate::bars::Bar;
use crate::indicators::ema_series;
use crate::screener::{EMA_LONG_SPAN, EMA_SHORT_SPAN};
use anyhow::{Context, Result};
use plotly::common::color::NamedColor;
use plotly::common::{Anchor, Line, Marker, Mode, Orientation, Title};
use plotly::layout::{Axis, AxisType, DragMode, HoverMode, Legend, RangeSlider};
use plotly::{Bar as BarTrace, Candlestick, Configuration, Layout, Plot, Scatter};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Dropped into every category directory so all charts can be opened in one
/// go on Windows.
const OPENER_SCRIPT: &str = include_str!("../assets/open_charts.bat");
const OPENER_NAME: &str = "open_charts.bat";

/// Candlestick pane with both EMA overlays on top, volume bars in a
/// synchronized lower pane. Dates are plotted as categories so non-trading
/// days leave no gaps.
fn build_chart(
    symbol: &str,
    category_label: &str,
    bars: &[Bar],
    ema25: &[f64],
    ema50: &[f64],
) -> Plot {
    let dates: Vec<String> = bars.iter().map(|bar| bar.date.to_string()).collect();
    let opens: Vec<f64> = bars.iter().map(|bar| bar.open).collect();
    let highs: Vec<f64> = bars.iter().map(|bar| bar.high).collect();
    let lows: Vec<f64> = bars.iter().map(|bar| bar.low).collect();
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|bar| bar.volume).collect();

    let candles =
        Candlestick::new(dates.clone(), opens, highs, lows, closes).name("Candlesticks");
    let ema25_trace = Scatter::new(dates.clone(), ema25.to_vec())
        .mode(Mode::Lines)
        .name("EMA 25")
        .line(Line::new().color(NamedColor::Blue));
    let ema50_trace = Scatter::new(dates.clone(), ema50.to_vec())
        .mode(Mode::Lines)
        .name("EMA 50")
        .line(Line::new().color(NamedColor::Red));
    let volume_trace = BarTrace::new(dates, volumes)
        .name("Volume")
        .marker(Marker::new().color(NamedColor::Gray))
        .opacity(0.5)
        .y_axis("y2");

    // Price pane takes the upper 70%, volume the lower 25%, with a small
    // gap between them.
    let layout = Layout::new()
        .title(Title::with_text(format!("{symbol} - {category_label}")))
        .height(700)
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .range_slider(RangeSlider::new().visible(false)),
        )
        .y_axis(Axis::new().domain(&[0.3, 1.0]))
        .y_axis2(Axis::new().domain(&[0.0, 0.25]))
        .hover_mode(HoverMode::X)
        .drag_mode(DragMode::Pan)
        .legend(
            Legend::new()
                .orientation(Orientation::Vertical)
                .y_anchor(Anchor::Top)
                .y(1.0)
                .x_anchor(Anchor::Left)
                .x(0.0),
        );

    let mut plot = Plot::new();
    // Candlestick::new returns an unboxed trace, unlike the other
    // constructors.
    plot.add_trace(Box::new(candles));
    plot.add_trace(ema25_trace);
    plot.add_trace(ema50_trace);
    plot.add_trace(volume_trace);
    plot.set_layout(layout);
    plot.set_configuration(Configuration::new().scroll_zoom(true));
    plot
}

/// Renders one chart per bucket member into `<root>/<category label>/` and
/// copies the opener script alongside. A member whose series no longer
/// supports both EMA spans is warned about and skipped; one bad instrument
/// never stops the rest of the bucket.
pub fn render_bucket(
    root: &Path,
    category_label: &str,
    symbols: &[String],
    series: &HashMap<String, Vec<Bar>>,
) -> Result<usize> {
    let dir = root.join(category_label);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    fs::write(dir.join(OPENER_NAME), OPENER_SCRIPT)
        .with_context(|| format!("copying {OPENER_NAME} into {}", dir.display()))?;

    let mut rendered = 0;
    for symbol in symbols {
        let bars = match series.get(symbol) {
            Some(bars) => bars,
            None => {
                tracing::warn!(symbol, "no series at render time, chart skipped");
                continue;
            }
        };

        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let (ema25, ema50) = match (
            ema_series(&closes, EMA_SHORT_SPAN),
            ema_series(&closes, EMA_LONG_SPAN),
        ) {
            (Some(ema25), Some(ema50)) => (ema25, ema50),
            _ => {
                tracing::warn!(
                    symbol,
                    "not enough data to generate EMA25/EMA50, chart skipped"
                );
                continue;
            }
        };

        let plot = build_chart(symbol, category_label, bars, &ema25, &ema50);
        plot.write_html(dir.join(format!("{symbol}.html")));
        rendered += 1;
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(len: usize) -> Vec<Bar> {
        (0..len)
            .map(|i| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: 1.0,
                high: 1.1,
                low: 0.9,
                close: 1.05,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn chart_carries_all_four_traces() {
        let bars = series(60);
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let ema25 = ema_series(&closes, EMA_SHORT_SPAN).unwrap();
        let ema50 = ema_series(&closes, EMA_LONG_SPAN).unwrap();

        let plot = build_chart("0001.KL", "High Potential Stocks", &bars, &ema25, &ema50);
        let json = plot.to_json();
        assert!(json.contains("candlestick"));
        assert!(json.contains("EMA 25"));
        assert!(json.contains("EMA 50"));
        assert!(json.contains("Volume"));
    }

    #[test]
    fn undersized_series_is_skipped_not_fatal() {
        let dir = std::env::temp_dir().join("klse-ema-screener-chart-test");
        let _ = fs::remove_dir_all(&dir);

        let mut all = HashMap::new();
        all.insert("0001.KL".to_string(), series(30));
        let symbols = vec!["0001.KL".to_string(), "9999.KL".to_string()];

        let rendered = render_bucket(&dir, "High Potential Stocks", &symbols, &all).unwrap();
        assert_eq!(rendered, 0);
        // The opener script is still placed in the created directory.
        assert!(dir.join("High Potential Stocks").join(OPENER_NAME).exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
