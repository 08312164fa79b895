use crate::bars::Bar;
use crate::indicators::ema_series;

pub const EMA_SHORT_SPAN: usize = 25;
pub const EMA_LONG_SPAN: usize = 50;

/// Penny-stock floor: instruments whose latest close is under RM 0.30 are
/// dropped before any classification.
pub const MIN_LAST_CLOSE: f64 = 0.3;

/// Mutually exclusive buckets, decided by a priority cascade over the last
/// session relative to the two EMAs. `Unclassified` holds instruments that
/// pass the uptrend gate but match no branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    AboveBothEmas,
    BetweenEmas,
    AboveEma25Only,
    Unclassified,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::AboveBothEmas,
        Category::BetweenEmas,
        Category::AboveEma25Only,
        Category::Unclassified,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::AboveBothEmas => "Uptrend stocks above EMA 25 and EMA 50",
            Category::BetweenEmas => "Stocks between EMA 25 and EMA 50",
            Category::AboveEma25Only => "Stocks breakthrough EMA 25",
            Category::Unclassified => "Unclassified uptrend stocks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: Category,
    /// Independent momentum flag; can co-occur with any category.
    pub high_potential: bool,
}

/// Classifies one instrument from its series and EMA sequences. `None`
/// means excluded from every bucket: fewer than two sessions, an empty EMA
/// sequence, a latest close under the floor, or EMA-25 not above EMA-50
/// (the uptrend gate).
pub fn classify(bars: &[Bar], ema25: &[f64], ema50: &[f64]) -> Option<Classification> {
    if bars.len() < 2 {
        return None;
    }
    let last = bars.last()?;
    let prev = &bars[bars.len() - 2];
    let ema25_last = *ema25.last()?;
    let ema50_last = *ema50.last()?;

    if last.close < MIN_LAST_CLOSE || ema25_last <= ema50_last {
        return None;
    }

    let high_potential = last.close > ema25_last
        && last.open > ema50_last
        && last.close > ema50_last
        && last.close > prev.close
        && last.volume > prev.volume
        && last.close > last.open
        && last.close > prev.open;

    // Priority cascade: first branch that holds wins, keeping the three
    // positional buckets mutually exclusive.
    let category = if last.open > ema25_last
        && last.close > ema25_last
        && last.open > ema50_last
        && last.close > ema50_last
    {
        Category::AboveBothEmas
    } else if ema25_last < last.open
        && last.open < ema50_last
        && ema25_last < last.close
        && last.close < ema50_last
    {
        Category::BetweenEmas
    } else if last.close > ema25_last {
        Category::AboveEma25Only
    } else {
        Category::Unclassified
    };

    Some(Classification {
        category,
        high_potential,
    })
}

/// The full per-instrument pass: derive both EMA sequences, then classify.
/// A series too short for either span is excluded outright.
pub fn evaluate(bars: &[Bar]) -> Option<Classification> {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let ema25 = ema_series(&closes, EMA_SHORT_SPAN)?;
    let ema50 = ema_series(&closes, EMA_LONG_SPAN)?;
    classify(bars, &ema25, &ema50)
}
