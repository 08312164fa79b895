use crate::screener::{Category, Classification};
use comfy_table::{
    Attribute, Cell, CellAlignment, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};
use std::collections::HashMap;

pub const HIGH_POTENTIAL_LABEL: &str = "High Potential Stocks";

/// Per-run bucket membership. Each category bucket keeps evaluation order;
/// the high-potential list is independent and may overlap with any bucket.
/// Built fresh per run and never mutated after the run completes.
#[derive(Debug, Default)]
pub struct ScreenReport {
    buckets: HashMap<Category, Vec<String>>,
    high_potential: Vec<String>,
}

impl ScreenReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: &str, classification: Classification) {
        if classification.high_potential {
            self.high_potential.push(symbol.to_string());
        }
        self.buckets
            .entry(classification.category)
            .or_default()
            .push(symbol.to_string());
    }

    pub fn members(&self, category: Category) -> &[String] {
        self.buckets.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn high_potential(&self) -> &[String] {
        &self.high_potential
    }

    /// Total instruments that passed the gate and matched a branch; the sum
    /// of the category buckets, excluding the overlapping high-potential
    /// list.
    pub fn classified_total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Prints the per-bucket membership lines followed by a count table.
    pub fn print_summary(&self) {
        println!(
            "\n{} ({}): {:?}",
            HIGH_POTENTIAL_LABEL,
            self.high_potential.len(),
            self.high_potential
        );
        for category in Category::ALL {
            let members = self.members(category);
            println!("\n{} ({}): {:?}", category.label(), members.len(), members);
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_BORDERS_ONLY)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Bucket").add_attribute(Attribute::Bold),
                Cell::new("Count")
                    .add_attribute(Attribute::Bold)
                    .set_alignment(CellAlignment::Right),
            ]);

        table.add_row(vec![
            Cell::new(HIGH_POTENTIAL_LABEL),
            Cell::new(self.high_potential.len()).set_alignment(CellAlignment::Right),
        ]);
        for category in Category::ALL {
            table.add_row(vec![
                Cell::new(category.label()),
                Cell::new(self.members(category).len()).set_alignment(CellAlignment::Right),
            ]);
        }

        println!("\n{table}");
    }
}
