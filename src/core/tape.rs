//! Immutable price and return tapes shared by every agent of a run.

use std::collections::HashSet;

use super::error::{GymError, Result};
use super::types::{Price, Timestamp};

/// Time-ordered instrument prices plus a constant synthetic cash column.
///
/// Rows are indexed by strictly increasing timestamps; the cash column is
/// always the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTape {
    symbols: Vec<String>,
    timestamps: Vec<Timestamp>,
    rows: Vec<Vec<Price>>,
}

impl PriceTape {
    /// Build a tape with the default cash column (`"CASH"` at 1.0).
    ///
    /// # Arguments
    /// * `universe` - Instrument identifiers (without cash)
    /// * `timestamps` - Strictly increasing index
    /// * `rows` - One price row per timestamp, `universe.len()` wide
    pub fn new(
        universe: Vec<String>,
        timestamps: Vec<Timestamp>,
        rows: Vec<Vec<Price>>,
    ) -> Result<Self> {
        Self::with_cash(universe, timestamps, rows, "CASH", 1.0)
    }

    /// Build a tape with an explicit cash column.
    pub fn with_cash(
        universe: Vec<String>,
        timestamps: Vec<Timestamp>,
        rows: Vec<Vec<Price>>,
        cash_symbol: &str,
        cash_price: Price,
    ) -> Result<Self> {
        if universe.is_empty() {
            return Err(GymError::empty_data("universe"));
        }

        let mut seen = HashSet::with_capacity(universe.len() + 1);
        for symbol in universe.iter().map(String::as_str).chain([cash_symbol]) {
            if !seen.insert(symbol) {
                return Err(GymError::type_mismatch(format!(
                    "duplicate instrument identifier `{}`",
                    symbol
                )));
            }
        }

        if timestamps.len() < 2 {
            return Err(GymError::insufficient_data(2, timestamps.len()));
        }
        if rows.len() != timestamps.len() {
            return Err(GymError::length_mismatch(timestamps.len(), rows.len()));
        }
        if let Some(w) = timestamps.windows(2).find(|w| w[1] <= w[0]) {
            return Err(GymError::type_mismatch(format!(
                "timestamps must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        if !(cash_price.is_finite() && cash_price > 0.0) {
            return Err(GymError::invalid_parameter(format!(
                "cash price must be finite and positive, got {}",
                cash_price
            )));
        }

        let width = universe.len();
        let mut full_rows = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(GymError::length_mismatch(width, row.len()));
            }
            if let Some(bad) = row.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
                return Err(GymError::invalid_parameter(format!(
                    "price at timestamp {} must be finite and positive, got {}",
                    timestamps[i], bad
                )));
            }
            let mut row = row;
            row.push(cash_price);
            full_rows.push(row);
        }

        let mut symbols = universe;
        symbols.push(cash_symbol.to_string());

        Ok(Self {
            symbols,
            timestamps,
            rows: full_rows,
        })
    }

    /// Build a tape from column-major price series.
    pub fn from_columns(
        universe: Vec<String>,
        timestamps: Vec<Timestamp>,
        columns: Vec<Vec<Price>>,
    ) -> Result<Self> {
        if columns.len() != universe.len() {
            return Err(GymError::length_mismatch(universe.len(), columns.len()));
        }
        let n = timestamps.len();
        if let Some(col) = columns.iter().find(|c| c.len() != n) {
            return Err(GymError::length_mismatch(n, col.len()));
        }
        let rows = (0..n)
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect();
        Self::new(universe, timestamps, rows)
    }

    /// Number of timestamps.
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if empty (never true for a constructed tape).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Index of the last timestamp.
    #[inline]
    pub fn last_index(&self) -> usize {
        self.len() - 1
    }

    /// Number of columns including cash.
    #[inline]
    pub fn num_assets(&self) -> usize {
        self.symbols.len()
    }

    /// All column identifiers, cash last.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Instrument identifiers without the cash column.
    pub fn universe(&self) -> &[String] {
        &self.symbols[..self.symbols.len() - 1]
    }

    /// Identifier of the cash column.
    pub fn cash_symbol(&self) -> &str {
        &self.symbols[self.symbols.len() - 1]
    }

    /// The full index.
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Timestamp at `index`.
    #[inline]
    pub fn timestamp(&self, index: usize) -> Option<Timestamp> {
        self.timestamps.get(index).copied()
    }

    /// Price row at `index`.
    #[inline]
    pub fn row(&self, index: usize) -> Option<&[Price]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Price series of one column.
    pub fn column(&self, symbol: &str) -> Option<Vec<Price>> {
        let j = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.rows.iter().map(|r| r[j]).collect())
    }

    /// Period-over-period relative changes.
    pub fn returns(&self) -> ReturnTape {
        let rows = self
            .rows
            .windows(2)
            .map(|w| {
                w[1].iter()
                    .zip(w[0].iter())
                    .map(|(curr, prev)| (curr - prev) / prev)
                    .collect()
            })
            .collect();

        ReturnTape {
            symbols: self.symbols.clone(),
            timestamps: self.timestamps[1..].to_vec(),
            rows,
        }
    }
}

/// Relative price changes derived from a [`PriceTape`].
///
/// Holds one row fewer than its source: row `k` is the return realized
/// between price rows `k` and `k + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTape {
    symbols: Vec<String>,
    timestamps: Vec<Timestamp>,
    rows: Vec<Vec<f64>>,
}

impl ReturnTape {
    /// Number of return rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column identifiers, cash last.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Index (the price index without its first timestamp).
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Return row `k` of this tape.
    #[inline]
    pub fn row(&self, k: usize) -> Option<&[f64]> {
        self.rows.get(k).map(Vec::as_slice)
    }

    /// Return realized at price index `index` (None for index 0).
    #[inline]
    pub fn at_price_index(&self, index: usize) -> Option<&[f64]> {
        index.checked_sub(1).and_then(|k| self.row(k))
    }

    /// All rows in time order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}
