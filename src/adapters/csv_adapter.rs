//! CSV file data adapter.
//!
//! Layout under the base directory:
//!
//! ```text
//! symbols.csv            symbol,name,sector,is_active,list_start_date
//! prices/<SYMBOL>.csv    date,open,high,low,close,volume[,turnover][,adj_close]
//! index/<NAME>.csv       date,close
//! ```

use crate::domain::error::TrendrankError;
use crate::domain::ohlcv::{IndexBar, PriceBar, build_index_history};
use crate::domain::universe::SymbolInfo;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SymbolRecord {
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sector: String,
    #[serde(default)]
    is_active: Option<String>,
    #[serde(default)]
    list_start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    turnover: Option<f64>,
    #[serde(default)]
    adj_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IndexRecord {
    date: NaiveDate,
    close: f64,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn symbols_path(&self) -> PathBuf {
        self.base_path.join("symbols.csv")
    }

    fn price_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("prices").join(format!("{}.csv", symbol))
    }

    fn index_path(&self, name: &str) -> PathBuf {
        self.base_path.join("index").join(format!("{}.csv", name))
    }

    /// Deserialize every row of `path`. A missing file reads as no rows.
    fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TrendrankError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).map_err(|e| TrendrankError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        rdr.deserialize()
            .map(|result| {
                result.map_err(|e| TrendrankError::DataSource {
                    reason: format!("CSV parse error in {}: {}", path.display(), e),
                })
            })
            .collect()
    }
}

impl DataPort for CsvAdapter {
    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TrendrankError> {
        let records: Vec<SymbolRecord> = Self::read_records(&self.symbols_path())?;

        let mut symbols = records
            .into_iter()
            .map(|r| {
                let is_active = match r.is_active.as_deref().map(str::trim) {
                    None | Some("") => true,
                    Some(v) => parse_bool(v).ok_or_else(|| TrendrankError::DataSource {
                        reason: format!("invalid is_active value for {}: {}", r.symbol, v),
                    })?,
                };
                Ok(SymbolInfo {
                    symbol: r.symbol.to_uppercase(),
                    name: r.name,
                    sector: r.sector,
                    is_active,
                    list_start_date: r.list_start_date,
                })
            })
            .collect::<Result<Vec<_>, TrendrankError>>()?;

        symbols.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(symbols)
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TrendrankError> {
        let records: Vec<PriceRecord> = Self::read_records(&self.price_path(symbol))?;

        let mut bars: Vec<PriceBar> = records
            .into_iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .map(|r| {
                let mut bar =
                    PriceBar::new(symbol, r.date, r.open, r.high, r.low, r.close, r.volume);
                if let Some(turnover) = r.turnover {
                    bar.turnover = turnover;
                }
                if let Some(adj_close) = r.adj_close {
                    bar.adj_close = adj_close;
                }
                bar
            })
            .collect();

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_index(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IndexBar>, TrendrankError> {
        let records: Vec<IndexRecord> = Self::read_records(&self.index_path(name))?;
        let closes = records
            .into_iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .map(|r| (r.date, r.close))
            .collect();
        Ok(build_index_history(closes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::create_dir_all(path.join("prices")).unwrap();
        fs::create_dir_all(path.join("index")).unwrap();

        fs::write(
            path.join("symbols.csv"),
            "symbol,name,sector,is_active,list_start_date\n\
             thyao,Turk Hava Yollari,Transportation,true,1990-12-20\n\
             GARAN,Garanti BBVA,Banking,1,\n\
             OLD,Delisted Co,,false,\n",
        )
        .unwrap();

        fs::write(
            path.join("prices").join("THYAO.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n",
        )
        .unwrap();

        fs::write(
            path.join("prices").join("GARAN.csv"),
            "date,open,high,low,close,volume,turnover,adj_close\n\
             2024-01-15,50.0,51.0,49.0,50.5,1000,60000,50.0\n\
             2024-01-16,50.5,52.0,50.0,51.5,1200,,\n",
        )
        .unwrap();

        fs::write(
            path.join("index").join("XU100.csv"),
            "date,close\n2024-01-15,8000\n2024-01-16,8100\n2024-01-17,8050\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn list_symbols_reads_metadata() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0].symbol, "GARAN");
        assert!(symbols[0].is_active);
        assert_eq!(symbols[0].list_start_date, None);
        assert_eq!(symbols[1].symbol, "OLD");
        assert!(!symbols[1].is_active);
        assert_eq!(symbols[1].sector, "");
        assert_eq!(symbols[2].symbol, "THYAO");
        assert_eq!(symbols[2].list_start_date, Some(date(1990, 12, 20)));
    }

    #[test]
    fn list_symbols_empty_without_file() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter.list_symbols().unwrap().is_empty());
    }

    #[test]
    fn fetch_ohlcv_sorts_and_derives_turnover() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_ohlcv("THYAO", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(2024, 1, 15));
        assert_eq!(bars[0].symbol, "THYAO");
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].volume, 50000.0);
        assert_eq!(bars[0].turnover, 105.0 * 50000.0);
        assert_eq!(bars[0].adj_close, 105.0);
    }

    #[test]
    fn fetch_ohlcv_uses_supplied_turnover() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_ohlcv("GARAN", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(bars[0].turnover, 60000.0);
        assert_eq!(bars[0].adj_close, 50.0);
        // Empty optional cells fall back to derived values.
        assert_eq!(bars[1].turnover, 51.5 * 1200.0);
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = date(2024, 1, 16);
        let bars = adapter.fetch_ohlcv("THYAO", day, day).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);
    }

    #[test]
    fn fetch_ohlcv_missing_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let bars = adapter
            .fetch_ohlcv("XYZ", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn fetch_ohlcv_malformed_row_is_an_error() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("prices").join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);
        let result = adapter.fetch_ohlcv("BAD", date(2024, 1, 1), date(2024, 1, 31));
        assert!(matches!(result, Err(TrendrankError::DataSource { .. })));
    }

    #[test]
    fn fetch_index_attaches_ema() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let index = adapter
            .fetch_index("XU100", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index[0].ema50, 8000.0);
        assert!(index[1].ema50 > 8000.0 && index[1].ema50 < 8100.0);
    }
}
