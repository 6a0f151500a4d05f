//! S&P 500 membership lookup.
//!
//! Static reference data: a bundled CSV of index members (symbol, name, GICS
//! sector), read-only. Callers use it to pick ticker sets by sector without
//! hitting the network.

use super::provider::DataError;
use serde::Deserialize;
use std::path::Path;

/// One index member row.
#[derive(Debug, Clone, Deserialize)]
pub struct SpMember {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Sector", default)]
    pub sector: String,
}

/// S&P 500 membership table.
#[derive(Debug, Clone)]
pub struct SpUniverse {
    members: Vec<SpMember>,
}

impl SpUniverse {
    /// Load the CSV bundled with the crate.
    pub fn bundled() -> Self {
        // The bundled file is under our control, so a parse failure here is a
        // packaging bug rather than a runtime condition.
        Self::from_reader(include_str!("../../assets/sp500.csv").as_bytes())
            .expect("bundled sp500.csv is malformed")
    }

    /// Load a membership CSV from disk.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path).map_err(|e| DataError::MalformedTable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_reader(file).map_err(|reason| DataError::MalformedTable {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_reader(reader: impl std::io::Read) -> Result<Self, String> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut members = Vec::new();
        for record in rdr.deserialize::<SpMember>() {
            members.push(record.map_err(|e| e.to_string())?);
        }
        Ok(Self { members })
    }

    /// All member symbols, in file order.
    pub fn symbols(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.symbol.as_str()).collect()
    }

    /// Symbols belonging to one GICS sector.
    pub fn sector(&self, sector: &str) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.sector == sector)
            .map(|m| m.symbol.as_str())
            .collect()
    }

    /// Distinct sector names, sorted.
    pub fn sectors(&self) -> Vec<&str> {
        let mut sectors: Vec<&str> = self.members.iter().map(|m| m.sector.as_str()).collect();
        sectors.sort_unstable();
        sectors.dedup();
        sectors
    }

    /// All member rows.
    pub fn members(&self) -> &[SpMember] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_universe_parses() {
        let u = SpUniverse::bundled();
        assert!(u.symbols().len() > 30);
        assert!(u.symbols().contains(&"AAPL"));
    }

    #[test]
    fn sector_lookup_filters() {
        let u = SpUniverse::bundled();
        let tech = u.sector("Information Technology");
        assert!(tech.contains(&"MSFT"));
        assert!(!tech.contains(&"JPM"));
    }

    #[test]
    fn sectors_are_distinct_and_sorted() {
        let u = SpUniverse::bundled();
        let sectors = u.sectors();
        assert!(sectors.contains(&"Health Care"));
        let mut sorted = sectors.clone();
        sorted.sort_unstable();
        assert_eq!(sectors, sorted);
    }

    #[test]
    fn unknown_sector_is_empty() {
        let u = SpUniverse::bundled();
        assert!(u.sector("No Such Sector").is_empty());
    }
}
