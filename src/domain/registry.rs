//! Per-building object model.
//!
//! The registry is populated once per run by replaying the validated dataset
//! and is never mutated afterwards.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::domain::RawReading;

/// A single `(timestamp, value)` reading owned by one building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterEntry {
    timestamp: NaiveDateTime,
    value: f64,
}

impl MeterEntry {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A named building and its readings in ingestion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    name: String,
    records: Vec<MeterEntry>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[MeterEntry] {
        &self.records
    }

    pub fn add_reading(&mut self, entry: MeterEntry) {
        self.records.push(entry);
    }

    /// Sum of every owned reading. Recomputed on each call.
    pub fn total_kwh(&self) -> f64 {
        self.records.iter().map(MeterEntry::value).sum()
    }

    pub fn report_line(&self) -> String {
        format!("{}: {:.2} kWh", self.name, self.total_kwh())
    }
}

/// Buildings keyed by name, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct BuildingRegistry {
    buildings: Vec<Building>,
    index: HashMap<String, usize>,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a validated dataset.
    pub fn from_readings(readings: &[RawReading]) -> Self {
        let mut registry = Self::new();
        registry.load(readings);
        registry
    }

    /// Replay readings in order, creating buildings on first sight.
    pub fn load(&mut self, readings: &[RawReading]) {
        for r in readings {
            let idx = match self.index.get(&r.building) {
                Some(&idx) => idx,
                None => {
                    self.buildings.push(Building::new(r.building.clone()));
                    let idx = self.buildings.len() - 1;
                    self.index.insert(r.building.clone(), idx);
                    idx
                }
            };
            self.buildings[idx].add_reading(MeterEntry::new(r.timestamp, r.kwh));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Building> {
        self.index.get(name).map(|&idx| &self.buildings[idx])
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    /// One `"<name>: <total> kWh"` line per building, in insertion order.
    pub fn reports(&self) -> Vec<String> {
        self.buildings.iter().map(Building::report_line).collect()
    }
}
