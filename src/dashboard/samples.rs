//! Dataset sources
//!
//! Datasets are supplied by an external loader through `DatasetSource`.
//! `SampleDatasets` is a built-in, fully deterministic catalog with the same
//! shape as the tables the explorer pages expect, so the explorer runs
//! without any data files.

use super::dataset::Dataset;
use super::error::{DashboardError, Result};
use polars::prelude::*;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

pub const TIPS: &str = "tips";
pub const STOCKS: &str = "stocks";
pub const EUROPE: &str = "europe";
pub const CPI_GASOLINE: &str = "cpi_gasoline";
pub const SEATTLE_WEATHER: &str = "seattle_weather";
pub const SEATTLE_WEATHER_2023: &str = "seattle_weather_2023";
pub const WIND: &str = "wind";
pub const HOURLY_TEMPERATURE: &str = "hourly_temperature";

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Supplies tabular datasets by name
pub trait DatasetSource {
    fn load(&self, name: &str) -> Result<Arc<Dataset>>;
}

/// Built-in deterministic sample catalog
#[derive(Debug, Clone)]
pub struct SampleDatasets {
    datasets: HashMap<String, Arc<Dataset>>,
}

impl SampleDatasets {
    /// Generate every sample dataset once
    pub fn new() -> Result<Self> {
        let builders: [(&str, fn() -> PolarsResult<DataFrame>); 8] = [
            (TIPS, tips),
            (STOCKS, stocks),
            (EUROPE, europe),
            (CPI_GASOLINE, cpi_gasoline),
            (SEATTLE_WEATHER, || seattle_weather(2014..=2023)),
            (SEATTLE_WEATHER_2023, || seattle_weather(2023..=2023)),
            (WIND, wind),
            (HOURLY_TEMPERATURE, hourly_temperature),
        ];

        let mut datasets = HashMap::new();
        for (name, build) in builders {
            let df = build()?;
            log::debug!(
                "SampleDatasets: '{}' ({} rows, {} columns)",
                name,
                df.height(),
                df.width()
            );
            datasets.insert(name.to_string(), Arc::new(Dataset::new(name, df)));
        }

        Ok(Self { datasets })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.datasets.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl DatasetSource for SampleDatasets {
    fn load(&self, name: &str) -> Result<Arc<Dataset>> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| DashboardError::not_found("dataset", name))
    }
}

/// Small linear congruential generator, uniform in [0, 1)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next()
    }
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

fn tips() -> PolarsResult<DataFrame> {
    let mut rng = Lcg(1);
    let days = ["Sun", "Sat", "Thur", "Fri"];
    let weights = [0.31, 0.36, 0.25, 0.08];

    let mut day = Vec::new();
    let mut total_bill = Vec::new();
    let mut tip = Vec::new();
    let mut size = Vec::new();
    for _ in 0..120 {
        let r = rng.next();
        let mut acc = 0.0;
        let mut pick = days[days.len() - 1];
        for (d, w) in days.iter().zip(weights) {
            acc += w;
            if r < acc {
                pick = *d;
                break;
            }
        }
        let bill = round_to(rng.uniform(5.0, 45.0), 2);
        day.push(pick);
        total_bill.push(bill);
        tip.push(round_to(bill * rng.uniform(0.1, 0.22), 2));
        size.push(1 + (bill / 10.0) as i64);
    }

    df! {
        "total_bill" => total_bill,
        "tip" => tip,
        "day" => day,
        "size" => size
    }
}

fn stocks() -> PolarsResult<DataFrame> {
    let mut rng = Lcg(7);
    let mut date = Vec::new();
    let mut aapl = Vec::new();
    let mut price = 1.0;

    // Weekly closes relative to the first week, two years from 2018-01-01
    let (mut year, mut month, mut day) = (2018u32, 1u32, 1u32);
    for _ in 0..105 {
        date.push(format!("{:04}-{:02}-{:02}", year, month, day));
        aapl.push(round_to(price, 4));
        price *= 1.0 + rng.uniform(-0.04, 0.05);

        day += 7;
        let mut dim = DAYS_IN_MONTH[(month - 1) as usize];
        if month == 2 && year % 4 == 0 {
            dim += 1;
        }
        if day > dim {
            day -= dim;
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
    }

    df! {
        "date" => date,
        "AAPL" => aapl
    }
}

fn europe() -> PolarsResult<DataFrame> {
    // (country, iso, EU member, GDP per capita, male, female life expectancy)
    let rows: [(&str, &str, bool, f64, f64, f64); 24] = [
        ("Austria", "AUT", true, 56033.0, 79.4, 84.2),
        ("Belgium", "BEL", true, 53475.0, 79.9, 84.2),
        ("Bulgaria", "BGR", true, 15885.0, 71.4, 78.6),
        ("Croatia", "HRV", true, 21867.0, 75.4, 81.6),
        ("Czechia", "CZE", true, 30427.0, 76.3, 82.1),
        ("Denmark", "DNK", true, 67967.0, 80.0, 83.6),
        ("Finland", "FIN", true, 52925.0, 79.1, 84.3),
        ("France", "FRA", true, 44461.0, 80.0, 85.7),
        ("Germany", "DEU", true, 52746.0, 78.6, 83.3),
        ("Greece", "GRC", true, 22990.0, 79.1, 84.2),
        ("Hungary", "HUN", true, 22142.0, 73.5, 80.0),
        ("Ireland", "IRL", true, 103685.0, 81.4, 84.6),
        ("Italy", "ITA", true, 38373.0, 81.1, 85.2),
        ("Netherlands", "NLD", true, 64572.0, 80.4, 83.4),
        ("Poland", "POL", true, 22113.0, 74.7, 82.0),
        ("Portugal", "PRT", true, 27275.0, 79.3, 84.7),
        ("Romania", "ROU", true, 18419.0, 72.8, 79.9),
        ("Spain", "ESP", true, 32677.0, 81.1, 86.3),
        ("Sweden", "SWE", true, 55517.0, 81.7, 84.9),
        ("Norway", "NOR", false, 87962.0, 81.6, 84.6),
        ("Switzerland", "CHE", false, 99995.0, 82.2, 85.9),
        ("United Kingdom", "GBR", false, 48867.0, 79.0, 82.9),
        ("Serbia", "SRB", false, 11361.0, 73.2, 78.4),
        ("Iceland", "ISL", false, 78811.0, 81.0, 84.0),
    ];

    let countries: Vec<&str> = rows.iter().map(|r| r.0).collect();
    let iso: Vec<&str> = rows.iter().map(|r| r.1).collect();
    let eu: Vec<&str> = rows
        .iter()
        .map(|r| if r.2 { "EU" } else { "Non-EU" })
        .collect();
    let gdp: Vec<f64> = rows.iter().map(|r| r.3).collect();
    let male: Vec<f64> = rows.iter().map(|r| r.4).collect();
    let female: Vec<f64> = rows.iter().map(|r| r.5).collect();
    let gap: Vec<f64> = rows.iter().map(|r| round_to(r.5 - r.4, 1)).collect();
    let all: Vec<f64> = rows
        .iter()
        .map(|r| round_to((r.4 + r.5) / 2.0, 1))
        .collect();

    df! {
        "Countries" => countries,
        "iso_alpha3" => iso,
        "European Union" => eu,
        "GDP per capita (US$)" => gdp,
        "Male" => male,
        "Female" => female,
        "Sex gap" => gap,
        "All" => all
    }
}

fn cpi_gasoline() -> PolarsResult<DataFrame> {
    let mut rng = Lcg(13);
    let mut year = Vec::new();
    let mut month = Vec::new();
    let mut change = Vec::new();

    for y in 2013..=2023 {
        for (m, name) in MONTHS.iter().enumerate() {
            let t = (y - 2013) as f64 + m as f64 / 12.0;
            // Slow cycle with the 2015 slump and the 2022 spike
            let base = 12.0 * (t * PI / 3.5).sin()
                - 25.0 * (-(t - 2.5).powi(2) / 0.8).exp()
                + 45.0 * (-(t - 9.4).powi(2) / 0.4).exp();
            year.push(y.to_string());
            month.push(*name);
            change.push(round_to(base + rng.uniform(-4.0, 4.0), 1));
        }
    }

    df! {
        "year" => year,
        "month" => month,
        "change" => change
    }
}

fn seattle_weather(years: std::ops::RangeInclusive<i64>) -> PolarsResult<DataFrame> {
    let mut rng = Lcg(42);
    let mut year = Vec::new();
    let mut month = Vec::new();
    let mut n_month = Vec::new();
    let mut day = Vec::new();
    let mut tmax = Vec::new();

    for y in years {
        let mut doy = 0u32;
        for (m, name) in MONTHS.iter().enumerate() {
            for d in 1..=DAYS_IN_MONTH[m] {
                doy += 1;
                let seasonal = 13.0 - 10.5 * (2.0 * PI * (doy as f64 + 10.0) / 365.0).cos();
                year.push(y);
                month.push(*name);
                n_month.push(m as i64 + 1);
                day.push(d as i64);
                tmax.push(round_to(seasonal + rng.uniform(-3.5, 3.5), 1));
            }
        }
    }

    df! {
        "year" => year,
        "month" => month,
        "n_month" => n_month,
        "day" => day,
        "tmax" => tmax
    }
}

fn wind() -> PolarsResult<DataFrame> {
    let mut rng = Lcg(1);
    let direction: Vec<f64> = (0..24).map(|i| 360.0 * i as f64 / 23.0).collect();
    let speed: Vec<f64> = (0..24).map(|_| rng.uniform(5.0, 10.0)).collect();

    df! {
        "direction" => direction,
        "speed" => speed
    }
}

fn hourly_temperature() -> PolarsResult<DataFrame> {
    let hour: Vec<i64> = (0..24).collect();
    // Warmer day, cooler night
    let temperature: Vec<f64> = hour
        .iter()
        .map(|&h| 8.0 + 9.0 * (1.0 + ((h as f64 - 6.0) * PI / 12.0).sin()))
        .collect();

    df! {
        "hour" => hour,
        "temperature" => temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads_every_dataset() {
        let samples = SampleDatasets::new().unwrap();
        for name in [
            TIPS,
            STOCKS,
            EUROPE,
            CPI_GASOLINE,
            SEATTLE_WEATHER,
            SEATTLE_WEATHER_2023,
            WIND,
            HOURLY_TEMPERATURE,
        ] {
            let ds = samples.load(name).unwrap();
            assert!(ds.nrow() > 0, "{} is empty", name);
        }
        assert!(matches!(
            samples.load("gapminder"),
            Err(DashboardError::NotFound { .. })
        ));
    }

    #[test]
    fn test_samples_are_deterministic() {
        let a = SampleDatasets::new().unwrap();
        let b = SampleDatasets::new().unwrap();
        let ta = a.load(TIPS).unwrap();
        let tb = b.load(TIPS).unwrap();
        assert_eq!(
            ta.f64_values("tip").unwrap(),
            tb.f64_values("tip").unwrap()
        );
    }

    #[test]
    fn test_hourly_temperature_shape() {
        let samples = SampleDatasets::new().unwrap();
        let ds = samples.load(HOURLY_TEMPERATURE).unwrap();
        let temps = ds.f64_values_or_nan("temperature").unwrap();
        assert_eq!(temps.len(), 24);
        // Peak at noon: 8 + 9 * 2
        assert!((temps[12] - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_weather_has_short_months() {
        let samples = SampleDatasets::new().unwrap();
        let ds = samples.load(SEATTLE_WEATHER_2023).unwrap();
        assert_eq!(ds.nrow(), 365);
        let grid = ds.grid("n_month", "day", "tmax").unwrap();
        assert_eq!(grid.x.len(), 12);
        assert_eq!(grid.y.len(), 31);
        // No February 30th
        assert_eq!(grid.z[29][1], None);
    }
}
