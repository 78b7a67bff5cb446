//! Configuration loading.
//!
//! Settings are read from `config/base.toml` when present; every field
//! is optional in the file and falls back to the engine defaults, so a
//! missing or partial file is never an error at the call sites that
//! use [`AppConfig::settings`].

use anyhow::Result;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub scoring: Option<ScoringConfig>,
    pub decision: Option<DecisionConfig>,
    pub currency: Option<CurrencyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    pub margin_weight: Option<f64>,
    pub demand_weight: Option<f64>,
    pub volume_weight: Option<f64>,
    pub reliability_weight: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DecisionConfig {
    pub buy_score: Option<f64>,
    pub buy_margin_pct: Option<f64>,
    pub renegotiate_score: Option<f64>,
    pub renegotiate_margin_pct: Option<f64>,
    pub source_elsewhere_score: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrencyConfig {
    pub ttl_secs: Option<u64>,
    pub rate_url: Option<String>,
}

/// Resolved settings with all defaults applied.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Composite score weights; must sum to 1.0.
    pub margin_weight: f64,
    pub demand_weight: f64,
    pub volume_weight: f64,
    pub reliability_weight: f64,
    /// Decision thresholds.
    pub buy_score: f64,
    pub buy_margin_pct: f64,
    pub renegotiate_score: f64,
    pub renegotiate_margin_pct: f64,
    pub source_elsewhere_score: f64,
    /// FX cache time-to-live in seconds.
    pub currency_ttl_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            margin_weight: 0.40,
            demand_weight: 0.25,
            volume_weight: 0.20,
            reliability_weight: 0.15,
            buy_score: 75.0,
            buy_margin_pct: 15.0,
            renegotiate_score: 55.0,
            renegotiate_margin_pct: 10.0,
            source_elsewhere_score: 40.0,
            currency_ttl_secs: 3_600,
        }
    }
}

impl AppConfig {
    /// Flatten the optional sections into concrete settings.
    pub fn settings(&self) -> EngineSettings {
        let mut s = EngineSettings::default();
        if let Some(sc) = &self.scoring {
            if let Some(v) = sc.margin_weight {
                s.margin_weight = v;
            }
            if let Some(v) = sc.demand_weight {
                s.demand_weight = v;
            }
            if let Some(v) = sc.volume_weight {
                s.volume_weight = v;
            }
            if let Some(v) = sc.reliability_weight {
                s.reliability_weight = v;
            }
        }
        if let Some(dc) = &self.decision {
            if let Some(v) = dc.buy_score {
                s.buy_score = v;
            }
            if let Some(v) = dc.buy_margin_pct {
                s.buy_margin_pct = v;
            }
            if let Some(v) = dc.renegotiate_score {
                s.renegotiate_score = v;
            }
            if let Some(v) = dc.renegotiate_margin_pct {
                s.renegotiate_margin_pct = v;
            }
            if let Some(v) = dc.source_elsewhere_score {
                s.source_elsewhere_score = v;
            }
        }
        if let Some(cc) = &self.currency {
            if let Some(v) = cc.ttl_secs {
                s.currency_ttl_secs = v;
            }
        }
        s
    }
}

pub fn load_base() -> Result<AppConfig> {
    let s = fs::read_to_string("config/base.toml")?;
    let cfg: AppConfig = toml::from_str(&s)?;
    Ok(cfg)
}

/// Load `config/base.toml` if it exists, otherwise defaults.
pub fn load_or_default() -> EngineSettings {
    load_base().map(|c| c.settings()).unwrap_or_default()
}
