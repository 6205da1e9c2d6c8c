//! scenarios.rs — injectable fault scenarios
//!
//! Each scenario exercises one failure mode of the engine. They compose:
//! several can be active in one run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    /// Provider error after `signal_loss_after_secs` — engine must go idle
    /// with full region cleanup.
    SignalLoss,
    /// Receiver never determines a heading (negative course fixes) — rings
    /// are still planted, course normalized.
    MissingCourse,
    /// Region monitoring unsupported — engine degrades to continuous-only.
    NoGeofencing,
    /// Every Nth provider callback carries no usable fix — exercises the
    /// bounded restart-retry path.
    EmptyFixes,
    /// The app never backgrounds — no ring is ever planted.
    ForegroundHold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub active: Vec<ScenarioType>,
    pub signal_loss_after_secs: f64,
    /// 0 disables; N delivers an empty callback every Nth fix.
    pub empty_fix_every_n: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            signal_loss_after_secs: 60.0,
            empty_fix_every_n: 0,
        }
    }
}

impl ScenarioConfig {
    pub fn has(&self, s: &ScenarioType) -> bool {
        self.active.contains(s)
    }
}

pub fn preset(name: &str) -> Option<ScenarioConfig> {
    let cfg = match name {
        "default" => ScenarioConfig::default(),
        "signal_loss" => ScenarioConfig {
            active: vec![ScenarioType::SignalLoss],
            signal_loss_after_secs: 30.0,
            ..Default::default()
        },
        "no_course" => ScenarioConfig {
            active: vec![ScenarioType::MissingCourse],
            ..Default::default()
        },
        "no_geofencing" => ScenarioConfig {
            active: vec![ScenarioType::NoGeofencing],
            ..Default::default()
        },
        "empty_fixes" => ScenarioConfig {
            active: vec![ScenarioType::EmptyFixes],
            empty_fix_every_n: 4,
            ..Default::default()
        },
        "foreground" => ScenarioConfig {
            active: vec![ScenarioType::ForegroundHold],
            ..Default::default()
        },
        _ => return None,
    };
    Some(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve() {
        for name in ["default", "signal_loss", "no_course", "no_geofencing", "empty_fixes", "foreground"] {
            assert!(preset(name).is_some(), "missing preset {name}");
        }
        assert!(preset("unknown").is_none());
    }

    #[test]
    fn empty_fixes_preset_enables_counter() {
        let cfg = preset("empty_fixes").unwrap();
        assert!(cfg.has(&ScenarioType::EmptyFixes));
        assert!(cfg.empty_fix_every_n > 0);
    }
}
