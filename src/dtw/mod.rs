//! Launching the external DTW classifier.
//!
//! The executable takes `name value` pairs and bare mode words on its
//! command line and reports progress on stdout. [`DtwParameters`] builds that
//! argument list; [`runner::DtwTask`] runs the process and streams its output.

pub mod runner;

pub use runner::{DtwCommand, DtwTask, TaskEvent, TaskOutcome};

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DtwError;

// ---------------------------------------------------------------------------
// Mode flags
// ---------------------------------------------------------------------------

/// Classification modes passed as bare words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DtwFlag {
    /// Plain k-nearest-neighbour voting.
    Knn,
    /// KNN over phoneme groups.
    Group,
    /// KNN over voiced / unvoiced / silence.
    Voiced,
    /// Frame-by-frame zero-crossing features.
    Zc,
    /// Frame-by-frame short-time energy features.
    Ste,
    /// Boundary detection during testing; enables the threshold parameters.
    Bounds,
}

impl DtwFlag {
    pub const ALL: [DtwFlag; 6] = [
        DtwFlag::Knn,
        DtwFlag::Group,
        DtwFlag::Voiced,
        DtwFlag::Zc,
        DtwFlag::Ste,
        DtwFlag::Bounds,
    ];

    pub fn as_arg(self) -> &'static str {
        match self {
            DtwFlag::Knn => "KNN",
            DtwFlag::Group => "GROUP",
            DtwFlag::Voiced => "VOICED",
            DtwFlag::Zc => "ZC",
            DtwFlag::Ste => "STE",
            DtwFlag::Bounds => "BOUNDS",
        }
    }
}

/// Which recordings the executable trains and tests on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeakerSet {
    #[default]
    All,
    Female,
    Male,
    Spkr1,
}

impl SpeakerSet {
    pub const ALL: [SpeakerSet; 4] = [
        SpeakerSet::All,
        SpeakerSet::Female,
        SpeakerSet::Male,
        SpeakerSet::Spkr1,
    ];

    /// Command-line word, `None` for the full corpus.
    pub fn as_arg(self) -> Option<&'static str> {
        match self {
            SpeakerSet::All => None,
            SpeakerSet::Female => Some("FEMALE"),
            SpeakerSet::Male => Some("MALE"),
            SpeakerSet::Spkr1 => Some("SPKR1"),
        }
    }

    pub fn label(self) -> &'static str {
        self.as_arg().unwrap_or("ALL")
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Numeric parameters, always passed in this order.
pub const NUMERIC_PARAMETERS: [&str; 13] = [
    "paa",
    "window",
    "banks",
    "paa_op",
    "dtw_window",
    "interval_div",
    "nfft",
    "trunc",
    "mfccs",
    "knn",
    "group_k",
    "voice_k",
    "test_iter",
];

/// Boundary-detection thresholds, passed only with [`DtwFlag::Bounds`].
pub const BOUNDS_PARAMETERS: [&str; 5] = ["zc_incr", "ste_incr", "entr_incr", "neg_incr", "larg_incr"];

/// Everything the DTW executable can be told on its command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DtwParameters {
    /// Decimation factor for piecewise aggregate approximation.
    pub paa: i64,
    /// Hanning window width in samples.
    pub window: i64,
    /// Mel filter banks.
    pub banks: i64,
    /// `0` enables PAA, `1` disables it.
    pub paa_op: i64,
    /// Warping window limit, in thousandths of the sequence length.
    pub dtw_window: i64,
    /// Window overlap divisor.
    pub interval_div: i64,
    pub nfft: i64,
    /// Coefficients kept from the filter bank.
    pub trunc: i64,
    /// MFCC limit per phoneme.
    pub mfccs: i64,
    pub knn: i64,
    pub group_k: i64,
    pub voice_k: i64,
    pub test_iter: i64,

    pub zc_incr: i64,
    pub ste_incr: i64,
    pub entr_incr: i64,
    pub neg_incr: i64,
    pub larg_incr: i64,

    pub speakers: SpeakerSet,
    pub flags: BTreeSet<DtwFlag>,
}

impl Default for DtwParameters {
    fn default() -> Self {
        DtwParameters {
            paa: 2,
            window: 128,
            banks: 40,
            paa_op: 0,
            dtw_window: 200,
            interval_div: 2,
            nfft: 512,
            trunc: 24,
            mfccs: 99999,
            knn: 7,
            group_k: 7,
            voice_k: 7,
            test_iter: 1,
            zc_incr: 95,
            ste_incr: 85000,
            entr_incr: 400,
            neg_incr: -300,
            larg_incr: 1000,
            speakers: SpeakerSet::All,
            flags: BTreeSet::new(),
        }
    }
}

impl DtwParameters {
    pub fn get(&self, name: &str) -> Result<i64, DtwError> {
        Ok(*self.slot(name)?)
    }

    pub fn set(&mut self, name: &str, value: i64) -> Result<(), DtwError> {
        *self.slot_mut(name)? = value;
        Ok(())
    }

    /// Parse `text` as the new value of `name`. Surrounding whitespace is ignored.
    pub fn set_text(&mut self, name: &str, text: &str) -> Result<(), DtwError> {
        let value = text.trim().parse::<i64>().map_err(|_| DtwError::InvalidValue {
            name: name.to_string(),
            text: text.to_string(),
        })?;
        self.set(name, value)
    }

    pub fn has_flag(&self, flag: DtwFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn set_flag(&mut self, flag: DtwFlag, on: bool) {
        if on {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    /// The executable's argument list.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut push_pairs = |names: &[&str]| {
            for &name in names {
                // Names come from the constant tables, which `slot` always knows.
                if let Ok(value) = self.get(name) {
                    args.push(name.to_string());
                    args.push(value.to_string());
                }
            }
        };
        push_pairs(&NUMERIC_PARAMETERS);
        if self.has_flag(DtwFlag::Bounds) {
            push_pairs(&BOUNDS_PARAMETERS);
        }
        if let Some(word) = self.speakers.as_arg() {
            args.push(word.to_string());
        }
        args.extend(self.flags.iter().map(|f| f.as_arg().to_string()));
        args
    }

    pub fn load(path: &Path) -> Result<Self, DtwError> {
        let text = fs::read_to_string(path).map_err(|source| DtwError::PresetIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DtwError::PresetFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DtwError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| DtwError::PresetFormat {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| DtwError::PresetIo {
            path: path.to_path_buf(),
            source,
        })
    }

    fn slot(&self, name: &str) -> Result<&i64, DtwError> {
        Ok(match name {
            "paa" => &self.paa,
            "window" => &self.window,
            "banks" => &self.banks,
            "paa_op" => &self.paa_op,
            "dtw_window" => &self.dtw_window,
            "interval_div" => &self.interval_div,
            "nfft" => &self.nfft,
            "trunc" => &self.trunc,
            "mfccs" => &self.mfccs,
            "knn" => &self.knn,
            "group_k" => &self.group_k,
            "voice_k" => &self.voice_k,
            "test_iter" => &self.test_iter,
            "zc_incr" => &self.zc_incr,
            "ste_incr" => &self.ste_incr,
            "entr_incr" => &self.entr_incr,
            "neg_incr" => &self.neg_incr,
            "larg_incr" => &self.larg_incr,
            other => return Err(DtwError::UnknownParameter(other.to_string())),
        })
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut i64, DtwError> {
        Ok(match name {
            "paa" => &mut self.paa,
            "window" => &mut self.window,
            "banks" => &mut self.banks,
            "paa_op" => &mut self.paa_op,
            "dtw_window" => &mut self.dtw_window,
            "interval_div" => &mut self.interval_div,
            "nfft" => &mut self.nfft,
            "trunc" => &mut self.trunc,
            "mfccs" => &mut self.mfccs,
            "knn" => &mut self.knn,
            "group_k" => &mut self.group_k,
            "voice_k" => &mut self.voice_k,
            "test_iter" => &mut self.test_iter,
            "zc_incr" => &mut self.zc_incr,
            "ste_incr" => &mut self.ste_incr,
            "entr_incr" => &mut self.entr_incr,
            "neg_incr" => &mut self.neg_incr,
            "larg_incr" => &mut self.larg_incr,
            other => return Err(DtwError::UnknownParameter(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arguments_follow_the_fixed_order() {
        let args = DtwParameters::default().to_args();
        assert_eq!(
            args,
            [
                "paa", "2", "window", "128", "banks", "40", "paa_op", "0", "dtw_window", "200",
                "interval_div", "2", "nfft", "512", "trunc", "24", "mfccs", "99999", "knn", "7",
                "group_k", "7", "voice_k", "7", "test_iter", "1",
            ]
        );
    }

    #[test]
    fn bounds_flag_adds_thresholds_and_flags_follow() {
        let mut params = DtwParameters::default();
        params.set_flag(DtwFlag::Bounds, true);
        params.set_flag(DtwFlag::Knn, true);
        params.speakers = SpeakerSet::Female;

        let args = params.to_args();
        let tail = &args[26..];
        assert_eq!(
            tail,
            [
                "zc_incr", "95", "ste_incr", "85000", "entr_incr", "400", "neg_incr", "-300",
                "larg_incr", "1000", "FEMALE", "KNN", "BOUNDS",
            ]
        );
    }

    #[test]
    fn set_text_validates_numbers() {
        let mut params = DtwParameters::default();
        params.set_text("knn", " 9 ").unwrap();
        assert_eq!(params.knn, 9);
        assert!(matches!(
            params.set_text("knn", "nine"),
            Err(DtwError::InvalidValue { .. })
        ));
        assert!(matches!(
            params.set("bogus", 1),
            Err(DtwError::UnknownParameter(_))
        ));
        assert_eq!(params.knn, 9);
    }

    #[test]
    fn every_listed_parameter_is_addressable() {
        let params = DtwParameters::default();
        for name in NUMERIC_PARAMETERS.iter().chain(BOUNDS_PARAMETERS.iter()) {
            params.get(name).unwrap();
        }
    }

    #[test]
    fn presets_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        let mut params = DtwParameters::default();
        params.dtw_window = 150;
        params.set_flag(DtwFlag::Voiced, true);
        params.speakers = SpeakerSet::Spkr1;

        params.save(&path).unwrap();
        assert_eq!(DtwParameters::load(&path).unwrap(), params);
    }

    #[test]
    fn partial_presets_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "knn": 3, "flags": ["GROUP"] }"#).unwrap();

        let params = DtwParameters::load(&path).unwrap();
        assert_eq!(params.knn, 3);
        assert_eq!(params.banks, 40);
        assert!(params.has_flag(DtwFlag::Group));
    }
}
