//! Export file-name metadata.
//!
//! Open Game Data exports are named
//! `GAME_YYYYMMDD_to_YYYYMMDD[_<suffix>]_<level>[-features].tsv`, e.g.
//! `AQUALAB_20230101_to_20230131_5c61198_population-features.tsv`.

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use ogd_dataset::FeatureLevel;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFileName {
    pub game: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub level: FeatureLevel,
}

fn export_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)^([A-Z0-9]+(?:_[A-Z0-9]+)*?)",
            r"_(\d{8})_to_(\d{8})",
            r"(?:_[^_]+)*?",
            r"_(population|player|session)(?:-features)?(?:\.tsv)?$",
        ))
        .expect("static regex is valid")
    })
}

impl ExportFileName {
    /// Parse a bare file name or a path; anything unrecognized is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let file = Path::new(name).file_name()?.to_str()?;
        let caps = export_re().captures(file)?;
        let date = |i: usize| NaiveDate::parse_from_str(caps.get(i)?.as_str(), "%Y%m%d").ok();
        let start = date(2)?;
        let end = date(3)?;
        let level = caps.get(4)?.as_str().parse().ok()?;
        Some(Self {
            game: caps.get(1)?.as_str().to_ascii_uppercase(),
            start,
            end,
            level,
        })
    }
}
