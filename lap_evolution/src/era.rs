use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine regulation period a season belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    Early,
    V10,
    V8,
    Hybrid,
}

impl Era {
    /// Chronological order; also the stage order of the era column in the constructor flow.
    pub const ALL: [Era; 4] = [Era::Early, Era::V10, Era::V8, Era::Hybrid];

    /// First match wins, checked from the newest era down.
    pub fn classify(year: i32) -> Self {
        if year >= 2014 {
            Era::Hybrid
        } else if year >= 2006 {
            Era::V8
        } else if year >= 1995 {
            Era::V10
        } else {
            Era::Early
        }
    }

    pub fn index(self) -> usize {
        match self {
            Era::Early => 0,
            Era::V10 => 1,
            Era::V8 => 2,
            Era::Hybrid => 3,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Era::Early => "early",
            Era::V10 => "v10",
            Era::V8 => "v8",
            Era::Hybrid => "hybrid",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Era::Early => "Early Era",
            Era::V10 => "V10 Era",
            Era::V8 => "V8 Era",
            Era::Hybrid => "V6 Hybrid Era",
        }
    }

    /// Nominal (first, last) season of the era as labelled on the charts.
    pub fn years(self) -> (i32, i32) {
        match self {
            Era::Early => (1950, 1994),
            Era::V10 => (1995, 2005),
            Era::V8 => (2006, 2013),
            Era::Hybrid => (2014, 2024),
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Era::Early => "#9b59b6",
            Era::V10 => "#e74c3c",
            Era::V8 => "#3498db",
            Era::Hybrid => "#2ecc71",
        }
    }

    /// Representative engine output in horsepower.
    pub fn avg_hp(self) -> u32 {
        match self {
            Era::Early => 350,
            Era::V10 => 850,
            Era::V8 => 750,
            Era::Hybrid => 1000,
        }
    }

    pub fn info(self) -> EraInfo {
        let (start, end) = self.years();
        EraInfo {
            era: self,
            name: self.display_name(),
            start,
            end,
            color: self.color(),
            avg_hp: self.avg_hp(),
        }
    }
}

/// Convenience alias for [`Era::classify`].
pub fn classify_era(year: i32) -> Era {
    Era::classify(year)
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EraInfo {
    pub era: Era,
    pub name: &'static str,
    pub start: i32,
    pub end: i32,
    pub color: &'static str,
    pub avg_hp: u32,
}

/// One value per era, serialized as `{ early, v10, v8, hybrid }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerEra<T> {
    pub early: T,
    pub v10: T,
    pub v8: T,
    pub hybrid: T,
}

impl<T> PerEra<T> {
    pub fn get(&self, era: Era) -> &T {
        match era {
            Era::Early => &self.early,
            Era::V10 => &self.v10,
            Era::V8 => &self.v8,
            Era::Hybrid => &self.hybrid,
        }
    }

    pub fn get_mut(&mut self, era: Era) -> &mut T {
        match era {
            Era::Early => &mut self.early,
            Era::V10 => &mut self.v10,
            Era::V8 => &mut self.v8,
            Era::Hybrid => &mut self.hybrid,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Era, &T)> {
        Era::ALL.into_iter().map(move |era| (era, self.get(era)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(classify_era(1994), Era::Early);
        assert_eq!(classify_era(1995), Era::V10);
        assert_eq!(classify_era(2005), Era::V10);
        assert_eq!(classify_era(2006), Era::V8);
        assert_eq!(classify_era(2013), Era::V8);
        assert_eq!(classify_era(2014), Era::Hybrid);
    }

    #[test]
    fn total_over_extremes() {
        assert_eq!(classify_era(i32::MIN), Era::Early);
        assert_eq!(classify_era(0), Era::Early);
        assert_eq!(classify_era(i32::MAX), Era::Hybrid);
    }

    #[test]
    fn never_regresses_as_years_increase() {
        let mut last = classify_era(1900).index();
        for year in 1901..=2100 {
            let idx = classify_era(year).index();
            assert!(idx >= last, "era regressed at {year}");
            last = idx;
        }
    }

    #[test]
    fn tags_match_serialized_form() {
        for era in Era::ALL {
            assert_eq!(serde_json::to_string(&era).unwrap(), format!("\"{}\"", era.tag()));
            assert_eq!(serde_json::from_str::<Era>(&format!("\"{}\"", era.tag())).unwrap(), era);
        }
        assert!(serde_json::from_str::<Era>("\"turbo\"").is_err());
    }

    #[test]
    fn nominal_ranges_agree_with_classifier() {
        for era in Era::ALL {
            let (start, end) = era.years();
            assert_eq!(classify_era(start), era);
            assert_eq!(classify_era(end), era);
        }
    }

    #[test]
    fn per_era_indexing() {
        let mut counts: PerEra<u32> = PerEra::default();
        *counts.get_mut(Era::V8) += 2;
        *counts.get_mut(Era::Hybrid) += 1;
        assert_eq!(*counts.get(Era::V8), 2);
        assert_eq!(counts.iter().map(|(_, n)| *n).sum::<u32>(), 3);
    }
}
