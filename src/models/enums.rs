use super::ModelError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        $(#[$meta])*
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Imaging modality. `Unknown` is the router's rejection outcome.
    ImageType {
        SkinLesion => "skin_lesion",
        ChestXray => "chest_xray",
        Fundus => "fundus",
        Unknown => "unknown",
    }
);

impl ImageType {
    /// The three routable modalities, in scoring order.
    pub const MODALITIES: [ImageType; 3] =
        [ImageType::SkinLesion, ImageType::ChestXray, ImageType::Fundus];

    /// Upper-case heading used in report finding blocks ("CHEST XRAY").
    pub fn heading(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

str_enum!(
    /// Risk tier. Ordering is by severity, so `max()` gives the worst tier.
    RiskLevel {
        Low => "low",
        Moderate => "moderate",
        High => "high",
    }
);

str_enum!(TriageLevel {
    Low => "LOW",
    Moderate => "MODERATE",
    High => "HIGH",
});

impl TriageLevel {
    pub fn from_risk(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::Low => Self::Low,
            RiskLevel::Moderate => Self::Moderate,
            RiskLevel::High => Self::High,
        }
    }

    /// Summary line shown next to the overall triage level.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::High => "HIGH — Immediate referral recommended",
            Self::Moderate => "MODERATE — Follow-up within 2 weeks",
            Self::Low => "LOW — Routine follow-up",
        }
    }
}

str_enum!(ReportMode {
    Generative => "generative",
    Template => "template",
});

str_enum!(FallbackReason {
    ScoringFailed => "scoring_failed",
    ScorerUnavailable => "scorer_unavailable",
});

str_enum!(RouteHeuristic {
    FilenameKeyword => "filename_keyword",
    RandomChoice => "random_choice",
});

str_enum!(
    /// Lifecycle state of a lazily loaded model or index.
    ResourceStatus {
        NotLoaded => "not_loaded",
        Loading => "loading",
        Loaded => "loaded",
        Failed => "failed",
        Mock => "mock",
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn image_type_round_trip() {
        for (variant, s) in [
            (ImageType::SkinLesion, "skin_lesion"),
            (ImageType::ChestXray, "chest_xray"),
            (ImageType::Fundus, "fundus"),
            (ImageType::Unknown, "unknown"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ImageType::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn risk_level_orders_by_severity() {
        assert!(RiskLevel::High > RiskLevel::Moderate);
        assert!(RiskLevel::Moderate > RiskLevel::Low);
        let worst = [RiskLevel::Low, RiskLevel::High, RiskLevel::Moderate]
            .into_iter()
            .max();
        assert_eq!(worst, Some(RiskLevel::High));
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ImageType::ChestXray).unwrap(),
            "\"chest_xray\""
        );
        assert_eq!(
            serde_json::to_string(&TriageLevel::Moderate).unwrap(),
            "\"MODERATE\""
        );
        let parsed: FallbackReason = serde_json::from_str("\"scorer_unavailable\"").unwrap();
        assert_eq!(parsed, FallbackReason::ScorerUnavailable);
    }

    #[test]
    fn invalid_value_is_rejected() {
        let err = RiskLevel::from_str("critical").unwrap_err();
        assert!(err.to_string().contains("RiskLevel"));
    }

    #[test]
    fn heading_is_upper_spaced() {
        assert_eq!(ImageType::SkinLesion.heading(), "SKIN LESION");
        assert_eq!(ImageType::Fundus.heading(), "FUNDUS");
    }

    #[test]
    fn triage_from_risk() {
        assert_eq!(TriageLevel::from_risk(RiskLevel::High), TriageLevel::High);
        assert!(TriageLevel::High.summary().starts_with("HIGH"));
    }
}
