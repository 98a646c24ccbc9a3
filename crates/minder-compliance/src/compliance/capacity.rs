use serde::{Deserialize, Serialize};

/// Regulatory ceiling on children under eight, whatever the adult headcount.
pub const MAX_UNDER8: u32 = 6;
/// Largest number of assistants a single setting may register.
pub const MAX_ASSISTANTS: u32 = 3;

const UNDER1_PER_ADULT: u32 = 1;
const UNDER5_PER_ADULT: u32 = 3;

/// Maximum child numbers derived from the adults working in a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRatios {
    pub total_adults: u32,
    pub max_under1: u32,
    pub max_under5: u32,
    pub max_under8: u32,
}

impl CapacityRatios {
    /// Assistants only count when the childminder works with others; the count is
    /// clamped to `0..=3`.
    pub fn for_setting(works_with_others: bool, number_of_assistants: u32) -> Self {
        let total_adults = if works_with_others {
            1 + number_of_assistants.min(MAX_ASSISTANTS)
        } else {
            1
        };

        Self {
            total_adults,
            max_under1: total_adults * UNDER1_PER_ADULT,
            max_under5: total_adults * UNDER5_PER_ADULT,
            max_under8: MAX_UNDER8,
        }
    }
}

/// Child numbers proposed on a registration form, by age band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedChildren {
    #[serde(default)]
    pub under1: u32,
    #[serde(default)]
    pub under5: u32,
    #[serde(default)]
    pub age5to8: u32,
    #[serde(default)]
    pub age8plus: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_under5: u32,
    pub total_under8: u32,
}

/// Check proposed numbers against the ratios.
///
/// Every limit is checked independently so several errors may be reported at once.
/// Warnings for an exhausted limit are only produced when nothing is in error.
pub fn validate_capacity(
    proposed: &ProposedChildren,
    ratios: &CapacityRatios,
) -> CapacityValidation {
    let total_under5 = proposed.under1.saturating_add(proposed.under5);
    let total_under8 = total_under5.saturating_add(proposed.age5to8);

    let mut errors = Vec::new();
    if proposed.under1 > ratios.max_under1 {
        errors.push(format!(
            "children under 1 ({}) exceeds the maximum of {} for {} adult(s)",
            proposed.under1, ratios.max_under1, ratios.total_adults
        ));
    }
    if total_under5 > ratios.max_under5 {
        errors.push(format!(
            "children under 5 ({total_under5}) exceeds the maximum of {} for {} adult(s)",
            ratios.max_under5, ratios.total_adults
        ));
    }
    if total_under8 > ratios.max_under8 {
        errors.push(format!(
            "children under 8 ({total_under8}) exceeds the maximum of {}",
            ratios.max_under8
        ));
    }

    let mut warnings = Vec::new();
    if errors.is_empty() {
        if proposed.under1 == ratios.max_under1 {
            warnings.push(format!(
                "at maximum capacity for children under 1 ({})",
                ratios.max_under1
            ));
        }
        if total_under5 == ratios.max_under5 {
            warnings.push(format!(
                "at maximum capacity for children under 5 ({})",
                ratios.max_under5
            ));
        }
        if total_under8 == ratios.max_under8 {
            warnings.push(format!(
                "at maximum capacity for children under 8 ({})",
                ratios.max_under8
            ));
        }
    }

    CapacityValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        total_under5,
        total_under8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sole_childminder_ignores_assistants() {
        let ratios = CapacityRatios::for_setting(false, 2);
        assert_eq!(ratios.total_adults, 1);
        assert_eq!(ratios.max_under1, 1);
        assert_eq!(ratios.max_under5, 3);
        assert_eq!(ratios.max_under8, MAX_UNDER8);
    }

    #[test]
    fn assistants_raise_infant_limits_but_not_under8_cap() {
        let mut previous = CapacityRatios::for_setting(true, 0);
        for assistants in 1..=MAX_ASSISTANTS {
            let ratios = CapacityRatios::for_setting(true, assistants);
            assert!(ratios.max_under1 >= previous.max_under1);
            assert!(ratios.max_under5 >= previous.max_under5);
            assert_eq!(ratios.max_under8, previous.max_under8);
            previous = ratios;
        }

        let clamped = CapacityRatios::for_setting(true, 9);
        assert_eq!(clamped.total_adults, 4);
    }

    #[test]
    fn one_assistant_at_under8_limit_is_valid_with_warning() {
        let ratios = CapacityRatios::for_setting(true, 1);
        assert_eq!(
            (ratios.max_under1, ratios.max_under5, ratios.max_under8),
            (2, 6, 6)
        );

        let proposed = ProposedChildren {
            under1: 1,
            under5: 4,
            age5to8: 1,
            age8plus: 0,
        };
        let result = validate_capacity(&proposed, &ratios);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.total_under5, 5);
        assert_eq!(result.total_under8, 6);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("under 8"));
    }

    #[test]
    fn oversized_counts_saturate_instead_of_wrapping() {
        let ratios = CapacityRatios::for_setting(false, 0);
        let proposed = ProposedChildren {
            under1: 1,
            under5: u32::MAX,
            age5to8: u32::MAX,
            age8plus: u32::MAX,
        };
        let result = validate_capacity(&proposed, &ratios);

        assert!(!result.is_valid);
        assert_eq!(result.total_under5, u32::MAX);
        assert_eq!(result.total_under8, u32::MAX);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().any(|error| error.contains("under 5")));
        assert!(result.errors.iter().any(|error| error.contains("under 8")));
    }

    #[test]
    fn every_breached_limit_is_reported() {
        let ratios = CapacityRatios::for_setting(false, 0);
        let proposed = ProposedChildren {
            under1: 2,
            under5: 3,
            age5to8: 2,
            age8plus: 4,
        };
        let result = validate_capacity(&proposed, &ratios);

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
        assert!(
            result.warnings.is_empty(),
            "warnings are suppressed while errors exist"
        );
    }

    #[test]
    fn over_eights_do_not_count_towards_limits() {
        let ratios = CapacityRatios::for_setting(false, 0);
        let proposed = ProposedChildren {
            under1: 0,
            under5: 2,
            age5to8: 1,
            age8plus: 10,
        };
        let result = validate_capacity(&proposed, &ratios);

        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert_eq!(result.total_under8, 3);
    }
}
