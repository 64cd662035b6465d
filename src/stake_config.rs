use crate::services::{AdminError, ServiceResult, StakeTier};

/// Finds the staking tier whose `[min, max]` band contains `amount`.
///
/// Tiers are scanned in listing order and the first hit wins; overlapping
/// bands are legal and resolve to whichever the backend listed first.
pub fn resolve_tier(amount: f64, tiers: &[StakeTier]) -> Option<&StakeTier> {
    tiers
        .iter()
        .find(|tier| tier.min <= amount && amount <= tier.max)
}

/// Same lookup, as a hard requirement: a missing band is a configuration
/// error that must block approval of a staking transaction.
pub fn require_tier(amount: f64, tiers: &[StakeTier]) -> ServiceResult<&StakeTier> {
    resolve_tier(amount, tiers).ok_or_else(|| {
        AdminError::Configuration(format!("no staking tier covers amount {amount}"))
    })
}

pub fn validate_tier(tier: &StakeTier) -> ServiceResult<()> {
    if tier.min > tier.max {
        return Err(AdminError::Validation(format!(
            "tier range inverted: min {} exceeds max {}",
            tier.min, tier.max
        )));
    }
    if tier.price < 0.0 {
        return Err(AdminError::Validation("tier price is negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(id: &str, min: f64, max: f64, price: f64) -> StakeTier {
        StakeTier {
            id: Some(id.into()),
            min,
            max,
            price,
            cycle: "monthly".into(),
        }
    }

    #[test]
    fn amount_inside_band_resolves() {
        let tiers = vec![tier("a", 100.0, 500.0, 10.0)];
        assert_eq!(resolve_tier(100.0, &tiers).unwrap().id.as_deref(), Some("a"));
        assert_eq!(resolve_tier(500.0, &tiers).unwrap().id.as_deref(), Some("a"));
        assert_eq!(resolve_tier(250.0, &tiers).unwrap().id.as_deref(), Some("a"));
    }

    #[test]
    fn amount_outside_every_band_is_none() {
        let tiers = vec![tier("a", 100.0, 500.0, 10.0)];
        assert!(resolve_tier(99.99, &tiers).is_none());
        assert!(resolve_tier(500.01, &tiers).is_none());
    }

    #[test]
    fn overlapping_bands_resolve_to_first_listed() {
        let tiers = vec![tier("a", 100.0, 500.0, 10.0), tier("b", 400.0, 1000.0, 25.0)];
        assert_eq!(resolve_tier(450.0, &tiers).unwrap().id.as_deref(), Some("a"));
        let reversed = vec![tier("b", 400.0, 1000.0, 25.0), tier("a", 100.0, 500.0, 10.0)];
        assert_eq!(
            resolve_tier(450.0, &reversed).unwrap().id.as_deref(),
            Some("b")
        );
    }

    #[test]
    fn boundary_amount_prefers_earlier_tier() {
        let tiers = vec![tier("a", 100.0, 500.0, 10.0), tier("b", 500.0, 1000.0, 25.0)];
        assert_eq!(resolve_tier(500.0, &tiers).unwrap().id.as_deref(), Some("a"));
    }

    #[test]
    fn require_tier_reports_configuration_error() {
        let err = require_tier(50.0, &[tier("a", 100.0, 500.0, 10.0)]).unwrap_err();
        assert!(matches!(err, AdminError::Configuration(_)));
    }

    #[test]
    fn inverted_range_fails_validation() {
        let err = validate_tier(&tier("a", 500.0, 100.0, 10.0)).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
        assert!(validate_tier(&tier("a", 100.0, 100.0, 0.0)).is_ok());
    }
}
