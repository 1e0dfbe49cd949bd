// Return eligibility: a pure function of order, policy, rules and the clock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{EligibilityResult, IneligibilityReason, Order, OrderStatus, ReturnPolicy};

const SECONDS_PER_DAY: i64 = 86_400;

/// Which order statuses may be returned at all
///
/// The returnable set belongs to the order source, so it is configuration
/// rather than a hard-coded list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRules {
    pub returnable_statuses: BTreeSet<OrderStatus>,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            returnable_statuses: [OrderStatus::Delivered, OrderStatus::Completed]
                .into_iter()
                .collect(),
        }
    }
}

impl EligibilityRules {
    pub fn new(statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        Self {
            returnable_statuses: statuses.into_iter().collect(),
        }
    }

    pub fn is_returnable(&self, status: OrderStatus) -> bool {
        self.returnable_statuses.contains(&status)
    }
}

/// Whole days between completion and `now`, rounded down
pub fn elapsed_days(completed_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - completed_at).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn check_eligibility(
    order: &Order,
    policy: &ReturnPolicy,
    rules: &EligibilityRules,
    now: DateTime<Utc>,
) -> EligibilityResult {
    if !rules.is_returnable(order.status) {
        let reason = if order.status.is_returned() {
            IneligibilityReason::AlreadyReturned
        } else if order.status == OrderStatus::Cancelled {
            IneligibilityReason::Cancelled
        } else if order.status.is_in_progress() {
            IneligibilityReason::NotYetCompleted {
                status: order.status,
            }
        } else {
            IneligibilityReason::StatusNotReturnable {
                status: order.status,
            }
        };
        return EligibilityResult::ineligible(reason);
    }

    let Some(completed_at) = order.completed_at else {
        return EligibilityResult::ineligible(IneligibilityReason::NotYetCompleted {
            status: order.status,
        });
    };

    let elapsed = elapsed_days(completed_at, now);
    if elapsed > i64::from(policy.max_return_days) {
        return EligibilityResult::ineligible(IneligibilityReason::WindowExpired {
            elapsed_days: elapsed,
            max_days: policy.max_return_days,
        });
    }

    EligibilityResult::eligible()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn policy(max_days: u32) -> ReturnPolicy {
        ReturnPolicy {
            max_return_days: max_days,
            refund_percentages: BTreeMap::new(),
            allowed_reasons: vec!["defective".to_string()],
        }
    }

    fn order(status: OrderStatus, completed_at: Option<DateTime<Utc>>) -> Order {
        Order {
            id: "ord-1".to_string(),
            customer_id: "cust-1".to_string(),
            items: Vec::new(),
            completed_at,
            status,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_delivered_order_inside_window_is_eligible() {
        let o = order(OrderStatus::Delivered, Some(now() - Duration::days(3)));
        let result = check_eligibility(&o, &policy(30), &EligibilityRules::default(), now());
        assert_eq!(result, EligibilityResult::eligible());
    }

    #[test]
    fn test_last_day_of_window_is_still_eligible() {
        // 30 days and 23 hours rounds down to 30
        let completed = now() - Duration::days(30) - Duration::hours(23);
        let o = order(OrderStatus::Completed, Some(completed));
        let result = check_eligibility(&o, &policy(30), &EligibilityRules::default(), now());
        assert!(result.can_return);
    }

    #[test]
    fn test_expired_window_reports_elapsed_days() {
        let o = order(OrderStatus::Delivered, Some(now() - Duration::days(31)));
        let result = check_eligibility(&o, &policy(30), &EligibilityRules::default(), now());
        assert!(!result.can_return);
        assert_eq!(
            result.reason,
            Some(IneligibilityReason::WindowExpired {
                elapsed_days: 31,
                max_days: 30
            })
        );
    }

    #[test]
    fn test_zero_day_window_allows_same_day_only() {
        let rules = EligibilityRules::default();
        let same_day = order(OrderStatus::Delivered, Some(now() - Duration::hours(5)));
        assert!(check_eligibility(&same_day, &policy(0), &rules, now()).can_return);

        let next_day = order(OrderStatus::Delivered, Some(now() - Duration::hours(25)));
        assert!(!check_eligibility(&next_day, &policy(0), &rules, now()).can_return);
    }

    #[test]
    fn test_reasons_distinguish_causes() {
        let rules = EligibilityRules::default();
        let p = policy(30);

        let shipped = check_eligibility(&order(OrderStatus::Shipped, None), &p, &rules, now());
        assert_eq!(
            shipped.reason,
            Some(IneligibilityReason::NotYetCompleted {
                status: OrderStatus::Shipped
            })
        );

        let returned = check_eligibility(
            &order(OrderStatus::Returned, Some(now())),
            &p,
            &rules,
            now(),
        );
        assert_eq!(returned.reason, Some(IneligibilityReason::AlreadyReturned));

        let cancelled = check_eligibility(&order(OrderStatus::Cancelled, None), &p, &rules, now());
        assert_eq!(cancelled.reason, Some(IneligibilityReason::Cancelled));
    }

    #[test]
    fn test_missing_completion_date_is_not_completed() {
        let o = order(OrderStatus::Delivered, None);
        let result = check_eligibility(&o, &policy(30), &EligibilityRules::default(), now());
        assert_eq!(
            result.reason,
            Some(IneligibilityReason::NotYetCompleted {
                status: OrderStatus::Delivered
            })
        );
    }

    #[test]
    fn test_custom_rules_change_returnable_set() {
        let rules = EligibilityRules::new([OrderStatus::Completed]);
        let delivered = order(OrderStatus::Delivered, Some(now()));
        let result = check_eligibility(&delivered, &policy(30), &rules, now());
        assert_eq!(
            result.reason,
            Some(IneligibilityReason::StatusNotReturnable {
                status: OrderStatus::Delivered
            })
        );
    }

    #[test]
    fn test_messages_are_human_readable() {
        let expired = IneligibilityReason::WindowExpired {
            elapsed_days: 45,
            max_days: 30,
        };
        assert!(expired.to_string().contains("expired"));
        assert!(IneligibilityReason::AlreadyReturned
            .to_string()
            .contains("already"));
    }
}
