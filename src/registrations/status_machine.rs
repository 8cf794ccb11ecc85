use crate::registrations::PaymentStatus;

/// Service for managing payment status transitions
pub struct PaymentStatusMachine;

impl PaymentStatusMachine {
    /// Check if a payment status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Paid, Failed
    /// - Failed → Pending (checkout retried)
    /// - Paid → Refunded
    /// - Refunded → (terminal)
    /// - Any status → Same status (idempotent gateway callbacks)
    pub fn is_valid_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
        if from == to {
            return true;
        }

        matches!(
            (from, to),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Failed, PaymentStatus::Pending)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }

    /// Attempt to transition from one status to another
    pub fn transition(from: PaymentStatus, to: PaymentStatus) -> Result<PaymentStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid payment status transition from {} to {}", from, to))
        }
    }

    /// Whether a checkout may be started from this status
    pub fn can_checkout(status: PaymentStatus) -> bool {
        matches!(status, PaymentStatus::Pending | PaymentStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_settles_either_way() {
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Pending,
            PaymentStatus::Paid
        ));
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Pending,
            PaymentStatus::Failed
        ));
    }

    #[test]
    fn test_failed_can_be_retried() {
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Failed,
            PaymentStatus::Pending
        ));
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Failed,
            PaymentStatus::Paid
        ));
    }

    #[test]
    fn test_paid_only_refunds() {
        assert!(PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Paid,
            PaymentStatus::Refunded
        ));
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Paid,
            PaymentStatus::Pending
        ));
        assert!(!PaymentStatusMachine::is_valid_transition(
            PaymentStatus::Paid,
            PaymentStatus::Failed
        ));
    }

    #[test]
    fn test_pending_cannot_jump_to_refunded() {
        let result = PaymentStatusMachine::transition(PaymentStatus::Pending, PaymentStatus::Refunded);
        assert!(result.unwrap_err().contains("Invalid payment status transition"));
    }

    #[test]
    fn test_checkout_allowed_statuses() {
        assert!(PaymentStatusMachine::can_checkout(PaymentStatus::Pending));
        assert!(PaymentStatusMachine::can_checkout(PaymentStatus::Failed));
        assert!(!PaymentStatusMachine::can_checkout(PaymentStatus::Paid));
        assert!(!PaymentStatusMachine::can_checkout(PaymentStatus::Refunded));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn payment_status_strategy() -> impl Strategy<Value = PaymentStatus> {
        prop::sample::select(PaymentStatus::ALL.to_vec())
    }

    proptest! {
        /// Same status is always accepted
        #[test]
        fn prop_same_status_is_valid(status in payment_status_strategy()) {
            prop_assert!(PaymentStatusMachine::is_valid_transition(status, status));
        }

        /// Refunded is terminal
        #[test]
        fn prop_refunded_is_terminal(to in payment_status_strategy()) {
            if to != PaymentStatus::Refunded {
                prop_assert!(!PaymentStatusMachine::is_valid_transition(PaymentStatus::Refunded, to));
            }
        }

        /// transition() agrees with is_valid_transition()
        #[test]
        fn prop_transition_consistency(
            from in payment_status_strategy(),
            to in payment_status_strategy(),
        ) {
            let valid = PaymentStatusMachine::is_valid_transition(from, to);
            let result = PaymentStatusMachine::transition(from, to);
            prop_assert_eq!(valid, result.is_ok());
            if let Ok(status) = result {
                prop_assert_eq!(status, to);
            }
        }
    }
}
