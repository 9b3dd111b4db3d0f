//! Payment processors.
//!
//! The checkout service charges through [`PaymentProcessor`] and applies its
//! own timeout, so a processor only has to answer approved or declined.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use stockroom_core::{OrderId, PaymentOutcome, UserId};

/// What is being charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome;
}

/// Approves a random share of charges after an optional delay.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentProcessor {
    success_rate: f64,
    latency: Duration,
}

impl SimulatedPaymentProcessor {
    /// Approval probability used when none is configured.
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.75;

    /// `success_rate` is clamped to `0.0..=1.0`; NaN is treated as 0.
    #[must_use]
    pub fn new(success_rate: f64, latency: Duration) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self {
            success_rate,
            latency,
        }
    }

    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE, Duration::ZERO)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedPaymentProcessor {
    async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let approved = rand::rng().random_bool(self.success_rate);
        debug!(
            order_id = %request.order_id,
            amount = %request.amount,
            approved,
            "Simulated charge"
        );

        if approved {
            PaymentOutcome::Approved
        } else {
            PaymentOutcome::Declined
        }
    }
}

/// Always answers with the same outcome, optionally after a delay, and
/// counts the charges it receives.
///
/// Used by tests to drive checkout down a known path.
#[derive(Debug, Clone)]
pub struct FixedPaymentProcessor {
    outcome: PaymentOutcome,
    delay: Duration,
    charges: Arc<AtomicUsize>,
}

impl FixedPaymentProcessor {
    #[must_use]
    pub fn new(outcome: PaymentOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            charges: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn approving() -> Self {
        Self::new(PaymentOutcome::Approved)
    }

    #[must_use]
    pub fn declining() -> Self {
        Self::new(PaymentOutcome::Declined)
    }

    /// Wait this long before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Charges received so far, including ones that later timed out.
    #[must_use]
    pub fn charges(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for FixedPaymentProcessor {
    async fn charge(&self, _request: &PaymentRequest) -> PaymentOutcome {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId::new(1),
            user_id: UserId::new(1),
            amount: dec!(20.00),
        }
    }

    #[test]
    fn test_success_rate_clamped() {
        assert!((SimulatedPaymentProcessor::new(1.5, Duration::ZERO).success_rate() - 1.0).abs() < f64::EPSILON);
        assert!(SimulatedPaymentProcessor::new(-0.2, Duration::ZERO).success_rate().abs() < f64::EPSILON);
        assert!(SimulatedPaymentProcessor::new(f64::NAN, Duration::ZERO).success_rate().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_certain_rates_are_deterministic() {
        let always = SimulatedPaymentProcessor::new(1.0, Duration::ZERO);
        let never = SimulatedPaymentProcessor::new(0.0, Duration::ZERO);
        for _ in 0..20 {
            assert_eq!(always.charge(&request()).await, PaymentOutcome::Approved);
            assert_eq!(never.charge(&request()).await, PaymentOutcome::Declined);
        }
    }

    #[tokio::test]
    async fn test_fixed_processor_counts_charges() {
        let processor = FixedPaymentProcessor::declining();
        processor.charge(&request()).await;
        processor.charge(&request()).await;
        assert_eq!(processor.charges(), 2);
    }
}
