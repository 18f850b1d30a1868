use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts: 0,
            base_delay,
            max_delay,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn next_delay(&self) -> Duration {
        let base = self.base_delay.as_secs();
        let multiplier = 2u64.saturating_pow(self.attempts.min(31));
        let delay = base.saturating_mul(multiplier).min(self.max_delay.as_secs());
        Duration::from_secs(delay)
    }

    pub fn bump(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_until_capped() {
        let mut backoff = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(60));

        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        backoff.bump();
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
        backoff.bump();
        assert_eq!(backoff.next_delay(), Duration::from_secs(20));

        for _ in 0..10 {
            backoff.bump();
        }
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }
}
