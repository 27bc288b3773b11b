use std::time::{Duration, Instant};

/// Token bucket tracking a request budget that refills continuously
pub struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_update: Instant,
}

impl TokenBucket {
    /// Bucket holding `capacity` tokens that fully refills over `refill_interval`
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        let secs = refill_interval.as_secs_f64();
        let refill_rate = if secs > 0.0 {
            capacity as f64 / secs
        } else {
            f64::INFINITY
        };
        TokenBucket {
            tokens: capacity as f64,
            capacity: capacity as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    /// Take `amount` tokens if available
    pub fn try_consume(&mut self, amount: u32) -> bool {
        self.refill();

        let amount = amount as f64;
        if self.tokens >= amount {
            self.tokens -= amount;
            true
        } else {
            false
        }
    }

    /// Whole tokens left after refilling
    pub fn remaining(&mut self) -> u32 {
        self.refill();
        self.tokens.floor() as u32
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        let new_tokens = elapsed.as_secs_f64() * self.refill_rate;
        self.tokens = (self.tokens + new_tokens).min(self.capacity);
        self.last_update = now;
    }
}
