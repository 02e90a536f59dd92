//! Synthetic log generator for smoke-testing the UI with zero external input.

use std::sync::Arc;
use std::time::Duration;

use logdy_engine::Ingress;
use logdy_protocol::{LogType, MessageOrigin};
use rand::seq::SliceRandom;
use rand::Rng;

const CANNED_MESSAGES: &[&str] = &[
    "request completed in 42ms",
    "cache miss for key user:1234",
    "connection pool at 80% capacity",
    "retrying upstream call (attempt 2/3)",
    "scheduled job \"cleanup\" finished",
    "failed to acquire lock, backing off",
    "healthcheck ok",
];

/// Emits one canned line every `interval`, chosen at random, with a
/// randomly-assigned stdout/stderr split. Runs until `ingress`'s channel closes.
pub async fn run_demo_generator(ingress: Arc<Ingress>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let line = {
            let mut rng = rand::thread_rng();
            let content = CANNED_MESSAGES
                .choose(&mut rng)
                .expect("CANNED_MESSAGES is non-empty");
            let log_type = if rng.gen_bool(0.15) { LogType::Stderr } else { LogType::Stdout };
            (content.to_string(), log_type)
        };
        if ingress
            .produce(line.0, line.1, MessageOrigin::default())
            .await
            .is_err()
        {
            return;
        }
    }
}
