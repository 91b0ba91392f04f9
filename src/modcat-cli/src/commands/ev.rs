//! Expected-value command handler.

use anyhow::Result;

use modcat_worker::{expected_value, EvParams};

/// Handle the Ev command.
pub fn handle(success_rate: f64, cost: f64, price: f64, attempts: u32) -> Result<()> {
    let reply = expected_value(&EvParams {
        success_rate,
        attempt_cost: cost,
        target_sell_price: price,
        attempts: attempts as f64,
    });

    println!("Success rate: {:.1}%", (success_rate / 100.0).clamp(0.0, 1.0) * 100.0);
    println!("EV per attempt: {:.2}", reply.ev_per_attempt);
    println!(
        "Total EV over {} attempt(s): {:.2}",
        reply.attempts, reply.total_ev
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_runs() {
        handle(50.0, 10.0, 100.0, 2).unwrap();
        handle(150.0, -1.0, 0.0, 0).unwrap();
    }
}
