// demos/pricing_demo.rs

//! Demonstration of single-contract Black-Scholes-Merton pricing
//!
//! This example shows how to:
//! 1. Build validated option contracts
//! 2. Price calls and puts, and check put-call parity
//! 3. See how invalid parameter sets are rejected

use anyhow::Result;
use bsm_batch::{price, price_with, OptionContract, PutLeg};

fn main() -> Result<()> {
    println!("European Option Pricing Demo");
    println!("============================");

    let call = OptionContract::new("call", 1.0, 0.9, 0.015, 0.2, 1.0, 1)?;
    let put = call.counterpart();

    let call_value = price(&call)?;
    let put_value = price(&put)?;
    let put_pos_d2 = price_with(&put, PutLeg::PosD2)?;

    println!(
        "Spot {:.2}, strike {:.2}, rate {:.3}, vol {:.2}, T {:.1}",
        call.spot(),
        call.strike(),
        call.rate(),
        call.volatility(),
        call.time_to_maturity()
    );
    println!("  Call:           {call_value:.17}");
    println!("  Put:            {put_value:.17}");
    println!("  Put (Φ(d2) leg): {put_pos_d2:.17}");

    let discounted_strike = call.strike() * (-call.rate() * call.time_to_maturity()).exp();
    let parity_gap = call_value - put_value - (call.spot() - discounted_strike);
    println!("  Parity gap:     {parity_gap:.3e}");

    println!("\nValues across spot levels:");
    println!("{:<8} {:<12} {:<12}", "Spot", "Call", "Put");
    println!("{}", "-".repeat(34));
    for spot in [0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3] {
        let call_at = price(&call.with_spot(spot)?)?;
        let put_at = price(&put.with_spot(spot)?)?;
        println!("{spot:<8.2} {call_at:<12.6} {put_at:<12.6}");
    }

    println!("\nRejected parameter sets:");
    for (kind, vol, t) in [("Call", 0.2, 1.0), ("put", 0.0, 1.0), ("put", 0.2, -0.5)] {
        match OptionContract::new(kind, 1.0, 0.9, 0.015, vol, t, 1) {
            Ok(_) => println!("  {kind} vol={vol} T={t}: accepted"),
            Err(err) => println!("  {kind} vol={vol} T={t}: {err}"),
        }
    }

    Ok(())
}
