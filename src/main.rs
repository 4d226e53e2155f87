// src/main.rs
//
// Research-harness CLI entrypoint for oligosim.
//
// Runs seeded episodes under a fixed baseline action rule and prints a
// concise run header plus a per-firm summary. The rules here are driver
// conveniences for smoke-testing the market, not policies of the engine.

use clap::{ArgAction, Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use oligosim::{
    Config, FirmAction, MarketEnv, MarketTelemetry, OligopolyEnv, Regime, N_FIRMS,
};

/// Baseline action rule used to drive the episode.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum RuleArg {
    /// All firms post the config's initial price, no R&D.
    FixedPrice,
    /// All firms price at marginal cost plus a fixed markup, modest R&D.
    CostPlus,
    /// Prices and R&D drawn uniformly from the action space.
    Random,
}

#[derive(Debug, Parser)]
#[command(
    name = "oligosim",
    about = "Three-firm oligopoly market simulator (research harness)",
    version
)]
struct Args {
    /// Number of episodes to run.
    #[arg(long, default_value_t = 1)]
    episodes: u64,

    /// Deterministic base seed; episode i uses seed + i.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Baseline action rule.
    #[arg(long, value_enum, default_value_t = RuleArg::CostPlus)]
    rule: RuleArg,

    /// Verbosity: -v prints per-step lines.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn fnv1a64(s: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn actions_for_rule(
    rule: RuleArg,
    env: &MarketEnv,
    rng: &mut ChaCha8Rng,
) -> [FirmAction; N_FIRMS] {
    match rule {
        RuleArg::FixedPrice => [FirmAction::new(env.config().episode.initial_price, 0.0); N_FIRMS],
        RuleArg::CostPlus => {
            let price = env.state().marginal_cost + 60.0;
            [FirmAction::new(price, 5.0); N_FIRMS]
        }
        RuleArg::Random => {
            let space = env.action_space_for(0);
            let mut actions = [FirmAction::new(0.0, 0.0); N_FIRMS];
            for a in &mut actions {
                a.price = rng.gen_range(space.price_min..space.price_max);
                a.rd_investment = rng.gen_range(space.rd_min..space.rd_max);
            }
            actions
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cfg = Config::default();
    let cfg_hash = fnv1a64(&format!("{cfg:?}"));

    println!(
        "oligosim | cfg={} | cfg_hash=0x{:016x} | rule={:?} | episodes={} | seed={}",
        cfg.version, cfg_hash, args.rule, args.episodes, args.seed
    );

    let mut telemetry = MarketTelemetry::from_env();
    let mut env = MarketEnv::new(cfg);

    // Action-rule RNG is separate from the environment's shock RNG so the
    // random rule does not perturb the shock trajectory.
    let mut rule_rng = ChaCha8Rng::seed_from_u64(args.seed ^ 0x9e3779b97f4a7c15);

    for episode in 0..args.episodes {
        let seed = args.seed + episode;
        env.reset(Some(seed));
        telemetry.log_episode_start(episode, seed);

        let mut recession_steps = 0u32;
        let mut clamp_events = 0u32;

        while !env.is_terminated() {
            let actions = actions_for_rule(args.rule, &env, &mut rule_rng);
            let result = env.step(&actions)?;
            telemetry.log_step(&result);

            if result.info.regime == Regime::Recession {
                recession_steps += 1;
            }
            clamp_events += result.info.price_clamped.iter().filter(|&&c| c).count() as u32;

            if args.verbose > 0 {
                println!(
                    "  t={:3} regime={:9} demand={:8.2} C_m={:6.2} shares=[{:.3} {:.3} {:.3}]",
                    result.info.time,
                    result.info.regime.as_str(),
                    result.observation.effective_demand,
                    result.observation.marginal_cost,
                    result.observation.market_shares[0],
                    result.observation.market_shares[1],
                    result.observation.market_shares[2],
                );
            }
        }

        let state = env.state();
        telemetry.log_episode_end(seed, state.time, state.cumulative_profits);

        println!(
            "episode {episode} | seed={seed} | steps={} | recession_steps={recession_steps} | clamp_events={clamp_events}",
            state.time
        );
        for (i, profit) in state.cumulative_profits.iter().enumerate() {
            println!(
                "  firm {i}: cumulative_profit={profit:12.2} | final_price={:7.2} | innovation_stock={:8.2} | share={:.3}",
                state.prices[i], state.innovation_stocks[i], state.market_shares[i]
            );
        }
    }

    telemetry.flush();
    Ok(())
}
