//! Decision pipeline orchestration
//!
//! `ZoneTrader` owns the full path from a decoded reserve update to a
//! dispatched swap: price computation and smoothing, zone classification,
//! the hourly execution gate, sizing and execution. Execution runs as a
//! detached task behind a single in-flight slot so the event loop never
//! blocks on chain round-trips.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::chain::traits::{
    BalanceProvider, ExecutionOutcome, Notifier, QuoteSimulator, SwapExecutor, WalletBalances,
};
use crate::common::types::{PoolEvent, ReservePair, TradeContext, ZoneMatch};
use crate::config::types::AppConfig;
use crate::strategy::{
    compute_raw_price, normalize_band, to_units, PriceFilter, TradeSizer, ZoneClassifier,
    ZoneExecutionGate,
};
use crate::tendermint::reserves::{parse_reserves, resolve_pair};

/// Collaborators the trader dispatches against
///
/// Bundled so the execution task can be handed one cheap `Arc` clone.
pub struct TraderDeps {
    pub simulator: Arc<dyn QuoteSimulator>,
    pub balances: Arc<dyn BalanceProvider>,
    pub executor: Arc<dyn SwapExecutor>,
    pub notifier: Arc<dyn Notifier>,
}

/// Stateful decision engine fed from the reserve stream
pub struct ZoneTrader {
    filter: PriceFilter,
    classifier: ZoneClassifier,
    gate: ZoneExecutionGate,
    sizer: Arc<TradeSizer>,
    deps: Arc<TraderDeps>,
    in_flight: Arc<AtomicBool>,
    base_denom: String,
    quote_denom: String,
    lower_target: f64,
    upper_target: f64,
    trade_unit: f64,
    use_sim_sizing: bool,
    fixed_trade_size: f64,
    max_spread: f64,
    fallback_balances: WalletBalances,
    wallet_address: Option<String>,
}

impl ZoneTrader {
    pub fn new(config: &AppConfig, deps: TraderDeps) -> Self {
        let trading = &config.trading;
        let chain = &config.chain;
        let (lower_target, upper_target) =
            normalize_band(trading.lower_target, trading.upper_target);
        let classifier = ZoneClassifier::new(
            trading.buy_base_zones.clone(),
            trading.buy_quote_zones.clone(),
            Duration::from_millis(trading.cooldown_ms),
        );
        let sizer = TradeSizer::new(
            trading,
            chain.base_denom.clone(),
            chain.quote_denom.clone(),
            chain.base_exponent,
            chain.quote_exponent,
        );
        let fallback_balances = WalletBalances {
            base: to_units(trading.wallet_fallback_base, chain.base_exponent),
            quote: to_units(trading.wallet_fallback_quote, chain.quote_exponent),
        };

        Self {
            filter: PriceFilter::new(trading.effective_alpha()),
            classifier,
            gate: ZoneExecutionGate::load(&config.settings.state_file),
            sizer: Arc::new(sizer),
            deps: Arc::new(deps),
            in_flight: Arc::new(AtomicBool::new(false)),
            base_denom: chain.base_denom.clone(),
            quote_denom: chain.quote_denom.clone(),
            lower_target,
            upper_target,
            trade_unit: trading.trade_unit,
            use_sim_sizing: trading.use_sim_sizing,
            fixed_trade_size: trading.fixed_trade_size,
            max_spread: trading.effective_max_spread(),
            fallback_balances,
            wallet_address: chain.wallet_address.clone(),
        }
    }

    /// Whether no execution task is currently running
    pub fn idle(&self) -> bool {
        !self.in_flight.load(Ordering::SeqCst)
    }

    /// Handle one event from the stream client
    pub fn on_event(&mut self, event: PoolEvent) {
        match event {
            PoolEvent::ReserveUpdate { reserves } => self.on_reserves(&reserves),
            PoolEvent::ConnectionStatus(status) => {
                info!("Stream connection status: {:?}", status);
            }
            PoolEvent::Heartbeat => trace!("Stream heartbeat"),
        }
    }

    fn on_reserves(&mut self, raw: &str) {
        let balances = parse_reserves(raw);
        let reserves = match resolve_pair(&balances, &self.base_denom, &self.quote_denom) {
            Ok(reserves) => reserves,
            Err(e) => {
                warn!("Dropping reserve update: {}", e);
                return;
            }
        };

        let Some(raw_price) = compute_raw_price(&reserves) else {
            debug!("Base reserve is zero, no price for this sample");
            return;
        };
        let sample = self.filter.update(raw_price);
        if sample.changed {
            info!(
                "Price {:.6} (raw {:.6}) reserves base={} quote={}",
                sample.filtered, sample.raw, reserves.base, reserves.quote
            );
        }

        let Some(matched) = self.classifier.observe(sample.filtered, Instant::now()) else {
            return;
        };
        info!(
            "Zone entered: {} [{}] at price {:.6}",
            matched.zone.label, matched.intent, sample.filtered
        );

        let now = Utc::now();
        if !self.gate.check_allowed(&matched.zone.label, now) {
            debug!(
                "Zone {} already executed this hour, skipping",
                matched.zone.label
            );
            return;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(
                "Execution already in flight, dropping trigger for {}",
                matched.zone.label
            );
            return;
        }

        // Marked before dispatch: an attempted execution consumes the hour
        // slot even if the swap itself fails.
        self.gate
            .mark_executed(&matched.zone.label, ZoneExecutionGate::bucket_for(now));

        let ctx = self.build_context(&matched, sample.filtered, raw_price, reserves);
        let deps = Arc::clone(&self.deps);
        let sizer = Arc::clone(&self.sizer);
        let in_flight = Arc::clone(&self.in_flight);
        let use_sim_sizing = self.use_sim_sizing;
        let fixed_trade_size = self.fixed_trade_size;
        let max_spread = self.max_spread;
        let fallback = self.fallback_balances;

        tokio::spawn(async move {
            execute_trigger(
                deps,
                sizer,
                ctx,
                use_sim_sizing,
                fixed_trade_size,
                max_spread,
                fallback,
            )
            .await;
            in_flight.store(false, Ordering::SeqCst);
        });
    }

    fn build_context(
        &self,
        matched: &ZoneMatch,
        filtered_price: f64,
        raw_price: f64,
        reserves: ReservePair,
    ) -> TradeContext {
        TradeContext {
            filtered_price,
            raw_price,
            lower_target: self.lower_target,
            upper_target: self.upper_target,
            reserves,
            intent: matched.intent,
            zone_label: matched.zone.label.clone(),
            order_id: matched.zone.order_id.clone(),
            desired_size: matched.zone.size * self.trade_unit,
            wallet_address: self.wallet_address.clone(),
        }
    }
}

/// One sizing-and-execution attempt for a triggered zone
///
/// Every failure path logs and returns; the decision loop keeps running
/// regardless of what happens here.
async fn execute_trigger(
    deps: Arc<TraderDeps>,
    sizer: Arc<TradeSizer>,
    ctx: TradeContext,
    use_sim_sizing: bool,
    fixed_trade_size: f64,
    max_spread: f64,
    fallback: WalletBalances,
) {
    let side = ctx.intent.side();
    let balances = match &ctx.wallet_address {
        Some(address) => match deps.balances.balances(address).await {
            Ok(balances) => balances,
            Err(e) => {
                warn!("Balance lookup failed, using fallback: {}", e);
                fallback
            }
        },
        None => fallback,
    };

    let exponent = sizer.offered_exponent(side);
    let desired = to_units(ctx.desired_size, exponent);

    let sized = if use_sim_sizing {
        sizer
            .size_with_simulation(deps.simulator.as_ref(), side, &ctx, &balances, desired)
            .await
    } else {
        None
    };
    let (amount, projected) = match sized {
        Some(sized) => (sized.amount, sized.projected_price),
        None => {
            // The zone's desired amount is what gets clamped; the fixed size
            // only stands in when the context carries no desired size.
            let fallback_amount = if desired > 0 {
                desired
            } else {
                to_units(fixed_trade_size, exponent)
            };
            let capped = sizer.cap_offer(side, &ctx.reserves, &balances, fallback_amount);
            (capped, None)
        }
    };
    if amount == 0 {
        warn!(
            "Zone {} sized to zero ({} side), nothing to execute",
            ctx.zone_label, side
        );
        return;
    }

    let denom = sizer.offered_denom(side);
    info!(
        "Executing {} for zone {}: offer {} {} (projected price {:?})",
        side, ctx.zone_label, amount, denom, projected
    );

    match deps.executor.execute(denom, amount, max_spread).await {
        Ok(ExecutionOutcome::Submitted { tx_hash }) => {
            info!("Swap submitted for zone {}: {}", ctx.zone_label, tx_hash);
            let text = format!(
                "{} {} | zone {} ({})\nprice {:.6} -> target {:.6}\noffer {} {}",
                ctx.intent,
                side,
                ctx.zone_label,
                ctx.order_id,
                ctx.filtered_price,
                match side {
                    crate::common::types::Side::Sell => ctx.upper_target,
                    crate::common::types::Side::Buy => ctx.lower_target,
                },
                amount,
                denom
            );
            deps.notifier.notify(&text, Some(&tx_hash)).await;
        }
        Ok(ExecutionOutcome::Skipped { reason }) => {
            info!("Swap skipped for zone {}: {}", ctx.zone_label, reason);
        }
        Err(e) => {
            warn!("Swap execution failed for zone {}: {}", ctx.zone_label, e);
            let text = format!("Execution failed for zone {}: {}", ctx.zone_label, e);
            deps.notifier.notify(&text, None).await;
        }
    }
}
