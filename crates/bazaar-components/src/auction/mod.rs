//! Continuous double auction over every resource.
//!
//! Per resource `r` the component contributes three mobile subspaces in
//! this order:
//!
//! - `"Buy_{r}"`: `max_bid_ask + 1` price levels, action `k` bids `k - 1`
//! - `"Sell_{r}"`: the same levels for asks
//! - `"Cancel_{r}"`: one action, cancel all own open orders on `r`
//!
//! An agent places at most one order per resource per step: when both a
//! buy and a sell on the same resource are selected, the buy is taken and
//! the sell is a no-op.
//!
//! Orders are single units. Committed coin and goods sit in the agent's
//! escrow until the order trades, is cancelled, expires or is evicted, so
//! every unit and coin is accounted for at all times. The optional
//! transaction cost is taken from the seller's proceeds and burned; the
//! running total is reported as the `fees_burned` metric.

mod book;

pub use book::{Order, OrderBook};

use indexmap::IndexMap;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use bazaar_component::{
    parse_config, ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext,
};
use bazaar_core::{
    AgentId, AgentKey, ComponentError, ComponentEvent, ConfigError, OrderSide, Resource, Timestep,
};
use bazaar_obs::{AgentObs, ObsValue};
use bazaar_world::{Agent, MarketHistory, World};

const SUBSPACES_PER_RESOURCE: usize = 3;
const BUY: usize = 0;
const SELL: usize = 1;
const CANCEL: usize = 2;

/// What happens when an agent at its order cap submits another order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapPolicy {
    /// New orders are masked out until an old one closes.
    #[default]
    Mask,
    /// The new order is accepted and the agent's oldest order, on any
    /// resource, is evicted with its escrow refunded.
    EvictOldest,
}

/// Auction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuctionConfig {
    /// Highest price level; prices run `0..=max_bid_ask`.
    pub max_bid_ask: u32,
    /// Open orders per agent, counted across every resource and side.
    pub max_num_orders: usize,
    /// Steps an order may rest before it expires. `None` never expires.
    pub order_duration: Option<u64>,
    /// Behaviour at the order cap.
    pub cap_policy: CapPolicy,
    /// Fraction of each trade's price withheld from the seller, in `[0, 1)`.
    pub transaction_cost: f64,
    /// Steps of price and volume history shown to the planner.
    pub history_len: usize,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            max_bid_ask: 10,
            max_num_orders: 5,
            order_duration: None,
            cap_policy: CapPolicy::Mask,
            transaction_cost: 0.0,
            history_len: 10,
        }
    }
}

impl AuctionConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: &str| {
            Err(ConfigError::ComponentConfig {
                component: ContinuousDoubleAuction::NAME.into(),
                reason: reason.into(),
            })
        };
        if self.max_num_orders == 0 {
            return bad("max_num_orders must be at least 1");
        }
        if self.order_duration == Some(0) {
            return bad("order_duration must be at least 1 when set");
        }
        if !(0.0..1.0).contains(&self.transaction_cost) {
            return bad("transaction_cost must be in [0, 1)");
        }
        Ok(())
    }

    fn levels(&self) -> usize {
        self.max_bid_ask as usize + 1
    }
}

#[derive(Clone, Debug, Default)]
struct MarketStats {
    last_price: [Option<u32>; Resource::COUNT],
    trades: [u64; Resource::COUNT],
    volume: [u64; Resource::COUNT],
    fees_burned: f64,
    step_price: [Option<u32>; Resource::COUNT],
    step_trades: [u64; Resource::COUNT],
}

/// Per-resource order books with price-time priority.
///
/// A new order trades against the best resting counter-order owned by a
/// different agent, at the resting order's price. Agents submit in a
/// random order drawn from the environment RNG.
#[derive(Debug)]
pub struct ContinuousDoubleAuction {
    config: AuctionConfig,
    book: OrderBook,
    stats: MarketStats,
}

impl ContinuousDoubleAuction {
    /// Registry name.
    pub const NAME: &'static str = "ContinuousDoubleAuction";

    /// Create with validated parameters.
    pub fn new(config: AuctionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            book: OrderBook::new(),
            stats: MarketStats::default(),
        })
    }

    /// Parameters in use.
    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    /// The resting orders.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Price of the most recent trade in `resource`.
    pub fn last_price(&self, resource: Resource) -> Option<u32> {
        self.stats.last_price[resource.index()]
    }

    /// Coin withheld from the sellers so far this episode.
    pub fn fees_burned(&self) -> f64 {
        self.stats.fees_burned
    }

    fn under_cap(&self, id: AgentId) -> bool {
        self.config.cap_policy == CapPolicy::EvictOldest
            || self.book.agent_orders(id) < self.config.max_num_orders
    }

    fn agent_mask(&self, world: &World, agent: &Agent) -> Vec<f32> {
        let levels = self.config.levels();
        let mut mask = Vec::with_capacity(Resource::COUNT * (2 * levels + 1));
        let id = agent.id();
        let open = !world.market_halted && self.under_cap(id);
        for r in Resource::ALL {
            for price in 0..levels {
                let legal = open && agent.coin() >= price as f64;
                mask.push(if legal { 1.0 } else { 0.0 });
            }
            let can_sell = open && agent.inventory.get(r) >= 1;
            mask.extend(std::iter::repeat_n(if can_sell { 1.0 } else { 0.0 }, levels));
            let can_cancel = self.book.open_orders(id, r) > 0;
            mask.push(if can_cancel { 1.0 } else { 0.0 });
        }
        mask
    }

    /// Give back what an order had in escrow.
    fn refund(world: &mut World, order: &Order) -> Result<(), ComponentError> {
        let agent = agent_mut(world, order.agent)?;
        match order.side {
            OrderSide::Bid => agent.refund_coin(f64::from(order.price)),
            OrderSide::Ask => agent.refund_resource(order.resource, 1),
        }
    }

    fn expire(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        let Some(duration) = self.config.order_duration else {
            return Ok(());
        };
        let now = ctx.timestep().0;
        let Some(cutoff) = now.checked_sub(duration) else {
            return Ok(());
        };
        for order in self.book.drain_placed_at_or_before(Timestep(cutoff)) {
            Self::refund(ctx.world, &order)?;
            ctx.emit(ComponentEvent::OrderExpired {
                agent: order.agent,
                side: order.side,
                resource: order.resource,
                price: order.price,
                seq: order.seq,
            });
        }
        Ok(())
    }

    fn cancel(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        id: AgentId,
        resource: Resource,
    ) -> Result<(), ComponentError> {
        for order in self.book.drain_agent(id, resource) {
            Self::refund(ctx.world, &order)?;
            ctx.emit(ComponentEvent::OrderCancelled {
                agent: order.agent,
                side: order.side,
                resource: order.resource,
                price: order.price,
                seq: order.seq,
            });
        }
        Ok(())
    }

    /// Make room under the cap. Returns `false` if the order must be
    /// dropped instead.
    fn make_room(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        id: AgentId,
    ) -> Result<bool, ComponentError> {
        if self.book.agent_orders(id) < self.config.max_num_orders {
            return Ok(true);
        }
        if self.config.cap_policy == CapPolicy::Mask {
            return Ok(false);
        }
        let Some(oldest) = self.book.oldest(id) else {
            return Ok(true);
        };
        if let Some(order) = self.book.remove(oldest.resource, oldest.side, oldest.seq) {
            Self::refund(ctx.world, &order)?;
            ctx.emit(ComponentEvent::OrderEvicted {
                agent: order.agent,
                side: order.side,
                resource: order.resource,
                price: order.price,
                seq: order.seq,
            });
        }
        Ok(true)
    }

    fn submit(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        id: AgentId,
        side: OrderSide,
        resource: Resource,
        price: u32,
    ) -> Result<(), ComponentError> {
        // The planner may have halted trading earlier in this step.
        if ctx.world.market_halted {
            return Ok(());
        }
        let agent = agent_mut(ctx.world, id)?;
        let affordable = match side {
            OrderSide::Bid => agent.coin() >= f64::from(price),
            OrderSide::Ask => agent.inventory.get(resource) >= 1,
        };
        if !affordable || !self.make_room(ctx, id)? {
            return Ok(());
        }
        let agent = agent_mut(ctx.world, id)?;
        match side {
            OrderSide::Bid => agent.escrow_coin_amount(f64::from(price))?,
            OrderSide::Ask => agent.escrow_resource(resource, 1)?,
        }

        let order = Order {
            agent: id,
            side,
            resource,
            price,
            seq: self.book.next_seq(),
            placed_at: ctx.timestep(),
        };
        ctx.emit(ComponentEvent::OrderPlaced {
            agent: id,
            side,
            resource,
            price,
            seq: order.seq,
        });

        let counter = match side {
            OrderSide::Bid => self
                .book
                .best_ask_excluding(resource, id)
                .filter(|ask| ask.price <= price),
            OrderSide::Ask => self
                .book
                .best_bid_excluding(resource, id)
                .filter(|bid| bid.price >= price),
        };
        match counter {
            Some(resting) => {
                self.book.remove(resource, resting.side, resting.seq);
                let (bid, ask) = match side {
                    OrderSide::Bid => (order, resting),
                    OrderSide::Ask => (resting, order),
                };
                self.settle(ctx, &bid, &ask, resting.price)?;
            }
            None => {
                trace!(agent = %id, ?side, %resource, price, "order resting");
                self.book.insert(order);
            }
        }
        Ok(())
    }

    /// Move one unit and its payment between escrows.
    fn settle(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        bid: &Order,
        ask: &Order,
        price: u32,
    ) -> Result<(), ComponentError> {
        let resource = bid.resource;
        let paid = f64::from(price);
        let fee = paid * self.config.transaction_cost;

        let seller = agent_mut(ctx.world, ask.agent)?;
        seller.take_escrowed_resource(resource, 1)?;
        seller.add_coin(paid - fee)?;

        let buyer = agent_mut(ctx.world, bid.agent)?;
        buyer.take_escrowed_coin(paid)?;
        buyer.refund_coin(f64::from(bid.price - price))?;
        buyer.inventory.add(resource, 1);

        let i = resource.index();
        self.stats.last_price[i] = Some(price);
        self.stats.trades[i] += 1;
        self.stats.volume[i] += u64::from(price);
        self.stats.fees_burned += fee;
        self.stats.step_price[i] = Some(price);
        self.stats.step_trades[i] += 1;
        debug!(buyer = %bid.agent, seller = %ask.agent, %resource, price, "trade");
        ctx.emit(ComponentEvent::Trade {
            buyer: bid.agent,
            seller: ask.agent,
            resource,
            price,
            bid: bid.price,
            ask: ask.price,
        });
        Ok(())
    }

    /// Escrow held by each agent must equal what its open orders committed.
    fn check_escrow(&self, world: &World) -> Result<(), ComponentError> {
        let n = world.n_agents();
        let mut coin = vec![0.0_f64; n];
        let mut goods = vec![[0_u64; Resource::COUNT]; n];
        for o in self.book.orders() {
            let i = o.agent.index();
            if i >= n {
                return Err(ComponentError::InvariantViolation {
                    reason: format!("order {} owned by unknown agent {}", o.seq, o.agent),
                });
            }
            match o.side {
                OrderSide::Bid => coin[i] += f64::from(o.price),
                OrderSide::Ask => goods[i][o.resource.index()] += 1,
            }
        }
        for (agent, (c, g)) in world.agents.iter().zip(coin.iter().zip(&goods)) {
            let goods_ok = Resource::ALL
                .into_iter()
                .all(|r| agent.escrow().get(r) == g[r.index()]);
            if agent.escrow_coin() != *c || !goods_ok {
                return Err(ComponentError::InvariantViolation {
                    reason: format!(
                        "agent {} escrow ({} coin, {:?}) does not match open orders ({c} coin, {g:?})",
                        agent.id(),
                        agent.escrow_coin(),
                        agent.escrow(),
                    ),
                });
            }
        }
        Ok(())
    }

    fn market_obs(&self, obs: &mut AgentObs) {
        for r in Resource::ALL {
            let level = |p: Option<u32>| p.map_or(-1.0, |p| p as f32);
            obs.insert(format!("best_bid-{r}"), ObsValue::Scalar(level(self.book.best_bid(r))));
            obs.insert(format!("best_ask-{r}"), ObsValue::Scalar(level(self.book.best_ask(r))));
            obs.insert(format!("last_price-{r}"), ObsValue::Scalar(level(self.last_price(r))));
        }
    }

    fn planner_obs(&self, world: &World, obs: &mut AgentObs) {
        let n = self.config.history_len;
        let market = &world.market;
        for r in Resource::ALL {
            obs.insert(
                format!("price_history-{r}"),
                ObsValue::Vector(MarketHistory::window(market.prices(r), n)),
            );
            obs.insert(
                format!("volume_history-{r}"),
                ObsValue::Vector(MarketHistory::window(market.volumes(r), n)),
            );
            obs.insert(format!("total_demand-{r}"), ObsValue::Scalar(market.demand(r) as f32));
            obs.insert(format!("total_supply-{r}"), ObsValue::Scalar(market.supply(r) as f32));
        }
    }

    /// Append this step's prices, volumes and book depth to the world's
    /// market history.
    fn record_step(&self, world: &mut World) {
        for r in Resource::ALL {
            let i = r.index();
            let price = self.stats.step_price[i].map(f64::from);
            world.market.record(r, price, self.stats.step_trades[i]);
            world.market.set_depth(
                r,
                self.book.depth(r, OrderSide::Bid) as u64,
                self.book.depth(r, OrderSide::Ask) as u64,
            );
        }
    }
}

fn agent_mut(world: &mut World, id: AgentId) -> Result<&mut Agent, ComponentError> {
    world
        .agent_mut(id)
        .ok_or_else(|| ComponentError::InvariantViolation {
            reason: format!("order references unknown agent {id}"),
        })
}

/// Registry factory.
pub fn factory(config: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    Ok(Box::new(ContinuousDoubleAuction::new(parse_config(
        ContinuousDoubleAuction::NAME,
        config,
    )?)?))
}

impl Component for ContinuousDoubleAuction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
        if class == AgentClass::Planner {
            return Vec::new();
        }
        let levels = self.config.levels();
        Resource::ALL
            .into_iter()
            .flat_map(|r| {
                [
                    ActionSubspace::new(format!("Buy_{r}"), levels),
                    ActionSubspace::new(format!("Sell_{r}"), levels),
                    ActionSubspace::new(format!("Cancel_{r}"), 1),
                ]
            })
            .collect()
    }

    fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        world
            .agents
            .iter()
            .map(|a| (AgentKey::Agent(a.id()), self.agent_mask(world, a)))
            .collect()
    }

    fn component_step(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        self.stats.step_price = [None; Resource::COUNT];
        self.stats.step_trades = [0; Resource::COUNT];
        self.expire(ctx)?;

        let mut order: Vec<AgentKey> = actions
            .agents()
            .filter(|k| !k.is_planner())
            .collect();
        order.shuffle(&mut *ctx.rng);

        for key in order {
            let Some(id) = key.agent_id() else { continue };
            for r in Resource::ALL {
                let base = r.index() * SUBSPACES_PER_RESOURCE;
                if actions.get(key, base + CANCEL).is_some() {
                    self.cancel(ctx, id, r)?;
                }
                let buy = actions.get(key, base + BUY).map(|k| (OrderSide::Bid, k));
                let sell = actions.get(key, base + SELL).map(|k| (OrderSide::Ask, k));
                if let Some((side, k)) = buy.or(sell) {
                    self.submit(ctx, id, side, r, price_of(k))?;
                }
            }
        }
        self.record_step(ctx.world);
        self.check_escrow(ctx.world)
    }

    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs> {
        let mut out: IndexMap<AgentKey, AgentObs> = world
            .agents
            .iter()
            .map(|a| {
                let mut obs = AgentObs::new();
                self.market_obs(&mut obs);
                for r in Resource::ALL {
                    let bids = self.book.count(a.id(), r, OrderSide::Bid);
                    let asks = self.book.count(a.id(), r, OrderSide::Ask);
                    obs.insert(format!("own_bids-{r}"), ObsValue::Scalar(bids as f32));
                    obs.insert(format!("own_asks-{r}"), ObsValue::Scalar(asks as f32));
                }
                (AgentKey::Agent(a.id()), obs)
            })
            .collect();
        if world.planner.is_some() {
            let mut obs = AgentObs::new();
            self.market_obs(&mut obs);
            self.planner_obs(world, &mut obs);
            out.insert(AgentKey::Planner, obs);
        }
        out
    }

    fn reset(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.book.clear();
        self.stats = MarketStats::default();
        Ok(())
    }

    fn metrics(&self, _world: &World) -> IndexMap<String, f64> {
        let mut m = IndexMap::new();
        for r in Resource::ALL {
            let i = r.index();
            let trades = self.stats.trades[i];
            m.insert(format!("trades-{r}"), trades as f64);
            if trades > 0 {
                m.insert(
                    format!("mean_price-{r}"),
                    self.stats.volume[i] as f64 / trades as f64,
                );
            }
        }
        m.insert("open_orders".to_string(), self.book.len() as f64);
        m.insert("fees_burned".to_string(), self.stats.fees_burned);
        m
    }
}

/// Price level for a 1-based action index.
fn price_of(action: usize) -> u32 {
    u32::try_from(action - 1).unwrap_or(u32::MAX)
}
