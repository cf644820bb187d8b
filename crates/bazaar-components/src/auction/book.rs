//! Resting orders and price-time priority.

use bazaar_core::{AgentId, OrderSide, Resource, Timestep};

/// One resting unit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    /// Owner.
    pub agent: AgentId,
    /// Bid or ask.
    pub side: OrderSide,
    /// Traded resource.
    pub resource: Resource,
    /// Limit price.
    pub price: u32,
    /// Book-wide insertion number; lower is earlier.
    pub seq: u64,
    /// Step the order was placed in.
    pub placed_at: Timestep,
}

/// All resting orders, per resource and side.
///
/// Orders are kept in insertion order, so scanning for the best price
/// and keeping the first hit gives earliest-first among equal prices.
#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    bids: [Vec<Order>; Resource::COUNT],
    asks: [Vec<Order>; Resource::COUNT],
    next_seq: u64,
}

impl OrderBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every order and restart sequence numbering.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn side(&self, resource: Resource, side: OrderSide) -> &Vec<Order> {
        match side {
            OrderSide::Bid => &self.bids[resource.index()],
            OrderSide::Ask => &self.asks[resource.index()],
        }
    }

    fn side_mut(&mut self, resource: Resource, side: OrderSide) -> &mut Vec<Order> {
        match side {
            OrderSide::Bid => &mut self.bids[resource.index()],
            OrderSide::Ask => &mut self.asks[resource.index()],
        }
    }

    /// Allocate the next sequence number.
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Rest an order.
    pub fn insert(&mut self, order: Order) {
        self.side_mut(order.resource, order.side).push(order);
    }

    /// Remove the order with `seq`, if present.
    pub fn remove(&mut self, resource: Resource, side: OrderSide, seq: u64) -> Option<Order> {
        let book = self.side_mut(resource, side);
        let idx = book.iter().position(|o| o.seq == seq)?;
        Some(book.remove(idx))
    }

    /// The lowest ask not owned by `buyer`, earliest first among ties.
    pub fn best_ask_excluding(&self, resource: Resource, buyer: AgentId) -> Option<Order> {
        self.asks[resource.index()]
            .iter()
            .filter(|o| o.agent != buyer)
            .fold(None, |best: Option<&Order>, o| match best {
                Some(b) if b.price <= o.price => Some(b),
                _ => Some(o),
            })
            .copied()
    }

    /// The highest bid not owned by `seller`, earliest first among ties.
    pub fn best_bid_excluding(&self, resource: Resource, seller: AgentId) -> Option<Order> {
        self.bids[resource.index()]
            .iter()
            .filter(|o| o.agent != seller)
            .fold(None, |best: Option<&Order>, o| match best {
                Some(b) if b.price >= o.price => Some(b),
                _ => Some(o),
            })
            .copied()
    }

    /// Highest resting bid price.
    pub fn best_bid(&self, resource: Resource) -> Option<u32> {
        self.bids[resource.index()].iter().map(|o| o.price).max()
    }

    /// Lowest resting ask price.
    pub fn best_ask(&self, resource: Resource) -> Option<u32> {
        self.asks[resource.index()].iter().map(|o| o.price).min()
    }

    /// Resting orders on `side` of `resource`.
    pub fn depth(&self, resource: Resource, side: OrderSide) -> usize {
        self.side(resource, side).len()
    }

    /// Open orders `agent` has on `side` of `resource`.
    pub fn count(&self, agent: AgentId, resource: Resource, side: OrderSide) -> usize {
        self.side(resource, side)
            .iter()
            .filter(|o| o.agent == agent)
            .count()
    }

    /// Open orders `agent` has on `resource`, both sides.
    pub fn open_orders(&self, agent: AgentId, resource: Resource) -> usize {
        self.count(agent, resource, OrderSide::Bid) + self.count(agent, resource, OrderSide::Ask)
    }

    /// Open orders `agent` has across every resource and side.
    pub fn agent_orders(&self, agent: AgentId) -> usize {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .flatten()
            .filter(|o| o.agent == agent)
            .count()
    }

    /// `agent`'s earliest open order on any resource, either side.
    pub fn oldest(&self, agent: AgentId) -> Option<Order> {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .flatten()
            .filter(|o| o.agent == agent)
            .min_by_key(|o| o.seq)
            .copied()
    }

    /// Remove and return all of `agent`'s orders on `resource`, in
    /// sequence order.
    pub fn drain_agent(&mut self, agent: AgentId, resource: Resource) -> Vec<Order> {
        self.drain_where(|o| o.agent == agent && o.resource == resource)
    }

    /// Remove and return every order placed at or before `cutoff`, in
    /// sequence order.
    pub fn drain_placed_at_or_before(&mut self, cutoff: Timestep) -> Vec<Order> {
        self.drain_where(|o| o.placed_at <= cutoff)
    }

    fn drain_where(&mut self, pred: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut out = Vec::new();
        for book in self.bids.iter_mut().chain(self.asks.iter_mut()) {
            let (take, keep): (Vec<Order>, Vec<Order>) = book.drain(..).partition(|o| pred(o));
            *book = keep;
            out.extend(take);
        }
        out.sort_by_key(|o| o.seq);
        out
    }

    /// Every resting order, in sequence order.
    pub fn orders(&self) -> Vec<Order> {
        let mut all: Vec<Order> = self
            .bids
            .iter()
            .chain(self.asks.iter())
            .flat_map(|b| b.iter().copied())
            .collect();
        all.sort_by_key(|o| o.seq);
        all
    }

    /// Number of resting orders.
    pub fn len(&self) -> usize {
        self.bids.iter().chain(self.asks.iter()).map(Vec::len).sum()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(book: &mut OrderBook, agent: u32, side: OrderSide, price: u32) -> Order {
        let o = Order {
            agent: AgentId(agent),
            side,
            resource: Resource::Wood,
            price,
            seq: book.next_seq(),
            placed_at: Timestep(0),
        };
        book.insert(o);
        o
    }

    #[test]
    fn best_ask_is_lowest_then_earliest() {
        let mut book = OrderBook::new();
        order(&mut book, 1, OrderSide::Ask, 12);
        let early = order(&mut book, 2, OrderSide::Ask, 10);
        order(&mut book, 3, OrderSide::Ask, 10);
        assert_eq!(book.best_ask_excluding(Resource::Wood, AgentId(0)), Some(early));
        // The owner's own order is skipped.
        let next = book.best_ask_excluding(Resource::Wood, AgentId(2)).unwrap();
        assert_eq!(next.agent, AgentId(3));
    }

    #[test]
    fn best_bid_is_highest_then_earliest() {
        let mut book = OrderBook::new();
        let first = order(&mut book, 1, OrderSide::Bid, 10);
        order(&mut book, 2, OrderSide::Bid, 10);
        order(&mut book, 3, OrderSide::Bid, 4);
        assert_eq!(book.best_bid_excluding(Resource::Wood, AgentId(9)), Some(first));
        assert_eq!(book.best_bid(Resource::Wood), Some(10));
        assert_eq!(book.best_ask(Resource::Wood), None);
    }

    #[test]
    fn drain_agent_removes_only_theirs() {
        let mut book = OrderBook::new();
        order(&mut book, 1, OrderSide::Bid, 3);
        order(&mut book, 2, OrderSide::Ask, 5);
        order(&mut book, 1, OrderSide::Ask, 7);
        let drained = book.drain_agent(AgentId(1), Resource::Wood);
        assert_eq!(drained.len(), 2);
        assert!(drained[0].seq < drained[1].seq);
        assert_eq!(book.len(), 1);
        assert_eq!(book.open_orders(AgentId(1), Resource::Wood), 0);
    }

    #[test]
    fn oldest_spans_sides_and_resources() {
        let mut book = OrderBook::new();
        let stone = Order {
            agent: AgentId(1),
            side: OrderSide::Bid,
            resource: Resource::Stone,
            price: 2,
            seq: book.next_seq(),
            placed_at: Timestep(0),
        };
        book.insert(stone);
        order(&mut book, 1, OrderSide::Ask, 5);
        order(&mut book, 1, OrderSide::Bid, 3);
        order(&mut book, 2, OrderSide::Bid, 3);
        assert_eq!(book.oldest(AgentId(1)), Some(stone));
        assert_eq!(book.agent_orders(AgentId(1)), 3);
        assert_eq!(book.open_orders(AgentId(1), Resource::Wood), 2);
    }

    #[test]
    fn drain_includes_the_cutoff_step() {
        let mut book = OrderBook::new();
        let mut at = |step| {
            let o = Order {
                agent: AgentId(0),
                side: OrderSide::Ask,
                resource: Resource::Wood,
                price: 1,
                seq: book.next_seq(),
                placed_at: Timestep(step),
            };
            book.insert(o);
        };
        at(1);
        at(2);
        at(3);
        let drained = book.drain_placed_at_or_before(Timestep(2));
        assert_eq!(drained.len(), 2);
        assert_eq!(book.len(), 1);
    }
}
