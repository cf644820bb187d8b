//! Structured events emitted by components during a step.
//!
//! Events are the component-local audit trail: the orchestrator collects
//! them per component, per step, and the dense log stores them keyed by
//! component name. They describe what *happened*; they are never read
//! back to drive simulation state.

use serde::{Deserialize, Serialize};

use crate::id::AgentId;
use crate::position::Position;
use crate::resource::Resource;

/// Side of a double-auction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// Offer to buy one unit.
    Bid,
    /// Offer to sell one unit.
    Ask,
}

/// A single structured event emitted by a component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ComponentEvent {
    /// An agent moved one cell.
    Moved {
        /// The moving agent.
        agent: AgentId,
        /// Cell before the move.
        from: Position,
        /// Cell after the move.
        to: Position,
    },
    /// An agent harvested a resource tile.
    Collected {
        /// The collecting agent.
        agent: AgentId,
        /// Resource type collected.
        resource: Resource,
        /// Units added to the agent's inventory.
        amount: u64,
        /// The harvested cell.
        at: Position,
    },
    /// An agent built a house.
    Built {
        /// The builder.
        agent: AgentId,
        /// Cell the house now occupies.
        at: Position,
        /// Coin paid to the builder.
        payment: f64,
    },
    /// A new order entered the book (it may match immediately).
    OrderPlaced {
        /// Submitting agent.
        agent: AgentId,
        /// Bid or ask.
        side: OrderSide,
        /// Traded resource.
        resource: Resource,
        /// Limit price.
        price: u32,
        /// Book-wide insertion sequence number.
        seq: u64,
    },
    /// An order was removed at its owner's request.
    OrderCancelled {
        /// Owning agent.
        agent: AgentId,
        /// Bid or ask.
        side: OrderSide,
        /// Traded resource.
        resource: Resource,
        /// Limit price.
        price: u32,
        /// Insertion sequence number.
        seq: u64,
    },
    /// An order outlived the configured order duration.
    OrderExpired {
        /// Owning agent.
        agent: AgentId,
        /// Bid or ask.
        side: OrderSide,
        /// Traded resource.
        resource: Resource,
        /// Limit price.
        price: u32,
        /// Insertion sequence number.
        seq: u64,
    },
    /// An order was evicted to make room under the per-agent order cap.
    OrderEvicted {
        /// Owning agent.
        agent: AgentId,
        /// Bid or ask.
        side: OrderSide,
        /// Traded resource.
        resource: Resource,
        /// Limit price.
        price: u32,
        /// Insertion sequence number.
        seq: u64,
    },
    /// One unit changed hands.
    Trade {
        /// Receiving agent.
        buyer: AgentId,
        /// Delivering agent.
        seller: AgentId,
        /// Traded resource.
        resource: Resource,
        /// Execution price (the resting order's price).
        price: u32,
        /// Bid limit price.
        bid: u32,
        /// Ask limit price.
        ask: u32,
    },
    /// The planner halted or resumed trading.
    MarketHalted {
        /// `true` when trading is now halted.
        halted: bool,
    },
}

impl ComponentEvent {
    /// The agent this event is primarily about, if any.
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            Self::Moved { agent, .. }
            | Self::Collected { agent, .. }
            | Self::Built { agent, .. }
            | Self::OrderPlaced { agent, .. }
            | Self::OrderCancelled { agent, .. }
            | Self::OrderExpired { agent, .. }
            | Self::OrderEvicted { agent, .. } => Some(*agent),
            Self::Trade { buyer, .. } => Some(*buyer),
            Self::MarketHalted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let ev = ComponentEvent::Trade {
            buyer: AgentId(0),
            seller: AgentId(1),
            resource: Resource::Wood,
            price: 10,
            bid: 12,
            ask: 10,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "Trade");
        assert_eq!(json["price"], 10);
        let back: ComponentEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn every_variant_roundtrips_through_json() {
        let (agent, at) = (AgentId(2), Position::new(1, 3));
        let (side, resource, price, seq) = (OrderSide::Ask, Resource::Stone, 4, 17);
        let events = vec![
            ComponentEvent::Moved { agent, from: Position::new(1, 2), to: at },
            ComponentEvent::Collected { agent, resource: Resource::Wood, amount: 1, at },
            ComponentEvent::Built { agent, at, payment: 12.5 },
            ComponentEvent::OrderPlaced { agent, side, resource, price, seq },
            ComponentEvent::OrderCancelled { agent, side: OrderSide::Bid, resource, price, seq },
            ComponentEvent::OrderExpired { agent, side, resource, price, seq },
            ComponentEvent::OrderEvicted { agent, side, resource, price, seq },
            ComponentEvent::Trade {
                buyer: AgentId(0),
                seller: agent,
                resource,
                price,
                bid: 5,
                ask: 4,
            },
            ComponentEvent::MarketHalted { halted: true },
        ];
        for ev in events {
            let json = serde_json::to_value(&ev).unwrap();
            assert!(json["kind"].is_string(), "untagged: {json}");
            let back: ComponentEvent = serde_json::from_value(json).unwrap();
            assert_eq!(back, ev);
        }
    }

    #[test]
    fn trade_event_is_attributed_to_buyer() {
        let ev = ComponentEvent::Trade {
            buyer: AgentId(4),
            seller: AgentId(1),
            resource: Resource::Stone,
            price: 3,
            bid: 3,
            ask: 2,
        };
        assert_eq!(ev.agent(), Some(AgentId(4)));
        assert_eq!(ComponentEvent::MarketHalted { halted: true }.agent(), None);
    }
}
