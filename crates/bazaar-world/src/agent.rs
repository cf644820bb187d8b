//! Mobile agents and the planner.

use bazaar_core::{AgentId, ComponentError, Position, Resource};

use crate::inventory::Inventory;

/// A mobile agent on the grid.
///
/// Coin and escrow are private: every mutation goes through a checked
/// method so no component can drive a balance negative. Goods and coin
/// committed to open orders sit in escrow and still count towards the
/// agent's totals for conservation checks.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    id: AgentId,
    /// Current cell.
    pub position: Position,
    /// Resources held and free to use.
    pub inventory: Inventory,
    escrow: Inventory,
    coin: f64,
    escrow_coin: f64,
    labor: f64,
    /// Build skill, drawn at reset by the component that uses it.
    pub skill: f64,
    /// Cached legality mask over the agent's combined action space.
    pub action_mask: Vec<f32>,
}

impl Agent {
    /// A fresh agent at the origin with nothing in hand.
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            position: Position::new(0, 0),
            inventory: Inventory::new(),
            escrow: Inventory::new(),
            coin: 0.0,
            escrow_coin: 0.0,
            labor: 0.0,
            skill: 1.0,
            action_mask: Vec::new(),
        }
    }

    /// The agent's ID.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Clear all mutable state, keeping the ID.
    pub fn reset(&mut self) {
        *self = Self::new(self.id);
    }

    /// Spendable coin.
    pub fn coin(&self) -> f64 {
        self.coin
    }

    /// Coin committed to open bids.
    pub fn escrow_coin(&self) -> f64 {
        self.escrow_coin
    }

    /// Spendable plus escrowed coin.
    pub fn total_coin(&self) -> f64 {
        self.coin + self.escrow_coin
    }

    /// Resources committed to open asks.
    pub fn escrow(&self) -> &Inventory {
        &self.escrow
    }

    /// Held plus escrowed units of `resource`.
    pub fn total_resource(&self, resource: Resource) -> u64 {
        self.inventory.get(resource) + self.escrow.get(resource)
    }

    /// Accumulated labor.
    pub fn labor(&self) -> f64 {
        self.labor
    }

    /// Add labor. Negative or non-finite amounts are rejected.
    pub fn add_labor(&mut self, amount: f64) -> Result<(), ComponentError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ComponentError::InvariantViolation {
                reason: format!("agent {} labor increment {amount}", self.id),
            });
        }
        self.labor += amount;
        Ok(())
    }

    /// Credit coin. Negative or non-finite amounts are rejected.
    pub fn add_coin(&mut self, amount: f64) -> Result<(), ComponentError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ComponentError::InvariantViolation {
                reason: format!("agent {} coin credit {amount}", self.id),
            });
        }
        self.coin += amount;
        Ok(())
    }

    /// Debit spendable coin.
    pub fn remove_coin(&mut self, amount: f64) -> Result<(), ComponentError> {
        if amount < 0.0 || amount > self.coin {
            return Err(ComponentError::InsufficientCoin {
                agent: self.id,
                held: self.coin,
                requested: amount,
            });
        }
        self.coin -= amount;
        Ok(())
    }

    /// Move coin from the spendable balance into escrow.
    pub fn escrow_coin_amount(&mut self, amount: f64) -> Result<(), ComponentError> {
        self.remove_coin(amount)?;
        self.escrow_coin += amount;
        Ok(())
    }

    /// Return escrowed coin to the spendable balance.
    pub fn refund_coin(&mut self, amount: f64) -> Result<(), ComponentError> {
        self.take_escrowed_coin(amount)?;
        self.coin += amount;
        Ok(())
    }

    /// Remove coin from escrow for payment to someone else.
    pub fn take_escrowed_coin(&mut self, amount: f64) -> Result<(), ComponentError> {
        if amount < 0.0 || amount > self.escrow_coin {
            return Err(ComponentError::InsufficientCoin {
                agent: self.id,
                held: self.escrow_coin,
                requested: amount,
            });
        }
        self.escrow_coin -= amount;
        Ok(())
    }

    /// Debit held units of `resource`.
    pub fn remove_resource(&mut self, resource: Resource, amount: u64) -> Result<(), ComponentError> {
        let held = self.inventory.get(resource);
        if self.inventory.checked_remove(resource, amount) {
            Ok(())
        } else {
            Err(ComponentError::InsufficientInventory {
                agent: self.id,
                resource,
                held,
                requested: amount,
            })
        }
    }

    /// Debit every resource in `cost` atomically.
    pub fn pay(&mut self, cost: &Inventory) -> Result<(), ComponentError> {
        if let Some((resource, requested)) =
            cost.iter().find(|&(r, n)| self.inventory.get(r) < n)
        {
            return Err(ComponentError::InsufficientInventory {
                agent: self.id,
                resource,
                held: self.inventory.get(resource),
                requested,
            });
        }
        for (r, n) in cost.iter() {
            self.remove_resource(r, n)?;
        }
        Ok(())
    }

    /// Move units of `resource` into escrow.
    pub fn escrow_resource(&mut self, resource: Resource, amount: u64) -> Result<(), ComponentError> {
        self.remove_resource(resource, amount)?;
        self.escrow.add(resource, amount);
        Ok(())
    }

    /// Return escrowed units to the inventory.
    pub fn refund_resource(&mut self, resource: Resource, amount: u64) -> Result<(), ComponentError> {
        self.take_escrowed_resource(resource, amount)?;
        self.inventory.add(resource, amount);
        Ok(())
    }

    /// Remove escrowed units for delivery to someone else.
    pub fn take_escrowed_resource(
        &mut self,
        resource: Resource,
        amount: u64,
    ) -> Result<(), ComponentError> {
        let held = self.escrow.get(resource);
        if self.escrow.checked_remove(resource, amount) {
            Ok(())
        } else {
            Err(ComponentError::InsufficientInventory {
                agent: self.id,
                resource,
                held,
                requested: amount,
            })
        }
    }
}

/// The social planner: no cell, no inventory, only an action mask.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Planner {
    /// Cached legality mask over the planner's combined action space.
    pub action_mask: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_cannot_go_negative() {
        let mut a = Agent::new(AgentId(0));
        a.add_coin(5.0).unwrap();
        assert!(matches!(
            a.remove_coin(6.0),
            Err(ComponentError::InsufficientCoin { .. })
        ));
        assert_eq!(a.coin(), 5.0);
        assert!(a.add_coin(-1.0).is_err());
        assert!(a.add_coin(f64::NAN).is_err());
    }

    #[test]
    fn escrow_round_trip_preserves_totals() {
        let mut a = Agent::new(AgentId(1));
        a.add_coin(20.0).unwrap();
        a.inventory.add(Resource::Wood, 3);

        a.escrow_coin_amount(12.0).unwrap();
        a.escrow_resource(Resource::Wood, 1).unwrap();
        assert_eq!(a.coin(), 8.0);
        assert_eq!(a.total_coin(), 20.0);
        assert_eq!(a.total_resource(Resource::Wood), 3);

        a.refund_coin(12.0).unwrap();
        a.refund_resource(Resource::Wood, 1).unwrap();
        assert_eq!(a.coin(), 20.0);
        assert_eq!(a.escrow().get(Resource::Wood), 0);
        assert!(a.refund_resource(Resource::Wood, 1).is_err());
    }

    #[test]
    fn pay_is_all_or_nothing() {
        let mut a = Agent::new(AgentId(2));
        a.inventory.add(Resource::Wood, 1);
        let cost = Inventory::from_pairs([(Resource::Wood, 1), (Resource::Stone, 1)]);
        let err = a.pay(&cost).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::InsufficientInventory {
                resource: Resource::Stone,
                ..
            }
        ));
        assert_eq!(a.inventory.get(Resource::Wood), 1);
    }

    #[test]
    fn reset_keeps_id_only() {
        let mut a = Agent::new(AgentId(3));
        a.add_coin(1.0).unwrap();
        a.add_labor(2.0).unwrap();
        a.skill = 4.0;
        a.reset();
        assert_eq!(a.id(), AgentId(3));
        assert_eq!(a.coin(), 0.0);
        assert_eq!(a.labor(), 0.0);
        assert_eq!(a.skill, 1.0);
    }
}
