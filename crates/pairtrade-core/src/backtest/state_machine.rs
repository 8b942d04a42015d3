use serde::{Deserialize, Serialize};

use crate::types::StrategyConfig;

/// Current exposure to the spread. At most one position is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Flat,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    EnterLong,
    EnterShort,
    Exit,
}

/// A position transition emitted by the state machine.
/// `pnl` is present exactly when `action` is `Exit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub bar: usize,
    pub action: TradeAction,
    pub price: f64,
    pub zscore: f64,
    pub pnl: Option<f64>,
}

/// Threshold-driven flat/long/short state machine over a z-score stream.
///
/// A high z-score means the spread is rich relative to its rolling mean,
/// so the machine shorts it expecting reversion; a low z-score goes long.
/// Exits fire on sufficient reversion or on an adverse move past the
/// stop-loss level, always fully closing the position. The machine may
/// end a series mid-position; no final exit is synthesized.
#[derive(Debug, Clone)]
pub struct TradingStateMachine {
    config: StrategyConfig,
    position: Position,
    entry_price: f64,
}

impl TradingStateMachine {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            position: Position::Flat,
            entry_price: 0.0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Advance one bar with the current z-score and spread value.
    /// Returns the transition taken on this bar, if any.
    pub fn on_bar(&mut self, bar: usize, z: f64, price: f64) -> Option<Trade> {
        match self.position {
            Position::Flat => {
                if z > self.config.entry_threshold {
                    self.position = Position::Short;
                    self.entry_price = price;
                    Some(Trade {
                        bar,
                        action: TradeAction::EnterShort,
                        price,
                        zscore: z,
                        pnl: None,
                    })
                } else if z < -self.config.entry_threshold {
                    self.position = Position::Long;
                    self.entry_price = price;
                    Some(Trade {
                        bar,
                        action: TradeAction::EnterLong,
                        price,
                        zscore: z,
                        pnl: None,
                    })
                } else {
                    None
                }
            }
            Position::Long => {
                let reverted = z > -self.config.exit_threshold;
                let stopped = z < -self.config.stop_loss;
                if reverted || stopped {
                    let pnl = (price - self.entry_price) * (1.0 - self.config.transaction_cost);
                    self.close(bar, z, price, pnl)
                } else {
                    None
                }
            }
            Position::Short => {
                let reverted = z < self.config.exit_threshold;
                let stopped = z > self.config.stop_loss;
                if reverted || stopped {
                    let pnl = (self.entry_price - price) * (1.0 - self.config.transaction_cost);
                    self.close(bar, z, price, pnl)
                } else {
                    None
                }
            }
        }
    }

    fn close(&mut self, bar: usize, z: f64, price: f64, pnl: f64) -> Option<Trade> {
        self.position = Position::Flat;
        self.entry_price = 0.0;
        Some(Trade {
            bar,
            action: TradeAction::Exit,
            price,
            zscore: z,
            pnl: Some(pnl),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StrategyConfig {
        StrategyConfig {
            entry_threshold: 2.0,
            exit_threshold: 0.5,
            stop_loss: 4.0,
            transaction_cost: 0.0,
            position_size: 10_000.0,
        }
    }

    #[test]
    fn test_enter_short_above_entry_threshold() {
        let mut machine = TradingStateMachine::new(config());
        let trade = machine.on_bar(0, 2.5, 10.0).unwrap();
        assert_eq!(trade.action, TradeAction::EnterShort);
        assert_eq!(trade.price, 10.0);
        assert_eq!(trade.pnl, None);
        assert_eq!(machine.position(), Position::Short);
    }

    #[test]
    fn test_enter_long_below_negative_entry_threshold() {
        let mut machine = TradingStateMachine::new(config());
        let trade = machine.on_bar(0, -2.5, 10.0).unwrap();
        assert_eq!(trade.action, TradeAction::EnterLong);
        assert_eq!(machine.position(), Position::Long);
    }

    #[test]
    fn test_no_entry_inside_band() {
        let mut machine = TradingStateMachine::new(config());
        assert!(machine.on_bar(0, 1.9, 10.0).is_none());
        assert!(machine.on_bar(1, -1.9, 10.0).is_none());
        assert_eq!(machine.position(), Position::Flat);
    }

    #[test]
    fn test_long_exit_on_reversion_pnl_sign() {
        let mut machine = TradingStateMachine::new(config());
        machine.on_bar(0, -2.5, 10.0);
        // Held while deep below the exit band.
        assert!(machine.on_bar(1, -1.0, 10.5).is_none());
        let exit = machine.on_bar(2, -0.2, 12.0).unwrap();
        assert_eq!(exit.action, TradeAction::Exit);
        assert_eq!(exit.pnl, Some(2.0));
        assert_eq!(machine.position(), Position::Flat);
    }

    #[test]
    fn test_long_stop_loss_exit() {
        let mut machine = TradingStateMachine::new(config());
        machine.on_bar(0, -2.5, 10.0);
        let exit = machine.on_bar(1, -4.5, 7.0).unwrap();
        assert_eq!(exit.action, TradeAction::Exit);
        assert_eq!(exit.pnl, Some(-3.0));
    }

    #[test]
    fn test_short_exit_on_reversion_pnl_sign() {
        let mut machine = TradingStateMachine::new(config());
        machine.on_bar(0, 2.5, 10.0);
        assert!(machine.on_bar(1, 1.0, 9.5).is_none());
        let exit = machine.on_bar(2, 0.2, 8.0).unwrap();
        assert_eq!(exit.pnl, Some(2.0));
    }

    #[test]
    fn test_short_stop_loss_exit() {
        let mut machine = TradingStateMachine::new(config());
        machine.on_bar(0, 2.5, 10.0);
        let exit = machine.on_bar(1, 4.5, 13.0).unwrap();
        assert_eq!(exit.pnl, Some(-3.0));
    }

    #[test]
    fn test_transaction_cost_shrinks_pnl_magnitude() {
        let mut costless = TradingStateMachine::new(config());
        let mut costly = TradingStateMachine::new(StrategyConfig {
            transaction_cost: 0.01,
            ..config()
        });
        for machine in [&mut costless, &mut costly] {
            machine.on_bar(0, -2.5, 10.0);
        }
        let free = costless.on_bar(1, 0.0, 12.0).unwrap().pnl.unwrap();
        let taxed = costly.on_bar(1, 0.0, 12.0).unwrap().pnl.unwrap();
        assert!((free - 2.0).abs() < 1e-12);
        assert!((taxed - 1.98).abs() < 1e-12);
        assert!(taxed.abs() < free.abs());
    }

    #[test]
    fn test_no_entry_while_position_open() {
        let mut machine = TradingStateMachine::new(config());
        machine.on_bar(0, 2.5, 10.0);
        // An even more extreme z-score while short must not re-enter;
        // it stays short because neither exit condition holds.
        assert!(machine.on_bar(1, 3.0, 11.0).is_none());
        assert_eq!(machine.position(), Position::Short);
    }

    #[test]
    fn test_one_cycle_per_oscillation() {
        // z swinging between +3 and −3: each full swing is one short
        // entry and one exit.
        let mut machine = TradingStateMachine::new(config());
        let mut entries = 0;
        let mut exits = 0;
        for cycle in 0..5 {
            let bar = cycle * 2;
            if let Some(t) = machine.on_bar(bar, 3.0, 1.0) {
                assert_eq!(t.action, TradeAction::EnterShort);
                entries += 1;
            }
            if let Some(t) = machine.on_bar(bar + 1, -3.0, -1.0) {
                assert_eq!(t.action, TradeAction::Exit);
                exits += 1;
            }
        }
        assert_eq!(entries, 5);
        assert_eq!(exits, 5);
    }

    #[test]
    fn test_exit_preceded_by_exactly_one_entry() {
        let mut machine = TradingStateMachine::new(config());
        let zs = [0.0, 2.5, 3.0, 0.1, -2.6, -1.0, 0.4, 2.2, 5.0];
        let mut open = false;
        for (bar, &z) in zs.iter().enumerate() {
            if let Some(trade) = machine.on_bar(bar, z, z) {
                match trade.action {
                    TradeAction::EnterLong | TradeAction::EnterShort => {
                        assert!(!open, "entry while a position was open");
                        assert!(trade.pnl.is_none());
                        open = true;
                    }
                    TradeAction::Exit => {
                        assert!(open, "exit without a prior entry");
                        assert!(trade.pnl.is_some());
                        open = false;
                    }
                }
            }
        }
    }
}
