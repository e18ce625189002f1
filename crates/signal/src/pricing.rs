use common::Direction;

/// Pip size for a currency pair: 0.01 when JPY is the quote currency,
/// 0.0001 otherwise. Decided by the symbol suffix, not a lookup table.
pub fn pip_size(symbol: &str) -> f64 {
    if symbol.trim().to_ascii_uppercase().ends_with("JPY") {
        0.01
    } else {
        0.0001
    }
}

/// Stop-loss and take-profit around an entry price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Place the stop `sl_pips` against the trade and the target `tp_pips` with it.
pub fn bracket(direction: Direction, price: f64, pip: f64, sl_pips: f64, tp_pips: f64) -> Bracket {
    let sl = sl_pips * pip;
    let tp = tp_pips * pip;
    match direction {
        Direction::Buy => Bracket {
            entry: price,
            stop_loss: price - sl,
            take_profit: price + tp,
        },
        Direction::Sell => Bracket {
            entry: price,
            stop_loss: price + sl,
            take_profit: price - tp,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pip_size_by_quote_currency() {
        assert_eq!(pip_size("EURUSD"), 0.0001);
        assert_eq!(pip_size("GBPUSD"), 0.0001);
        assert_eq!(pip_size("USDJPY"), 0.01);
        assert_eq!(pip_size("eurjpy"), 0.01);
    }

    #[test]
    fn buy_bracket() {
        let b = bracket(Direction::Buy, 1.08000, 0.0001, 10.0, 20.0);
        assert!(close(b.entry, 1.08000));
        assert!(close(b.stop_loss, 1.07900));
        assert!(close(b.take_profit, 1.08200));
    }

    #[test]
    fn sell_bracket() {
        let b = bracket(Direction::Sell, 1.08000, 0.0001, 10.0, 20.0);
        assert!(close(b.stop_loss, 1.08100));
        assert!(close(b.take_profit, 1.07800));
    }

    #[test]
    fn jpy_bracket_uses_wider_pip() {
        let b = bracket(Direction::Buy, 150.00, pip_size("USDJPY"), 10.0, 20.0);
        assert!(close(b.stop_loss, 149.90));
        assert!(close(b.take_profit, 150.20));
    }
}
