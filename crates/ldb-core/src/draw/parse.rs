//! Parsing of the multi-line draw request.
//!
//! ```text
//! /luckydraw            <- header, ignored
//! 1 x Gold              <- <quantity> <separator> <prize name>
//! 2 x Silver
//! ```

/// One prize line of a draw request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrizeSpec {
    pub name: String,
    pub quantity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrizeParseError {
    #[error("invalid input format: put at least one prize line (e.g. `1 x Gold`) below the command")]
    MissingPrizes,

    #[error("invalid prize entry format on line {line}: expected `<quantity> x <prize>`")]
    MissingSeparator { line: usize },

    #[error("invalid quantity format on line {line}: `{value}` is not a positive number")]
    InvalidQuantity { line: usize, value: String },

    #[error("missing prize name on line {line}")]
    MissingName { line: usize },
}

const SEPARATORS: [char; 3] = ['x', 'X', '×'];

/// Parse a draw request. The first line is the command header and is discarded;
/// blank lines are skipped.
pub fn parse_prize_lines(raw: &str) -> Result<Vec<PrizeSpec>, PrizeParseError> {
    let mut prizes = Vec::new();

    for (idx, line) in raw.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        prizes.push(parse_prize_line(line, line_no)?);
    }

    if prizes.is_empty() {
        return Err(PrizeParseError::MissingPrizes);
    }
    Ok(prizes)
}

fn parse_prize_line(line: &str, line_no: usize) -> Result<PrizeSpec, PrizeParseError> {
    let Some((qty, name)) = line.split_once(&SEPARATORS[..]) else {
        return Err(PrizeParseError::MissingSeparator { line: line_no });
    };

    let qty = qty.trim();
    let quantity = match qty.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            return Err(PrizeParseError::InvalidQuantity {
                line: line_no,
                value: qty.to_string(),
            })
        }
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(PrizeParseError::MissingName { line: line_no });
    }

    Ok(PrizeSpec {
        name: name.to_string(),
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, quantity: usize) -> PrizeSpec {
        PrizeSpec {
            name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn parses_prize_lines_after_header() {
        let prizes = parse_prize_lines("/luckydraw Big event\n1 x Gold\n  2x  Silver medal  \n").unwrap();
        assert_eq!(prizes, vec![spec("Gold", 1), spec("Silver medal", 2)]);
    }

    #[test]
    fn splits_on_first_separator_only() {
        let prizes = parse_prize_lines("/luckydraw\n3 X xbox controller").unwrap();
        assert_eq!(prizes, vec![spec("xbox controller", 3)]);
    }

    #[test]
    fn accepts_multiplication_sign() {
        let prizes = parse_prize_lines("/luckydraw\n5 × Sticker").unwrap();
        assert_eq!(prizes, vec![spec("Sticker", 5)]);
    }

    #[test]
    fn skips_blank_lines() {
        let prizes = parse_prize_lines("/luckydraw\n\n1 x Gold\n   \n").unwrap();
        assert_eq!(prizes, vec![spec("Gold", 1)]);
    }

    #[test]
    fn header_only_is_rejected() {
        assert_eq!(
            parse_prize_lines("/luckydraw"),
            Err(PrizeParseError::MissingPrizes)
        );
        assert_eq!(
            parse_prize_lines("/luckydraw\n \n"),
            Err(PrizeParseError::MissingPrizes)
        );
    }

    #[test]
    fn non_numeric_quantity_is_rejected() {
        assert_eq!(
            parse_prize_lines("/luckydraw\n1 x Gold\nsome x Silver"),
            Err(PrizeParseError::InvalidQuantity {
                line: 3,
                value: "some".to_string()
            })
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(matches!(
            parse_prize_lines("/luckydraw\n0 x Gold"),
            Err(PrizeParseError::InvalidQuantity { line: 2, .. })
        ));
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert_eq!(
            parse_prize_lines("/luckydraw\n2 Gold"),
            Err(PrizeParseError::MissingSeparator { line: 2 })
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        assert_eq!(
            parse_prize_lines("/luckydraw\n2 x   "),
            Err(PrizeParseError::MissingName { line: 2 })
        );
    }
}
