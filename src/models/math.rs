use serde::Deserialize;

/// Query string of `GET /api/math/lcm`, e.g. `numbers=12,15,20`.
#[derive(Debug, Default, Deserialize)]
pub struct LcmQuery {
    pub numbers: Option<String>,
}

/// Query string of `GET /api/math/increment`, e.g. `number=-10`.
#[derive(Debug, Default, Deserialize)]
pub struct IncrementQuery {
    pub number: Option<String>,
}

impl LcmQuery {
    /// Accepts comma separated unsigned integers with optional whitespace after
    /// each comma (`^\d+(,\s*\d+)*$`).
    pub fn parse_numbers(&self) -> Result<Vec<u64>, String> {
        const INVALID: &str = "Numbers must be comma-separated positive integers";

        let raw = self
            .numbers
            .as_deref()
            .ok_or_else(|| "Query parameter 'numbers' is required".to_string())?;

        raw.split(',')
            .enumerate()
            .map(|(position, part)| {
                // Leading whitespace is only allowed after a comma.
                let digits = if position == 0 { part } else { part.trim_start() };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(INVALID.to_string());
                }
                digits
                    .parse::<u64>()
                    .map_err(|_| "Number is too large".to_string())
            })
            .collect()
    }
}

impl IncrementQuery {
    /// Accepts an optionally negative integer (`^-?\d+$`).
    pub fn parse_number(&self) -> Result<i64, String> {
        let raw = self
            .number
            .as_deref()
            .ok_or_else(|| "Query parameter 'number' is required".to_string())?;

        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err("Number must be a valid integer".to_string());
        }

        raw.parse::<i64>()
            .map_err(|_| "Number is out of range".to_string())
    }
}
