use serde_json::Value;

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 100;

/// Normalizes user input into a score: the leading integer of the trimmed
/// text (sign allowed, trailing garbage ignored), 0 when there is none,
/// clamped to `MIN_SCORE..=MAX_SCORE`.
pub fn validate_score(raw: &str) -> u8 {
    parse_leading_int(raw).map(clamp_score).unwrap_or(MIN_SCORE)
}

pub fn clamp_score(value: i64) -> u8 {
    value.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8
}

fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let run = digits.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut magnitude: i64 = 0;
    for b in run {
        seen = true;
        magnitude = magnitude
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }
    if !seen {
        return None;
    }
    Some(if negative { -magnitude } else { magnitude })
}

/// Reads `value.extensions.CustomScore` from an account document. Numbers and
/// numeric strings are accepted; anything else counts as 0.
pub fn score_from_account(account: &Value) -> u8 {
    match account.pointer("/value/extensions/CustomScore") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(clamp_score)
            .unwrap_or(MIN_SCORE),
        Some(Value::String(s)) => validate_score(s),
        _ => MIN_SCORE,
    }
}

/// The account's optimistic-concurrency token (`value.adminData.updatedOn`).
pub fn concurrency_token(account: &Value) -> Option<String> {
    match account.pointer("/value/adminData/updatedOn")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Quotes a concurrency token as an opaque entity tag.
pub fn if_match_value(token: &str) -> String {
    format!("\"{token}\"")
}

/// Text field, range slider and their derived display, kept in lockstep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreControls {
    input: String,
    slider: u8,
    edit_hidden: bool,
}

impl Default for ScoreControls {
    fn default() -> Self {
        Self::new(MIN_SCORE)
    }
}

impl ScoreControls {
    pub fn new(score: u8) -> Self {
        let score = score.min(MAX_SCORE);
        Self {
            input: score.to_string(),
            slider: score,
            edit_hidden: false,
        }
    }

    /// Programmatic update of both controls.
    pub fn set_score(&mut self, score: u8) {
        let score = score.min(MAX_SCORE);
        self.input = score.to_string();
        self.slider = score;
    }

    /// Typed text stays as entered; the slider follows the normalized value.
    pub fn on_input(&mut self, raw: &str) -> u8 {
        let score = validate_score(raw);
        self.input = raw.to_string();
        self.slider = score;
        score
    }

    pub fn on_slider(&mut self, value: i64) -> u8 {
        let score = clamp_score(value);
        self.slider = score;
        self.input = score.to_string();
        score
    }

    pub fn input_text(&self) -> &str {
        &self.input
    }

    pub fn slider(&self) -> u8 {
        self.slider
    }

    pub fn display(&self) -> String {
        format!("Score: {}/{MAX_SCORE}", self.slider)
    }

    /// Fill level of the slider track, e.g. `"42%"`.
    pub fn fill(&self) -> String {
        format!("{}%", self.slider)
    }

    #[cfg(test)]
    pub fn edit_button_hidden(&self) -> bool {
        self.edit_hidden
    }

    pub fn hide_edit_button(&mut self) {
        self.edit_hidden = true;
    }

    pub fn rearm_edit_button(&mut self) {
        self.edit_hidden = false;
    }
}
