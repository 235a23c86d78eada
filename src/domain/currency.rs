pub const DEFAULT_SYMBOL: &str = "$";

pub fn symbol_for(code: Option<&str>) -> &'static str {
  match code.map(str::trim).map(str::to_uppercase).as_deref() {
    Some("USD") | Some("CAD") | Some("AUD") => "$",
    Some("EUR") => "\u{20ac}",
    Some("GBP") => "\u{a3}",
    Some("JPY") | Some("CNY") => "\u{a5}",
    Some("KRW") => "\u{20a9}",
    Some("INR") => "\u{20b9}",
    Some("CHF") => "CHF ",
    _ => DEFAULT_SYMBOL,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_codes_map_to_symbols() {
    assert_eq!(symbol_for(Some("EUR")), "\u{20ac}");
    assert_eq!(symbol_for(Some("jpy")), "\u{a5}");
    assert_eq!(symbol_for(Some(" USD ")), "$");
  }

  #[test]
  fn unknown_or_missing_code_falls_back_to_default() {
    assert_eq!(symbol_for(Some("XYZ")), DEFAULT_SYMBOL);
    assert_eq!(symbol_for(None), DEFAULT_SYMBOL);
    assert_eq!(symbol_for(Some("")), DEFAULT_SYMBOL);
  }
}
