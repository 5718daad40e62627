//! Rendering of column default expressions.

use crate::model::DefaultKind;

/// Zero-argument calls that may appear as a literal default without quoting.
const GENERATOR_CALLS: &[&str] = &[
    "GETDATE()",
    "GETUTCDATE()",
    "SYSDATETIME()",
    "SYSUTCDATETIME()",
    "SYSDATETIMEOFFSET()",
    "NEWID()",
    "NEWSEQUENTIALID()",
    "CURRENT_TIMESTAMP",
];

/// Render the expression placed inside `DEFAULT (...)`.
///
/// Returns `None` when no DEFAULT clause should be emitted.
pub fn encode_default(text: Option<&str>, kind: DefaultKind) -> Option<String> {
    let text = text.filter(|t| !t.trim().is_empty())?;

    match kind {
        DefaultKind::None => None,
        DefaultKind::RawExpression => Some(text.to_string()),
        DefaultKind::Literal => Some(encode_literal(text)),
    }
}

/// Keep numbers, parenthesized expressions and known generator calls as-is;
/// quote everything else as a string literal.
pub fn encode_literal(value: &str) -> String {
    if is_number(value) || is_parenthesized(value) || is_generator_call(value) {
        return value.to_string();
    }
    quote(value)
}

/// Wrap in single quotes, doubling embedded ones.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Reverse `quote`. Returns `None` if `literal` is not a quoted string.
pub fn decode_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

fn is_number(value: &str) -> bool {
    let value = value.trim();
    let digits = value
        .strip_prefix(['-', '+'])
        .unwrap_or(value);

    let mut seen_digit = false;
    let mut seen_point = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

fn is_parenthesized(value: &str) -> bool {
    value.starts_with('(') && value.ends_with(')')
}

fn is_generator_call(value: &str) -> bool {
    GENERATOR_CALLS
        .iter()
        .any(|call| call.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", "0")]
    #[case("-12.50", "-12.50")]
    #[case("+3", "+3")]
    #[case(".5", ".5")]
    #[case("(1+2)", "(1+2)")]
    #[case("getdate()", "getdate()")]
    #[case("NewId()", "NewId()")]
    #[case("SYSUTCDATETIME()", "SYSUTCDATETIME()")]
    #[case("active", "'active'")]
    #[case("O'Brien", "'O''Brien'")]
    #[case("1.2.3", "'1.2.3'")]
    #[case("1e5", "'1e5'")]
    #[case("-", "'-'")]
    #[case("NaN", "'NaN'")]
    #[case("GETDATE() + 1", "'GETDATE() + 1'")]
    fn test_encode_literal(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode_literal(input), expected);
    }

    #[test]
    fn test_kind_none_emits_nothing() {
        assert_eq!(encode_default(Some("5"), DefaultKind::None), None);
    }

    #[test]
    fn test_blank_text_emits_nothing() {
        assert_eq!(encode_default(None, DefaultKind::Literal), None);
        assert_eq!(encode_default(Some("   "), DefaultKind::RawExpression), None);
    }

    #[test]
    fn test_raw_expression_unchanged() {
        assert_eq!(
            encode_default(Some("dateadd(day, 1, getdate())"), DefaultKind::RawExpression),
            Some("dateadd(day, 1, getdate())".to_string())
        );
        // raw text is trusted, even when it would need quoting as a literal
        assert_eq!(
            encode_default(Some("it's"), DefaultKind::RawExpression),
            Some("it's".to_string())
        );
    }

    #[test]
    fn test_literal_round_trip() {
        for original in ["O'Brien", "''", "a'b'c", "plain", "'leading", "trailing'"] {
            let encoded = encode_default(Some(original), DefaultKind::Literal).unwrap();
            assert_eq!(decode_literal(&encoded).as_deref(), Some(original));
        }
    }

    #[test]
    fn test_decode_rejects_unquoted() {
        assert_eq!(decode_literal("42"), None);
        assert_eq!(decode_literal("'open"), None);
    }
}
