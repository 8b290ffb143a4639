// C-style numeric literals

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, hex_digit1, oct_digit1, one_of},
    combinator::{all_consuming, map_opt, map_res, opt},
    number::complete::double,
    sequence::{pair, preceded},
    IResult,
};

// Magnitude in strtoull(3) base 0 syntax: 0x hex, leading-zero octal, decimal
fn magnitude(input: &str) -> IResult<&str, u64> {
    alt((
        map_res(preceded(tag_no_case("0x"), hex_digit1), |s: &str| {
            u64::from_str_radix(s, 16)
        }),
        map_res(preceded(char('0'), oct_digit1), |s: &str| {
            u64::from_str_radix(s, 8)
        }),
        map_res(digit1, |s: &str| s.parse::<u64>()),
    ))(input)
}

/// A signed integer; values past `i64::MAX` are read as unsigned and
/// reinterpreted, so `0xffffffffffffffff` is `-1`.
pub fn integer(input: &str) -> IResult<&str, i64> {
    map_opt(pair(opt(one_of("+-")), magnitude), |(sign, m)| match sign {
        Some('-') if m > i64::MAX as u64 + 1 => None,
        Some('-') => Some((m as i64).wrapping_neg()),
        _ => Some(m as i64),
    })(input)
}

/// The whole of `s` as an integer.
pub fn parse_integer(s: &str) -> Option<i64> {
    all_consuming(integer)(s).ok().map(|(_, v)| v)
}

/// The whole of `s` as a floating literal.
pub fn parse_float(s: &str) -> Option<f64> {
    all_consuming(double::<&str, nom::error::Error<&str>>)(s)
        .ok()
        .map(|(_, v)| v)
}
