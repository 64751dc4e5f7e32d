use std::env;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::io::prelude::*;

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::char,
    multi::separated_list1,
    sequence::separated_pair,
    IResult,
};
use tracing::{event, span, Level};
use tracing_subscriber::{filter::ParseError, prelude::*, EnvFilter};

const SEGMENTS: &str = "abcdefg";

/// The set of lit segments of one displayed digit, one bit per
/// segment ('a' is bit 0).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
struct SignalPattern(u8);

impl SignalPattern {
    fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Cardinality of `self - other`.
    fn difference_len(&self, other: &SignalPattern) -> usize {
        (self.0 & !other.0).count_ones() as usize
    }
}

impl TryFrom<&str> for SignalPattern {
    type Error = String;
    fn try_from(s: &str) -> Result<SignalPattern, String> {
        let mut bits: u8 = 0;
        for ch in s.chars() {
            match SEGMENTS.find(ch) {
                Some(pos) => {
                    let bit = 1 << pos;
                    if bits & bit != 0 {
                        return Err(format!("segment '{}' appears twice in '{}'", ch, s));
                    }
                    bits |= bit;
                }
                None => {
                    return Err(format!("'{}' is not a segment (in '{}')", ch, s));
                }
            }
        }
        if bits == 0 {
            Err("empty signal pattern".to_string())
        } else {
            Ok(SignalPattern(bits))
        }
    }
}

impl Display for SignalPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (pos, ch) in SEGMENTS.chars().enumerate() {
            if self.0 & (1 << pos) != 0 {
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
fn pattern(s: &str) -> SignalPattern {
    SignalPattern::try_from(s).expect("valid test pattern")
}

#[test]
fn test_signal_pattern() {
    assert_eq!(pattern("ab"), pattern("ba"));
    assert_eq!(pattern("cdfbe").len(), 5);
    assert_eq!(pattern("gfedcba").to_string(), "abcdefg");
    assert_eq!(pattern("cdfbe").to_string(), "bcdef");
    assert!(SignalPattern::try_from("abca").is_err());
    assert!(SignalPattern::try_from("abh").is_err());
    assert!(SignalPattern::try_from("").is_err());
}

#[test]
fn test_difference_len() {
    assert_eq!(pattern("abdfg").difference_len(&pattern("cf")), 4);
    assert_eq!(pattern("cf").difference_len(&pattern("abdfg")), 1);
    assert_eq!(pattern("abc").difference_len(&pattern("abc")), 0);
    assert_eq!(pattern("abc").difference_len(&pattern("defg")), 3);
}

#[derive(Debug, Eq, PartialEq)]
struct Record {
    samples: Vec<SignalPattern>,
    output: Vec<SignalPattern>,
    /// The output patterns as written in the input.
    raw_output: Vec<String>,
}

fn parse_pattern_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(' '), take_while1(|ch: char| ch.is_ascii_alphabetic()))(input)
}

fn parse_record(input: &str) -> IResult<&str, (Vec<&str>, Vec<&str>)> {
    separated_pair(parse_pattern_list, tag(" | "), parse_pattern_list)(input)
}

fn convert_patterns(
    words: &[&str],
    expected: usize,
    what: &str,
) -> Result<Vec<SignalPattern>, String> {
    if words.len() != expected {
        return Err(format!(
            "expected {} {}, got {}: {:?}",
            expected,
            what,
            words.len(),
            words
        ));
    }
    words.iter().map(|w| SignalPattern::try_from(*w)).collect()
}

impl TryFrom<&str> for Record {
    type Error = String;
    fn try_from(s: &str) -> Result<Record, String> {
        match parse_record(s) {
            Ok((unparsed, (samples, output))) => {
                if !unparsed.is_empty() {
                    return Err(format!("unexpected trailing junk: '{}'", unparsed));
                }
                Ok(Record {
                    samples: convert_patterns(&samples, 10, "samples")?,
                    output: convert_patterns(&output, 4, "outputs")?,
                    raw_output: output.iter().map(|w| w.to_string()).collect(),
                })
            }
            Err(e) => Err(format!("expected two fields separated by '|' in '{}': {}", s, e)),
        }
    }
}

#[cfg(test)]
const EXAMPLE: &str =
    "acedgfb cdfbe gcdfa fbcad dab cefabd cdfgeb eafb cagedb ab | cdfeb fcadb cdfeb cdbaf";

#[test]
fn test_parse_record() {
    let record = Record::try_from(EXAMPLE).expect("example should parse");
    assert_eq!(record.samples.len(), 10);
    assert_eq!(record.samples[4], pattern("abd"));
    assert_eq!(
        record.output,
        vec![pattern("bcdef"), pattern("abcdf"), pattern("bcdef"), pattern("abcdf")]
    );
    assert_eq!(record.raw_output, vec!["cdfeb", "fcadb", "cdfeb", "cdbaf"]);

    // Nine samples.
    assert!(Record::try_from(
        "acedgfb cdfbe gcdfa fbcad dab cefabd cdfgeb eafb cagedb | ab cd ef ga"
    )
    .is_err());
    // Five outputs.
    assert!(Record::try_from(
        "acedgfb cdfbe gcdfa fbcad dab cefabd cdfgeb eafb cagedb ab | cdfeb fcadb cdfeb cdbaf ab"
    )
    .is_err());
    assert!(
        Record::try_from("acedgfb cdfbe gcdfa fbcad dab cefabd cdfgeb eafb cagedb ab").is_err()
    );
    assert!(Record::try_from(
        "acedgfb cdfbe gcdfa fbcad dab cefabd cdfgeb eafb cagedb ab | cdfeb fcadb cdfeb cdbaf | ab"
    )
    .is_err());
    assert!(Record::try_from(
        "acedgfb cdfbe gcdfa fbcad dab cefabd cdfgeb eafb cagedb ab | cdfeb fcadb cdfeb cdbax"
    )
    .is_err());
}

#[derive(Debug, Eq, PartialEq)]
enum DecodeError {
    /// A length with a unique digit (2, 3, 4 or 7 segments) did not
    /// appear exactly once.
    Seed { length: usize, count: usize },
    /// No rule matches this pattern.
    Unclassified {
        pattern: SignalPattern,
        signature: (usize, usize, usize),
    },
    /// Two patterns were identified as the same digit.
    Duplicate {
        digit: u8,
        first: SignalPattern,
        second: SignalPattern,
    },
    Unresolved { digit: u8 },
    /// An output pattern matches none of the resolved digits.
    Lookup(SignalPattern),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Seed { length, count } => write!(
                f,
                "expected exactly one {}-segment sample, found {}",
                length, count
            ),
            DecodeError::Unclassified { pattern, signature } => write!(
                f,
                "cannot classify {}-segment pattern {} with signature {:?}",
                pattern.len(),
                pattern,
                signature
            ),
            DecodeError::Duplicate {
                digit,
                first,
                second,
            } => write!(
                f,
                "both {} and {} were identified as digit {}",
                first, second, digit
            ),
            DecodeError::Unresolved { digit } => {
                write!(f, "no sample was identified as digit {}", digit)
            }
            DecodeError::Lookup(p) => write!(f, "output pattern {} matches no digit", p),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Segment counts that only one digit has.
const SEED_DIGITS: [(usize, u8); 4] = [(2, 1), (3, 7), (4, 4), (7, 8)];

/// Rules for the ambiguous digits, keyed on segment count and the
/// sizes of the set differences against the patterns for 1, 4 and 7.
///
/// | digit | segments | − 1 | − 4 | − 7 |
/// | ----- | -------- | --- | --- | --- |
/// | 2     | 5        | 4   | 3   | 3   |
/// | 3     | 5        | 3   | 2   | 2   |
/// | 5     | 5        | 4   | 2   | 3   |
/// | 0     | 6        | 4   | 3   | 3   |
/// | 6     | 6        | 5   | 3   | 4   |
/// | 9     | 6        | 4   | 2   | 3   |
const CLASSIFICATION: [(usize, (usize, usize, usize), u8); 6] = [
    (5, (4, 2, 3), 5),
    (5, (3, 2, 2), 3),
    (5, (4, 3, 3), 2),
    (6, (4, 2, 3), 9),
    (6, (5, 3, 4), 6),
    (6, (4, 3, 3), 0),
];

fn classify(length: usize, signature: (usize, usize, usize)) -> Option<u8> {
    CLASSIFICATION
        .iter()
        .find(|(len, sig, _)| *len == length && *sig == signature)
        .map(|(_, _, digit)| *digit)
}

#[test]
fn test_classify() {
    assert_eq!(classify(5, (4, 2, 3)), Some(5));
    assert_eq!(classify(5, (3, 2, 2)), Some(3));
    assert_eq!(classify(5, (4, 3, 3)), Some(2));
    assert_eq!(classify(6, (4, 2, 3)), Some(9));
    assert_eq!(classify(6, (5, 3, 4)), Some(6));
    assert_eq!(classify(6, (4, 3, 3)), Some(0));
    assert_eq!(classify(6, (3, 2, 2)), None);
    assert_eq!(classify(5, (5, 3, 4)), None);
    assert_eq!(classify(4, (4, 2, 3)), None);
}

/// Which pattern shows which digit, for one record's wiring.
#[derive(Debug, Eq, PartialEq)]
struct DigitMap {
    /// Indexed by digit.
    patterns: [SignalPattern; 10],
}

impl DigitMap {
    #[cfg(test)]
    fn pattern_for(&self, digit: u8) -> SignalPattern {
        self.patterns[digit as usize]
    }

    fn lookup(&self, p: &SignalPattern) -> Result<u8, DecodeError> {
        self.patterns
            .iter()
            .position(|candidate| candidate == p)
            .map(|digit| digit as u8)
            .ok_or(DecodeError::Lookup(*p))
    }
}

fn assign(
    found: &mut [Option<SignalPattern>; 10],
    digit: u8,
    p: SignalPattern,
) -> Result<(), DecodeError> {
    match found[digit as usize] {
        Some(first) => Err(DecodeError::Duplicate {
            digit,
            first,
            second: p,
        }),
        None => {
            found[digit as usize] = Some(p);
            Ok(())
        }
    }
}

fn seed(samples: &[SignalPattern], length: usize) -> Result<SignalPattern, DecodeError> {
    let mut candidates = samples.iter().filter(|p| p.len() == length);
    match (candidates.next(), candidates.count()) {
        (Some(p), 0) => Ok(*p),
        (first, rest) => Err(DecodeError::Seed {
            length,
            count: rest + usize::from(first.is_some()),
        }),
    }
}

/// Works out which sample shows which digit.  The digits with a unique
/// segment count are identified first; each remaining sample is then
/// classified by looking up its segment count and its set-difference
/// sizes against 1, 4 and 7 in `CLASSIFICATION`.
fn resolve_digit_map(samples: &[SignalPattern]) -> Result<DigitMap, DecodeError> {
    let mut found: [Option<SignalPattern>; 10] = [None; 10];
    for (length, digit) in SEED_DIGITS {
        assign(&mut found, digit, seed(samples, length)?)?;
    }
    let one = found[1].ok_or(DecodeError::Unresolved { digit: 1 })?;
    let four = found[4].ok_or(DecodeError::Unresolved { digit: 4 })?;
    let seven = found[7].ok_or(DecodeError::Unresolved { digit: 7 })?;

    for p in samples {
        if SEED_DIGITS.iter().any(|(length, _)| *length == p.len()) {
            continue;
        }
        let signature = (
            p.difference_len(&one),
            p.difference_len(&four),
            p.difference_len(&seven),
        );
        let digit = match classify(p.len(), signature) {
            Some(digit) => digit,
            None => {
                return Err(DecodeError::Unclassified {
                    pattern: *p,
                    signature,
                });
            }
        };
        event!(
            Level::TRACE,
            "{} has signature {:?}: it's a {}",
            p,
            signature,
            digit
        );
        assign(&mut found, digit, *p)?;
    }

    let mut patterns = [SignalPattern(0); 10];
    for (digit, slot) in found.iter().enumerate() {
        match slot {
            Some(p) => patterns[digit] = *p,
            None => {
                return Err(DecodeError::Unresolved { digit: digit as u8 });
            }
        }
    }
    Ok(DigitMap { patterns })
}

#[test]
fn test_resolve_digit_map_example() {
    let record = Record::try_from(EXAMPLE).unwrap();
    let map = resolve_digit_map(&record.samples).expect("example should resolve");
    let expected = [
        (0, "cagedb"),
        (1, "ab"),
        (2, "gcdfa"),
        (3, "fbcad"),
        (4, "eafb"),
        (5, "cdfbe"),
        (6, "cdfgeb"),
        (7, "dab"),
        (8, "acedgfb"),
        (9, "cefabd"),
    ];
    for (digit, segments) in expected {
        assert_eq!(map.pattern_for(digit), pattern(segments), "digit {}", digit);
    }
    assert_eq!(map.lookup(&pattern("ba")), Ok(1));
}

#[cfg(test)]
fn patterns(words: &[&str]) -> Vec<SignalPattern> {
    words.iter().map(|w| pattern(w)).collect()
}

#[test]
fn test_resolve_digit_map_missing_seed() {
    // "ab" (the 1) replaced by a second 3-segment pattern.
    let samples = patterns(&[
        "acedgfb", "cdfbe", "gcdfa", "fbcad", "dab", "cefabd", "cdfgeb", "eafb", "cagedb", "abc",
    ]);
    assert_eq!(
        resolve_digit_map(&samples),
        Err(DecodeError::Seed {
            length: 2,
            count: 0
        })
    );
}

#[test]
fn test_resolve_digit_map_unclassified() {
    // "cdfbe" (the 5) replaced by a 5-segment pattern that is no digit.
    let samples = patterns(&[
        "acedgfb", "acefg", "gcdfa", "fbcad", "dab", "cefabd", "cdfgeb", "eafb", "cagedb", "ab",
    ]);
    match resolve_digit_map(&samples) {
        Err(DecodeError::Unclassified { pattern: p, signature }) => {
            assert_eq!(p, pattern("acefg"));
            assert_eq!(signature, (4, 2, 4));
        }
        other => panic!("expected a classification failure, got {:?}", other),
    }
}

#[test]
fn test_resolve_digit_map_duplicate() {
    // The 2 ("gcdfa") replaced by a second copy of the 3.
    let samples = patterns(&[
        "acedgfb", "cdfbe", "fbcad", "fbcad", "dab", "cefabd", "cdfgeb", "eafb", "cagedb", "ab",
    ]);
    assert_eq!(
        resolve_digit_map(&samples),
        Err(DecodeError::Duplicate {
            digit: 3,
            first: pattern("abcdf"),
            second: pattern("abcdf"),
        })
    );
}

fn decode_digits(record: &Record) -> Result<Vec<u8>, DecodeError> {
    let map = resolve_digit_map(&record.samples)?;
    record.output.iter().map(|p| map.lookup(p)).collect()
}

fn decode_record(record: &Record) -> Result<u32, DecodeError> {
    Ok(decode_digits(record)?
        .iter()
        .fold(0, |number, digit| number * 10 + u32::from(*digit)))
}

#[test]
fn test_decode_record_example() {
    let record = Record::try_from(EXAMPLE).unwrap();
    assert_eq!(decode_digits(&record), Ok(vec![5, 3, 5, 3]));
    assert_eq!(decode_record(&record), Ok(5353));
}

#[test]
fn test_decode_record_lookup_failure() {
    let mut record = Record::try_from(EXAMPLE).unwrap();
    // Segments "abcf" (four lit) are not one of this wiring's digits.
    record.output[2] = pattern("abcf");
    assert_eq!(
        decode_record(&record),
        Err(DecodeError::Lookup(pattern("abcf")))
    );
}

fn total_output_value(records: &[Record]) -> Result<u64, DecodeError> {
    let mut total: u64 = 0;
    for (n, record) in records.iter().enumerate() {
        let span = span!(Level::DEBUG, "record", line = n + 1);
        let _enter = span.enter();
        let value = decode_record(record)?;
        total += u64::from(value);
        event!(
            Level::DEBUG,
            "{} -> {} (running total {})",
            record.raw_output.join(" "),
            format!("{:04}", value),
            total,
        );
    }
    Ok(total)
}

fn count_unambiguous_outputs(records: &[Record]) -> usize {
    records
        .iter()
        .flat_map(|record| record.output.iter())
        .filter(|p| SEED_DIGITS.iter().any(|(length, _)| *length == p.len()))
        .count()
}

/// Canonical wiring: the segments of each digit, indexed by digit.
#[cfg(test)]
const CANONICAL: [&str; 10] = [
    "abcefg", "cf", "acdeg", "acdfg", "bcdf", "abdfg", "abdefg", "acf", "abcdefg", "abcdfg",
];

/// Builds a record for `outputs` as it would appear if segment `i` were
/// wired to `SEGMENTS[wiring[i]]`.
#[cfg(test)]
fn scrambled_record(wiring: &[usize], outputs: [usize; 4]) -> Record {
    let scramble = |segments: &str| -> SignalPattern {
        let segments: String = segments
            .chars()
            .map(|ch| {
                let pos = SEGMENTS.find(ch).unwrap();
                SEGMENTS.chars().nth(wiring[pos]).unwrap()
            })
            .collect();
        pattern(&segments)
    };
    // Present the samples in a wiring-dependent order too.
    let mut samples: Vec<SignalPattern> = CANONICAL.iter().map(|s| scramble(*s)).collect();
    let shift = (wiring[0] + wiring[1]) % samples.len();
    samples.rotate_left(shift);
    let output: Vec<SignalPattern> = outputs.iter().map(|d| scramble(CANONICAL[*d])).collect();
    let raw_output = output.iter().map(SignalPattern::to_string).collect();
    Record {
        samples,
        output,
        raw_output,
    }
}

#[cfg(test)]
fn permutations(items: Vec<usize>) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.clone();
        let first = rest.remove(i);
        for mut tail in permutations(rest) {
            tail.insert(0, first);
            result.push(tail);
        }
    }
    result
}

#[test]
fn test_every_wiring_decodes() {
    let wirings = permutations((0..7).collect());
    assert_eq!(wirings.len(), 5040);
    for (n, wiring) in wirings.iter().enumerate() {
        let outputs = [n % 10, (n / 10) % 10, (n / 100) % 10, (n * 7 + 3) % 10];
        let record = scrambled_record(wiring, outputs);
        let expected: Vec<u8> = outputs.iter().map(|d| *d as u8).collect();
        assert_eq!(decode_digits(&record), Ok(expected), "wiring {:?}", wiring);
    }
}

#[test]
fn test_leading_zeros() {
    let record = scrambled_record(&[6, 5, 4, 3, 2, 1, 0], [0, 0, 0, 0]);
    assert_eq!(decode_digits(&record), Ok(vec![0, 0, 0, 0]));
    assert_eq!(decode_record(&record), Ok(0));
    let record = scrambled_record(&[1, 0, 2, 3, 4, 5, 6], [0, 0, 4, 2]);
    assert_eq!(decode_record(&record), Ok(42));
}

#[test]
fn test_totals() {
    let records = vec![
        Record::try_from(EXAMPLE).unwrap(),
        scrambled_record(&[0, 1, 2, 3, 4, 5, 6], [1, 4, 7, 8]),
        scrambled_record(&[3, 0, 6, 1, 5, 2, 4], [9, 0, 6, 2]),
    ];
    assert_eq!(total_output_value(&records), Ok(5353 + 1478 + 9062));
    assert_eq!(count_unambiguous_outputs(&records), 4);
    assert_eq!(total_output_value(&[]), Ok(0));
}

fn read_input() -> String {
    match env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                panic!("failed to read {}: {}", path, e);
            }
        },
        None => {
            let mut input = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut input) {
                panic!("failed to read input: {}", e);
            }
            input
        }
    }
}

fn log_filter() -> Result<EnvFilter, ParseError> {
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))
}

#[test]
fn test_log_filter() {
    assert!(log_filter().is_ok());
    assert!(EnvFilter::try_new("info").is_ok());
    assert!(EnvFilter::try_new("day08=debug").is_ok());
}

fn main() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(io::stderr);
    let filter_layer = match log_filter() {
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let input = read_input();
    let records: Vec<Record> = match input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Record::try_from(line.trim_end()))
        .collect()
    {
        Ok(v) => v,
        Err(e) => {
            panic!("failed to parse puzzle input: {}", e);
        }
    };
    event!(Level::INFO, "read {} records", records.len());

    println!("Part1 {}", count_unambiguous_outputs(&records));
    match total_output_value(&records) {
        Ok(total) => {
            println!("Part2 {}", total);
        }
        Err(e) => {
            panic!("failed to decode output: {}", e);
        }
    }
}
