use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;

use nom::{
    character::complete::{char, digit1},
    combinator::map_res,
    multi::separated_list1,
    IResult,
};
use tracing::{event, span, Level};
use tracing_subscriber::{filter::ParseError, prelude::*, EnvFilter};

type CostModel = fn(usize, usize) -> u128;

#[derive(Debug, Eq, PartialEq)]
struct Readings(Vec<usize>);

fn parse_readings(input: &str) -> IResult<&str, Vec<usize>> {
    separated_list1(char(','), map_res(digit1, |s: &str| s.parse::<usize>()))(input)
}

impl TryFrom<&str> for Readings {
    type Error = String;
    fn try_from(s: &str) -> Result<Readings, String> {
        let s = s.trim();
        match parse_readings(s) {
            Ok((unparsed, values)) => {
                if unparsed.is_empty() {
                    Ok(Readings(values))
                } else {
                    Err(format!("unexpected trailing junk: '{}'", unparsed))
                }
            }
            Err(e) => Err(format!("failed to parse integer list '{}': {}", s, e)),
        }
    }
}

#[test]
fn test_parse_readings() {
    assert_eq!(
        Readings::try_from("16,1,2,0,4,2,7,1,2,14\n"),
        Ok(Readings(vec![16, 1, 2, 0, 4, 2, 7, 1, 2, 14]))
    );
    assert_eq!(Readings::try_from("3"), Ok(Readings(vec![3])));
    assert!(Readings::try_from("").is_err());
    assert!(Readings::try_from("1,2,x").is_err());
    assert!(Readings::try_from("1,-2").is_err());
    assert!(Readings::try_from("1,,2").is_err());
}

fn distance(from: usize, to: usize) -> usize {
    if from > to {
        from - to
    } else {
        to - from
    }
}

/// Exact for every `n`, since `n * (n + 1)` is below 2^128.
fn triangular(n: u64) -> u128 {
    let n = u128::from(n);
    n * (n + 1) / 2
}

#[test]
fn test_triangular() {
    assert_eq!(triangular(0), 0);
    assert_eq!(triangular(1), 1);
    assert_eq!(triangular(4), 1 + 2 + 3 + 4);
    assert_eq!(triangular(11), (0..=11).sum::<u128>());
    assert_eq!(triangular(2_000_000), 2_000_001_000_000);
    assert_eq!(triangular(4_294_967_296), 9_223_372_039_002_259_456);
    assert_eq!(
        triangular(u64::MAX),
        u128::from(u64::MAX) * (u128::from(u64::MAX) + 1) / 2
    );
}

fn cost_of_move_linear(from: usize, to: usize) -> u128 {
    distance(from, to) as u128
}

fn cost_of_move_triangular(from: usize, to: usize) -> u128 {
    triangular(distance(from, to) as u64)
}

#[test]
fn test_cost_of_move() {
    assert_eq!(cost_of_move_linear(16, 2), 14);
    assert_eq!(cost_of_move_linear(2, 16), 14);
    assert_eq!(cost_of_move_linear(5, 5), 0);
    assert_eq!(cost_of_move_triangular(16, 5), 66);
    assert_eq!(cost_of_move_triangular(1, 5), 10);
    assert_eq!(cost_of_move_triangular(5, 1), 10);
    assert_eq!(cost_of_move_triangular(2, 2), 0);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_cost_of_move_far_apart() {
    assert_eq!(
        cost_of_move_triangular(0, 5_000_000_000),
        12_500_000_002_500_000_000
    );
    assert_eq!(
        cost_of_dest(0, &[5_000_000_000, 5_000_000_000], cost_of_move_triangular),
        25_000_000_005_000_000_000
    );
}

fn cost_of_dest(dest: usize, readings: &[usize], cost_of_move: CostModel) -> u128 {
    readings.iter().map(|pos| cost_of_move(*pos, dest)).sum()
}

/// Scans every candidate position from 0 to the largest reading and
/// returns the cheapest `(position, cost)`.  When several positions
/// share the minimum, the lowest one wins.  Returns `None` when there
/// are no readings.
fn min_dest(readings: &[usize], cost_of_move: CostModel) -> Option<(usize, u128)> {
    let max_pos = *readings.iter().max()?;
    let mut best: Option<(usize, u128)> = None;
    for pos in 0..=max_pos {
        let cost = cost_of_dest(pos, readings, cost_of_move);
        event!(Level::TRACE, "position {} costs {}", pos, cost);
        best = match best {
            Some((_, best_cost)) if best_cost <= cost => best,
            _ => Some((pos, cost)),
        };
    }
    best
}

fn minimal_linear_cost(readings: &[usize]) -> Option<(usize, u128)> {
    let span = span!(Level::DEBUG, "linear", count = readings.len());
    let _enter = span.enter();
    min_dest(readings, cost_of_move_linear)
}

fn minimal_triangular_cost(readings: &[usize]) -> Option<(usize, u128)> {
    let span = span!(Level::DEBUG, "triangular", count = readings.len());
    let _enter = span.enter();
    min_dest(readings, cost_of_move_triangular)
}

#[cfg(test)]
fn example() -> Vec<usize> {
    vec![16, 1, 2, 0, 4, 2, 7, 1, 2, 14]
}

#[test]
fn test_example() {
    assert_eq!(cost_of_dest(2, &example(), cost_of_move_linear), 37);
    assert_eq!(cost_of_dest(1, &example(), cost_of_move_linear), 41);
    assert_eq!(cost_of_dest(3, &example(), cost_of_move_linear), 39);
    assert_eq!(cost_of_dest(10, &example(), cost_of_move_linear), 71);
    assert_eq!(minimal_linear_cost(&example()), Some((2, 37)));

    assert_eq!(cost_of_dest(2, &example(), cost_of_move_triangular), 206);
    assert_eq!(minimal_triangular_cost(&example()), Some((5, 168)));
}

#[test]
fn test_no_readings() {
    assert_eq!(minimal_linear_cost(&[]), None);
    assert_eq!(minimal_triangular_cost(&[]), None);
}

#[test]
fn test_single_reading() {
    assert_eq!(minimal_linear_cost(&[0]), Some((0, 0)));
    assert_eq!(minimal_linear_cost(&[9]), Some((9, 0)));
    assert_eq!(minimal_triangular_cost(&[9]), Some((9, 0)));
}

#[test]
fn test_zero_only_when_all_equal() {
    assert_eq!(minimal_linear_cost(&[4, 4, 4, 4]), Some((4, 0)));
    for readings in [vec![0, 1], vec![3, 3, 4], vec![7, 0, 7, 7]] {
        let (_, cost) = minimal_linear_cost(&readings).unwrap();
        assert!(cost > 0, "{:?} should have non-zero cost", readings);
    }
}

#[test]
fn test_ties_pick_lowest_position() {
    // Every position between the two readings costs the same.
    assert_eq!(minimal_linear_cost(&[2, 6]), Some((2, 4)));
}

#[test]
fn test_triangular_dominates_linear() {
    for readings in [
        example(),
        vec![0, 100],
        vec![1, 1, 1, 50],
        vec![3, 3, 4],
        vec![0, 0, 0, 0, 1000],
    ] {
        let (_, linear) = minimal_linear_cost(&readings).unwrap();
        let (_, triangular) = minimal_triangular_cost(&readings).unwrap();
        assert!(
            triangular >= linear,
            "{:?}: triangular {} < linear {}",
            readings,
            triangular,
            linear
        );
    }
}

#[test]
fn test_linear_cost_ignores_order() {
    let mut readings = example();
    let expected = minimal_linear_cost(&readings).map(|(_, cost)| cost);
    readings.reverse();
    assert_eq!(minimal_linear_cost(&readings).map(|(_, cost)| cost), expected);
    readings.sort_unstable();
    assert_eq!(minimal_linear_cost(&readings).map(|(_, cost)| cost), expected);
    readings.rotate_left(3);
    assert_eq!(minimal_linear_cost(&readings).map(|(_, cost)| cost), expected);
}

#[test]
fn test_linear_minimum_is_at_median() {
    let mut readings = vec![9, 2, 30, 14, 5, 5, 21];
    let (_, cost) = minimal_linear_cost(&readings).unwrap();
    readings.sort_unstable();
    let median = readings[readings.len() / 2];
    assert_eq!(cost, cost_of_dest(median, &readings, cost_of_move_linear));
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
    assert!(EnvFilter::try_new("day07=trace").is_ok());
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
    let first_line = match input.lines().next() {
        Some(line) => line,
        None => {
            panic!("empty input");
        }
    };
    let readings = match Readings::try_from(first_line) {
        Ok(r) => r,
        Err(e) => {
            panic!("{}", e);
        }
    };

    match minimal_linear_cost(&readings.0) {
        Some((best_pos, cost)) => {
            event!(Level::INFO, "part 1: dest {} costs {}", best_pos, cost);
            println!("Part1 {}", cost);
        }
        None => {
            println!("No readings.  Nothing to do.");
            return;
        }
    }
    if let Some((best_pos, cost)) = minimal_triangular_cost(&readings.0) {
        event!(Level::INFO, "part 2: dest {} costs {}", best_pos, cost);
        println!("Part2 {}", cost);
    }
}
