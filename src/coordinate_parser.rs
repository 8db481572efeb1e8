//! Parses `"lat,lng"` literals, like the ones handed to `--origin` on the
//! command line, into [Coordinate]s.

use crate::geo::{Coordinate, GeoError};

use nom::{
    character::complete::{char, space0},
    combinator::{all_consuming, map},
    error::Error,
    number::complete::double,
    sequence::{delimited, separated_pair},
    Finish, IResult,
};

use std::{fmt, str::FromStr};

/// Why a coordinate literal could not be turned into a [Coordinate].
#[derive(Debug, PartialEq)]
pub enum CoordinateParseError {
    /// The text was not two numbers separated by a comma.
    Syntax(Error<String>),

    /// The numbers parsed, but are not a point on the globe.
    OutOfRange(GeoError),
}

impl fmt::Display for CoordinateParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoordinateParseError::Syntax(e) => {
                write!(f, "expected \"lat,lng\", stopped at {:?}", e.input)
            }
            CoordinateParseError::OutOfRange(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CoordinateParseError {}

fn parse_component(s: &str) -> IResult<&str, f64> {
    delimited(space0, double, space0)(s)
}

fn parse_lat_lng(s: &str) -> IResult<&str, (f64, f64)> {
    all_consuming(separated_pair(parse_component, char(','), parse_component))(s)
}

fn parse_coordinate(s: &str) -> IResult<&str, Coordinate> {
    map(parse_lat_lng, |(latitude, longitude)| Coordinate {
        latitude,
        longitude,
    })(s)
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_coordinate(s).finish() {
            Ok((_remaining, coord)) => coord.validate().map_err(CoordinateParseError::OutOfRange),
            Err(Error { input, code }) => Err(CoordinateParseError::Syntax(Error {
                input: input.to_string(),
                code,
            })),
        }
    }
}
