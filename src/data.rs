//! Sample stream reader.
//!
//! The stream starts with the number of samples, used as a capacity hint,
//! followed by whitespace separated `longitude latitude value` triples.
//! Reading stops at end of input or at the first triple which does not parse.

use crate::errors::{KrigridError, Result};
use krigrid_kriging::SamplePoint;
use log::{debug, warn};
use std::io::Read;

/// Upper bound of the preallocated sample capacity
const MAX_CAPACITY_HINT: usize = 1 << 20;

/// Read samples from the given stream
pub fn read_samples<R: Read>(mut reader: R) -> Result<Vec<SamplePoint<f64>>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    parse_samples(&content)
}

/// Parse samples from the given text
pub fn parse_samples(content: &str) -> Result<Vec<SamplePoint<f64>>> {
    let mut tokens = content.split_whitespace();
    let expected = match tokens.next() {
        Some(token) => token.parse::<usize>().map_err(|_| {
            KrigridError::FormatError(format!("bad sample count '{token}'"))
        })?,
        None => {
            return Err(KrigridError::FormatError(
                "missing sample count".to_string(),
            ))
        }
    };

    let mut samples = Vec::with_capacity(expected.min(MAX_CAPACITY_HINT));
    while let Some(sample) = next_sample(&mut tokens) {
        samples.push(sample);
    }
    if samples.len() != expected {
        warn!(
            "Sample count header says {} but {} samples were read",
            expected,
            samples.len()
        );
    }
    debug!("Read {} samples", samples.len());
    Ok(samples)
}

fn next_sample<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<SamplePoint<f64>> {
    let mut triple = [0.; 3];
    for v in triple.iter_mut() {
        *v = tokens.next()?.parse().ok()?;
    }
    Some(SamplePoint::new(triple[0], triple[1], triple[2]))
}
