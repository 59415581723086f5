//! RadialArithmeticCoder - narrow an arc of the circle, one symbol at a time
//!
//! The active arc is tracked as a half-open interval of Zeckendorf ranks over
//! a window of the next [`WINDOW_DIGITS`] phi-adic digits. The full window is
//! the full circle.
//!
//! ```text
//!   0                     SPLIT                     FULL
//!   ├──────── 0xxxx… ───────┼──────── 10xxx… ─────────┤
//!        [low ······ high)                             → emit 0, extend 1
//!                              [low ······ high)       → emit 1 0, extend 2
//!                   [low ··┼·· high)  range < MIN      → clamp to larger side
//! ```
//!
//! Renormalization runs after every symbol and is shared by the encoder and
//! decoder, so both see the same digits emitted in the same order.

use phirac_core::arc::scaled_bound;
use phirac_core::zeckendorf::{self, FIB};
use phirac_core::{ArcTable, Error, PhiAdicNumber, Result, Symbol};

/// Live digits tracked in the interval window
pub const WINDOW_DIGITS: usize = 86;

/// Rank count of the full window (the whole circle)
pub const FULL: u64 = FIB[WINDOW_DIGITS + 2];

/// Rank of the first window string whose leading digit is 1
pub const SPLIT: u64 = FIB[WINDOW_DIGITS + 1];

/// Below this width a straddling interval is clamped to one side
pub const MIN_RANGE: u64 = 1 << 32;

/// Most symbols `decode` reserves room for before any is produced
const DECODE_RESERVE: usize = 1 << 16;

/// Coder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderState {
    /// No symbol processed yet
    Idle,
    /// At least one symbol processed
    Active,
    /// Output committed; no further symbols accepted
    Finalized,
}

/// Digits released by one renormalization step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emission {
    Zero,
    OneZero,
}

/// The active arc `[low, high)` in window ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingInterval {
    low: u64,
    high: u64,
}

impl Default for CodingInterval {
    fn default() -> Self {
        Self::full()
    }
}

impl CodingInterval {
    /// The whole circle
    pub fn full() -> Self {
        Self { low: 0, high: FULL }
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn high(&self) -> u64 {
        self.high
    }

    pub fn range(&self) -> u64 {
        self.high - self.low
    }

    pub fn contains(&self, value: u64) -> bool {
        self.low <= value && value < self.high
    }

    /// Lossy start angle of the arc relative to the current window
    pub fn start_angle(&self) -> f64 {
        std::f64::consts::TAU * self.low as f64 / FULL as f64
    }

    /// Lossy end angle of the arc relative to the current window
    pub fn end_angle(&self) -> f64 {
        std::f64::consts::TAU * self.high as f64 / FULL as f64
    }

    fn narrow(&mut self, cum_low: u32, cum_high: u32) {
        let range = self.range();
        let low = self.low;
        self.low = low + scaled_bound(cum_low, range);
        self.high = low + scaled_bound(cum_high, range);
    }

    fn renormalize<F>(&mut self, mut on_emit: F) -> Result<()>
    where
        F: FnMut(Emission) -> Result<()>,
    {
        loop {
            if self.high <= SPLIT {
                self.low = zeckendorf::shift(self.low);
                self.high = zeckendorf::shift(self.high);
                on_emit(Emission::Zero)?;
            } else if self.low >= SPLIT {
                self.low = zeckendorf::shift(zeckendorf::shift(self.low - SPLIT));
                self.high = zeckendorf::shift(zeckendorf::shift(self.high - SPLIT));
                on_emit(Emission::OneZero)?;
            } else if self.range() < MIN_RANGE {
                if SPLIT - self.low >= self.high - SPLIT {
                    self.high = SPLIT;
                } else {
                    self.low = SPLIT;
                }
            } else {
                return Ok(());
            }
        }
    }
}

/// Encoder and decoder over one arc table
///
/// The table's symbol order is part of the coded format: decoding with a
/// table laid out in another order gives wrong symbols or a corruption
/// error, never a silent success with the original data.
#[derive(Debug, Clone, Copy)]
pub struct RadialArithmeticCoder<'a, S: Symbol> {
    table: &'a ArcTable<S>,
}

impl<'a, S: Symbol> RadialArithmeticCoder<'a, S> {
    pub fn new(table: &'a ArcTable<S>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a ArcTable<S> {
        self.table
    }

    /// Fresh encoder starting on the full circle
    pub fn encoder(&self) -> Result<RadialEncoder<'a, S>> {
        RadialEncoder::new(self.table)
    }

    /// Fresh decoder reading `angle`
    pub fn decoder(&self, angle: &'a PhiAdicNumber) -> Result<RadialDecoder<'a, S>> {
        RadialDecoder::new(self.table, angle)
    }

    /// Code a whole batch into one angle
    pub fn encode(&self, symbols: &[S]) -> Result<PhiAdicNumber> {
        let mut encoder = self.encoder()?;
        for symbol in symbols {
            encoder.push(symbol)?;
        }
        encoder.finish()
    }

    /// Recover `count` symbols from an angle
    pub fn decode(&self, angle: &PhiAdicNumber, count: usize) -> Result<Vec<S>> {
        let mut decoder = RadialDecoder::new(self.table, angle)?;
        // `count` comes from the container; grow past the reserve on demand
        let mut symbols = Vec::with_capacity(count.min(DECODE_RESERVE));
        for _ in 0..count {
            symbols.push(decoder.next_symbol()?.clone());
        }
        decoder.finish()?;
        Ok(symbols)
    }
}

/// Encoder state machine `Idle → Active → Finalized`
#[derive(Debug)]
pub struct RadialEncoder<'a, S: Symbol> {
    table: &'a ArcTable<S>,
    interval: CodingInterval,
    output: PhiAdicNumber,
    emitted: usize,
    state: CoderState,
}

impl<'a, S: Symbol> RadialEncoder<'a, S> {
    pub fn new(table: &'a ArcTable<S>) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::EmptyAlphabetError);
        }
        Ok(Self {
            table,
            interval: CodingInterval::full(),
            output: PhiAdicNumber::new(),
            emitted: 0,
            state: CoderState::Idle,
        })
    }

    pub fn state(&self) -> CoderState {
        self.state
    }

    pub fn interval(&self) -> CodingInterval {
        self.interval
    }

    /// Digits committed so far, not counting the live window
    pub fn emitted_digits(&self) -> usize {
        self.emitted
    }

    /// Narrow the interval to `symbol`'s arc
    pub fn push(&mut self, symbol: &S) -> Result<()> {
        if self.state == CoderState::Finalized {
            return Err(Error::RangeError("encoder is already finalized".into()));
        }
        let index = self.table.index_of(symbol)?;
        let arc = &self.table.arcs()[index];

        self.interval.narrow(arc.cum_low, arc.cum_high);
        let output = &mut self.output;
        let emitted = &mut self.emitted;
        self.interval.renormalize(|emission| match emission {
            Emission::Zero => {
                *emitted += 1;
                output.append_digit(0)
            }
            Emission::OneZero => {
                *emitted += 2;
                output.append_digit(1)?;
                output.append_digit(0)
            }
        })?;

        self.state = CoderState::Active;
        Ok(())
    }

    /// Commit the low boundary of the final interval
    pub fn finish(&mut self) -> Result<PhiAdicNumber> {
        if self.state == CoderState::Finalized {
            return Err(Error::RangeError("encoder is already finalized".into()));
        }
        self.state = CoderState::Finalized;

        let mut angle = std::mem::take(&mut self.output);
        for digit in zeckendorf::unrank(self.interval.low, WINDOW_DIGITS) {
            angle.append_digit(digit)?;
        }
        Ok(angle.finalize())
    }
}

/// Decoder state machine mirroring [`RadialEncoder`]
#[derive(Debug)]
pub struct RadialDecoder<'a, S: Symbol> {
    table: &'a ArcTable<S>,
    interval: CodingInterval,
    digits: &'a [u8],
    cursor: usize,
    value: u64,
    state: CoderState,
}

impl<'a, S: Symbol> RadialDecoder<'a, S> {
    pub fn new(table: &'a ArcTable<S>, angle: &'a PhiAdicNumber) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::EmptyAlphabetError);
        }
        let digits = angle.digits();
        let mut window = vec![0u8; WINDOW_DIGITS];
        let head = digits.len().min(WINDOW_DIGITS);
        window[..head].copy_from_slice(&digits[..head]);

        Ok(Self {
            table,
            interval: CodingInterval::full(),
            digits,
            cursor: WINDOW_DIGITS,
            value: zeckendorf::rank(&window),
            state: CoderState::Idle,
        })
    }

    pub fn state(&self) -> CoderState {
        self.state
    }

    pub fn interval(&self) -> CodingInterval {
        self.interval
    }

    /// Produce the next symbol
    pub fn next_symbol(&mut self) -> Result<&'a S> {
        if self.state == CoderState::Finalized {
            return Err(Error::RangeError("decoder is already finalized".into()));
        }
        if !self.interval.contains(self.value) {
            return Err(Error::CorruptionError(format!(
                "code value {} left the interval [{}, {})",
                self.value, self.interval.low, self.interval.high
            )));
        }

        let table = self.table;
        let offset = self.value - self.interval.low;
        let index = table
            .locate_offset(offset, self.interval.range())
            .ok_or_else(|| Error::CorruptionError("angle lies in no arc".into()))?;
        let arc = &table.arcs()[index];

        self.interval.narrow(arc.cum_low, arc.cum_high);

        let digits = self.digits;
        let cursor = &mut self.cursor;
        let value = &mut self.value;
        let mut next_digit = move || {
            let d = digits.get(*cursor).copied().unwrap_or(0);
            *cursor += 1;
            d as u64
        };
        self.interval.renormalize(|emission| {
            match emission {
                Emission::Zero => {
                    if *value >= SPLIT {
                        return Err(Error::CorruptionError(
                            "expected a 0 digit in the angle".into(),
                        ));
                    }
                    *value = zeckendorf::shift(*value) + next_digit();
                }
                Emission::OneZero => {
                    if *value < SPLIT {
                        return Err(Error::CorruptionError(
                            "expected a 1 digit in the angle".into(),
                        ));
                    }
                    let rest = zeckendorf::shift(*value - SPLIT) + next_digit();
                    *value = zeckendorf::shift(rest) + next_digit();
                }
            }
            Ok(())
        })?;

        self.state = CoderState::Active;
        Ok(&arc.symbol)
    }

    /// Check that the angle was exactly the committed low boundary
    pub fn finish(&mut self) -> Result<()> {
        if self.state == CoderState::Finalized {
            return Err(Error::RangeError("decoder is already finalized".into()));
        }
        self.state = CoderState::Finalized;

        if self.value != self.interval.low {
            return Err(Error::CorruptionError(format!(
                "angle is not the committed point of its final interval ({} != {})",
                self.value, self.interval.low
            )));
        }
        if self.cursor < self.digits.len() {
            return Err(Error::CorruptionError(format!(
                "{} digits left unread",
                self.digits.len() - self.cursor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phirac_core::ProbabilityModel;
    use proptest::prelude::*;

    fn abc_table() -> ArcTable<u8> {
        let model = ProbabilityModel::builder()
            .symbol(b'A', 0.5)
            .symbol(b'B', 0.25)
            .symbol(b'C', 0.25)
            .build()
            .unwrap();
        ArcTable::build(&model).unwrap()
    }

    #[test]
    fn test_window_constants() {
        assert_eq!(FULL, zeckendorf::window_size(WINDOW_DIGITS));
        let mut leading_one = vec![0u8; WINDOW_DIGITS];
        leading_one[0] = 1;
        assert_eq!(SPLIT, zeckendorf::rank(&leading_one));
        assert!(FULL - SPLIT > MIN_RANGE);
    }

    #[test]
    fn test_abac_scenario() {
        let table = abc_table();
        let coder = RadialArithmeticCoder::new(&table);
        let input = b"ABAC".to_vec();

        let angle = coder.encode(&input).unwrap();
        assert_eq!(coder.encode(&input).unwrap(), angle);
        assert!(angle.to_radians() < std::f64::consts::TAU);
        assert_eq!(coder.decode(&angle, 4).unwrap(), input);
    }

    #[test]
    fn test_empty_sequence_is_zero_angle() {
        let table = abc_table();
        let coder = RadialArithmeticCoder::new(&table);
        let angle = coder.encode(&[]).unwrap();
        assert!(angle.is_zero());
        assert!(coder.decode(&angle, 0).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_model() {
        let model = ProbabilityModel::builder().symbol(7u8, 1.0).build().unwrap();
        let table = ArcTable::build(&model).unwrap();
        let coder = RadialArithmeticCoder::new(&table);

        for n in [1usize, 5, 1000] {
            let angle = coder.encode(&vec![7u8; n]).unwrap();
            assert!(angle.is_zero());
            assert_eq!(coder.decode(&angle, n).unwrap(), vec![7u8; n]);
        }
    }

    #[test]
    fn test_decode_reserves_a_bounded_buffer() {
        let model = ProbabilityModel::builder()
            .symbol("φ".to_string(), 1.0)
            .build()
            .unwrap();
        let table = ArcTable::build(&model).unwrap();
        let coder = RadialArithmeticCoder::new(&table);
        let angle = PhiAdicNumber::new();

        let n = DECODE_RESERVE * 3 + 7;
        let symbols = coder.decode(&angle, n).unwrap();
        assert_eq!(symbols.len(), n);
        assert!(symbols.iter().all(|s| s == "φ"));

        let few = coder.decode(&angle, 3).unwrap();
        assert!(few.capacity() <= DECODE_RESERVE);
    }

    #[test]
    fn test_empty_alphabet() {
        let model = ProbabilityModel::<u8>::new(vec![]).unwrap();
        let table = ArcTable::build(&model).unwrap();
        let coder = RadialArithmeticCoder::new(&table);
        assert!(matches!(coder.encode(&[]), Err(Error::EmptyAlphabetError)));
        assert!(matches!(
            coder.decode(&PhiAdicNumber::new(), 0),
            Err(Error::EmptyAlphabetError)
        ));
    }

    #[test]
    fn test_unknown_symbol() {
        let table = abc_table();
        let coder = RadialArithmeticCoder::new(&table);
        assert!(matches!(
            coder.encode(b"ABZ"),
            Err(Error::UnknownSymbolError(_))
        ));
    }

    #[test]
    fn test_state_machine() {
        let table = abc_table();
        let mut encoder = RadialEncoder::new(&table).unwrap();
        assert_eq!(encoder.state(), CoderState::Idle);
        encoder.push(&b'A').unwrap();
        assert_eq!(encoder.state(), CoderState::Active);
        let angle = encoder.finish().unwrap();
        assert_eq!(encoder.state(), CoderState::Finalized);
        assert!(encoder.push(&b'A').is_err());
        assert!(encoder.finish().is_err());

        let mut decoder = RadialDecoder::new(&table, &angle).unwrap();
        assert_eq!(decoder.next_symbol().unwrap(), &b'A');
        decoder.finish().unwrap();
        assert_eq!(decoder.state(), CoderState::Finalized);
    }

    #[test]
    fn test_long_sequence_emits_digits() {
        let table = abc_table();
        let coder = RadialArithmeticCoder::new(&table);
        let input: Vec<u8> = (0..5000).map(|i| b"AABACAAB"[i % 8]).collect();

        let mut encoder = coder.encoder().unwrap();
        for s in &input {
            encoder.push(s).unwrap();
            let interval = encoder.interval();
            assert!(interval.low() < SPLIT && SPLIT < interval.high());
            assert!(interval.range() >= MIN_RANGE);
            assert!(interval.start_angle() < interval.end_angle());
        }
        assert!(encoder.emitted_digits() > 0);
        let angle = encoder.finish().unwrap();
        assert_eq!(coder.decode(&angle, input.len()).unwrap(), input);
    }

    #[test]
    fn test_skewed_model_clamps_and_roundtrips() {
        let model = ProbabilityModel::builder()
            .symbol(0u8, 0.999)
            .symbol(1u8, 0.0009)
            .symbol(2u8, 0.0001)
            .build()
            .unwrap();
        let table = ArcTable::build(&model).unwrap();
        let coder = RadialArithmeticCoder::new(&table);
        let input: Vec<u8> = (0..20_000u32)
            .map(|i| match i % 997 {
                0 => 2,
                k if k % 100 == 1 => 1,
                _ => 0,
            })
            .collect();
        let angle = coder.encode(&input).unwrap();
        assert_eq!(coder.decode(&angle, input.len()).unwrap(), input);
    }

    #[test]
    fn test_wrong_count_is_detected() {
        let table = abc_table();
        let coder = RadialArithmeticCoder::new(&table);
        let angle = coder.encode(b"ABACBBCA").unwrap();
        assert!(matches!(
            coder.decode(&angle, 5),
            Err(Error::CorruptionError(_))
        ));
    }

    #[test]
    fn test_model_order_is_part_of_the_format() {
        let model = ProbabilityModel::builder()
            .symbol(b'A', 0.5)
            .symbol(b'B', 0.25)
            .symbol(b'C', 0.25)
            .build()
            .unwrap();
        let forward = ArcTable::build(&model).unwrap();
        let reordered = ArcTable::build_ordered(&model, &[b'C', b'B', b'A']).unwrap();

        let input = b"ABACABCA".to_vec();
        let angle = RadialArithmeticCoder::new(&forward).encode(&input).unwrap();
        match RadialArithmeticCoder::new(&reordered).decode(&angle, input.len()) {
            Ok(decoded) => assert_ne!(decoded, input),
            Err(e) => assert!(matches!(e, Error::CorruptionError(_) | Error::RangeError(_))),
        }
    }

    proptest! {
        #[test]
        fn roundtrip_any_sequence(
            weights in prop::collection::vec(1u32..100, 1..12),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..400),
        ) {
            let total: u32 = weights.iter().sum();
            let entries = weights
                .iter()
                .enumerate()
                .map(|(i, w)| (i as u8, *w as f64 / total as f64))
                .collect();
            let model = ProbabilityModel::new(entries).unwrap();
            let table = ArcTable::build(&model).unwrap();
            let coder = RadialArithmeticCoder::new(&table);
            let input: Vec<u8> = picks.iter().map(|ix| ix.index(weights.len()) as u8).collect();

            let angle = coder.encode(&input).unwrap();
            prop_assert!(angle.to_radians() < std::f64::consts::TAU);
            prop_assert_eq!(coder.decode(&angle, input.len()).unwrap(), input);
        }
    }
}
